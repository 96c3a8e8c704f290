use clap::{Parser, Subcommand};
use githooks::commands::ignore::IgnoreTarget;
use githooks::commands::{ignore, list, run, trust};
use githooks::error::{bug_report_info, report_fatal};
use githooks::git::GitContext;
use githooks::logging;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "githooks")]
#[command(about = "Run Git hooks from the repository and shared hook repositories", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the hooks for a Git hook (called by the installed hook stubs)
    Run {
        /// Path of the hook Git invoked, e.g. `.git/hooks/pre-commit`
        hook_path: PathBuf,

        /// Arguments Git passed to the hook
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List the hooks that apply to this repository and their state
    List {
        /// Hook names to list (default: all managed hooks)
        hook_names: Vec<String>,
    },

    /// Manage ignore patterns
    Ignore {
        #[command(subcommand)]
        command: IgnoreCommands,
    },

    /// Inspect and edit trusted checksums
    Trust {
        #[command(subcommand)]
        command: TrustCommands,
    },
}

#[derive(Subcommand)]
enum IgnoreCommands {
    /// Add ignore patterns or namespace paths
    ///
    /// Patterns are validated first; if any is malformed nothing is written.
    Add {
        /// Glob pattern on namespace paths (`**` spans directories, `!` re-includes)
        #[arg(long = "pattern")]
        patterns: Vec<String>,

        /// Exact namespace path
        #[arg(long = "path")]
        namespace_paths: Vec<String>,

        /// Write to the repository's `.githooks/.ignore.yaml` instead of the
        /// user ignore file in the Git directory
        #[arg(long)]
        repository: bool,

        /// With --repository: write to `.githooks/<hook-name>/.ignore.yaml`
        #[arg(long, requires = "repository")]
        hook_name: Option<String>,
    },
}

#[derive(Subcommand)]
enum TrustCommands {
    /// Show what the checksum store contains
    Summary,

    /// Check whether a file's current content is trusted
    Check {
        /// File to check
        file: PathBuf,
    },

    /// Remove a checksum from every store location
    Remove {
        /// SHA1 checksum to remove
        hash: String,
    },
}

fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run { hook_path, args } => run::execute(hook_path, args),
        Commands::List { hook_names } => list::execute(hook_names),
        Commands::Ignore { command } => match command {
            IgnoreCommands::Add {
                patterns,
                namespace_paths,
                repository,
                hook_name,
            } => {
                let target = if repository {
                    IgnoreTarget::Repository { hook_name }
                } else {
                    IgnoreTarget::User
                };
                ignore::add(patterns, namespace_paths, target)
            }
        },
        Commands::Trust { command } => match command {
            TrustCommands::Summary => trust::summary(),
            TrustCommands::Check { file } => trust::check(&file),
            TrustCommands::Remove { hash } => trust::remove(&hash),
        },
    }
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let cwd = std::env::current_dir().ok();
            let git = cwd.as_deref().map(GitContext::new);
            report_fatal(&e, &bug_report_info(cwd.as_deref(), git.as_ref()));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_keeps_hyphen_args() {
        let cli = Cli::try_parse_from(["githooks", "run", ".git/hooks/pre-push", "origin", "--force"]).unwrap();
        match cli.command {
            Commands::Run { hook_path, args } => {
                assert_eq!(hook_path, PathBuf::from(".git/hooks/pre-push"));
                assert_eq!(args, vec!["origin", "--force"]);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_hook_name_requires_repository() {
        assert!(Cli::try_parse_from(["githooks", "ignore", "add", "--hook-name", "pre-commit"]).is_err());
        assert!(Cli::try_parse_from([
            "githooks",
            "ignore",
            "add",
            "--repository",
            "--hook-name",
            "pre-commit",
            "--pattern",
            "pre-commit/**"
        ])
        .is_ok());
    }
}
