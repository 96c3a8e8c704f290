//! Launching hook processes

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::OwnedFd;
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

use super::{ExecContext, ExecError, HookResult};
use crate::hooks::Hook;

/// Executes a single hook.
pub trait HookRunner: Sync {
    /// Run `hook` with `args`, capturing its combined output.
    fn run<'h>(&self, hook: &'h Hook, args: &[String], ctx: &ExecContext) -> HookResult<'h>;

    /// Run `hook` with the terminal attached (no capture).
    fn run_attached(&self, hook: &Hook, args: &[String], ctx: &ExecContext) -> Result<(), ExecError>;
}

/// Runs hooks as child processes.
#[derive(Debug, Default)]
pub struct ProcessRunner;

fn build_command(program: &str, args: &[String], ctx: &ExecContext) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if !ctx.working_dir.as_os_str().is_empty() {
        cmd.current_dir(&ctx.working_dir);
    }
    cmd.envs(ctx.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    cmd
}

fn check_status(status: ExitStatus) -> Result<(), ExecError> {
    if status.success() {
        Ok(())
    } else {
        Err(ExecError::Status { status })
    }
}

/// A pipe whose ends are not inherited by processes spawned concurrently on
/// other threads.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    nix::unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC)
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    use nix::fcntl::{fcntl, FcntlArg, FdFlag};

    let (reader, writer) = nix::unistd::pipe()?;
    for fd in [&reader, &writer] {
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    }
    Ok((reader, writer))
}

/// Run with stdout and stderr both writing into one pipe, so the output keeps
/// the order the hook produced it in.
fn run_combined(program: &str, args: &[String], ctx: &ExecContext) -> Result<(Vec<u8>, ExitStatus), ExecError> {
    let launch_err = |source: io::Error| ExecError::Launch {
        command: program.to_string(),
        source,
    };
    let output_err = |source: io::Error| ExecError::Output {
        command: program.to_string(),
        source,
    };

    let (reader, writer) = cloexec_pipe().map_err(|e| launch_err(e.into()))?;
    let writer_err = writer.try_clone().map_err(launch_err)?;

    let mut cmd = build_command(program, args, ctx);
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::from(writer))
        .stderr(Stdio::from(writer_err));

    let mut child = cmd.spawn().map_err(launch_err)?;
    // The parent's copies of the write end must be closed, otherwise reading
    // never sees end of file.
    drop(cmd);

    let mut output = Vec::new();
    let read = File::from(reader).read_to_end(&mut output);
    let status = child.wait().map_err(output_err)?;
    read.map_err(output_err)?;

    Ok((output, status))
}

impl HookRunner for ProcessRunner {
    fn run<'h>(&self, hook: &'h Hook, args: &[String], ctx: &ExecContext) -> HookResult<'h> {
        let (program, program_args) = hook.command(args);
        debug!("Executing hook: '{}'", hook.path.display());

        match run_combined(&program, &program_args, ctx) {
            Ok((output, status)) => HookResult {
                hook,
                output,
                error: check_status(status).err(),
            },
            Err(error) => HookResult {
                hook,
                output: Vec::new(),
                error: Some(error),
            },
        }
    }

    fn run_attached(&self, hook: &Hook, args: &[String], ctx: &ExecContext) -> Result<(), ExecError> {
        let (program, program_args) = hook.command(args);
        debug!("Executing hook: '{}'", hook.path.display());

        let status = build_command(&program, &program_args, ctx)
            .status()
            .map_err(|source| ExecError::Launch {
                command: program.clone(),
                source,
            })?;
        check_status(status)
    }
}
