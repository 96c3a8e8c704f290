pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod fs;
pub mod git;
pub mod hooks;
pub mod ignores;
pub mod logging;
pub mod prompt;
pub mod shared;
pub mod trust;

/// Name of the directory holding repository hooks.
pub const HOOKS_DIR_NAME: &str = ".githooks";

/// Default place to report bugs if a repository does not define its own.
pub const DEFAULT_BUG_REPORT_URL: &str = "https://github.com/rycus86/githooks/issues";
