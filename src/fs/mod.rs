//! File helpers shared by the stores in the Git directory

pub mod locking;

pub use locking::{locked_append, locked_read, locked_retain_lines};
