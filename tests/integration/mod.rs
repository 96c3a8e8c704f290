//! Integration tests for the hook run pipeline
//!
//! These tests drive complete runs against temporary Git repositories with
//! real hook scripts.

pub mod helpers;
pub mod pipeline;
