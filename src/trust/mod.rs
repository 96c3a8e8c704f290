//! Hook trust: the checksum store, per-hook decisions and repository trust

pub mod decision;
pub mod repo;
pub mod store;

pub use decision::{TrustDecision, TrustDecisionFlow, TrustRunCache};
pub use repo::resolve_repo_trust;
pub use store::{ChecksumEntry, ChecksumSummary, ChecksumTrustStore, TrustError};
