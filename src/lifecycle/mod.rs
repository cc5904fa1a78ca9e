//! One health-check run: lock guard, provisioning, teardown and reporting.
//!
//! [`RunController`] owns the sequence. Each step appends its outcome to a
//! [`StatusTrail`] that the controller renders into the reported value.

pub mod config;
pub mod controller;
pub mod error;
/// File-presence lock.
pub mod lock;
pub mod probe;
pub mod provision;
pub mod teardown;
/// Step outcomes.
pub mod trail;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{ProbeConfig, RunConfig};
pub use controller::RunController;
pub use error::{CheckError, CheckResult, ProbeError, ProvisionStage};
pub use lock::RunLock;
pub use probe::{ProbeReport, ReachabilityProbe};
pub use provision::provision;
pub use teardown::teardown;
pub use trail::{Outcome, StatusTrail, Step};
pub use types::{RunOutcome, RunReport};
