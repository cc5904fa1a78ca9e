use std::path::PathBuf;

use crate::cloud::Server;
use crate::constants::{EXIT_LOCK_CONFLICT, EXIT_OK};

use super::error::CheckError;
use super::trail::StatusTrail;

#[derive(Debug)]
/// What happened during a run.
pub enum RunOutcome {
    /// The lock marker was present; nothing ran and nothing was reported.
    Aborted { lock_path: PathBuf },
    /// The run passed the lock check and reached the report step.
    Completed(RunReport),
}

impl RunOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Aborted { .. } => EXIT_LOCK_CONFLICT,
            Self::Completed(_) => EXIT_OK,
        }
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Self::Aborted { .. } => None,
            Self::Completed(report) => Some(report),
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub trail: StatusTrail,
    /// The value that was sent (`trail.render()`).
    pub status: String,
    /// First failure that ended the run early, if any.
    pub failure: Option<CheckError>,
    /// Server returned by provisioning; `None` means teardown was skipped.
    pub server: Option<Server>,
    pub lock_released: bool,
    pub metric_sent: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && self.trail.all_succeeded()
    }
}
