use tracing::{error, info};

use crate::cloud::{CloudOps, Server};

use super::config::RunConfig;
use super::error::{CheckError, CheckResult};
use super::lock::RunLock;
use super::trail::{Step, StatusTrail};

/// Deletes `server` and releases the lock.
///
/// On a failed deletion the lock stays held so later runs refuse to start.
/// A failed release after a successful deletion keeps `deletion:Success` in
/// the trail and returns [`CheckError::LockRelease`].
pub async fn teardown(
    cloud: &dyn CloudOps,
    server: &Server,
    config: &RunConfig,
    lock: &RunLock,
    trail: &mut StatusTrail,
) -> CheckResult<bool> {
    if let Err(source) = cloud.delete_server(server, config.delete_timeout).await {
        trail.failure(Step::Deletion);
        let err = CheckError::Teardown {
            server_id: server.id.clone(),
            source,
        };
        error!(
            error = %err,
            lock = %lock.path().display(),
            "VM deletion failed, lock left in place"
        );
        return Err(err);
    }

    trail.success(Step::Deletion);
    info!(server_id = %server.id, "VM deleted");

    lock.release().map_err(|source| {
        let err = CheckError::LockRelease {
            path: lock.path().to_path_buf(),
            source,
        };
        error!(error = %err, "Lock release failed");
        err
    })
}
