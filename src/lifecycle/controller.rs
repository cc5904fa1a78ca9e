use std::sync::Arc;

use tracing::{error, info, warn};

use crate::cloud::CloudOps;
use crate::config::Config;
use crate::monitoring::{MetricSink, MetricTarget};

use super::config::RunConfig;
use super::error::CheckError;
use super::lock::RunLock;
use super::probe::ReachabilityProbe;
use super::provision::provision;
use super::teardown::teardown;
use super::trail::StatusTrail;
use super::types::{RunOutcome, RunReport};

/// Drives one check: lock check, provision, teardown, report.
pub struct RunController {
    cloud: Arc<dyn CloudOps>,
    sink: Arc<dyn MetricSink>,
    lock: RunLock,
    run: RunConfig,
    probe: ReachabilityProbe,
    target: MetricTarget,
}

impl RunController {
    /// Creates a controller from loaded configuration and its collaborators.
    pub fn new(config: &Config, cloud: Arc<dyn CloudOps>, sink: Arc<dyn MetricSink>) -> Self {
        Self {
            cloud,
            sink,
            lock: RunLock::new(config.lock_path.clone()),
            run: config.run.clone(),
            probe: ReachabilityProbe::new(config.probe.clone()),
            target: config.zabbix.target(),
        }
    }

    pub fn lock(&self) -> &RunLock {
        &self.lock
    }

    /// Runs the check once.
    ///
    /// A held lock aborts before any cloud call and sends nothing. Every run
    /// past the lock check sends exactly one metric, whatever failed.
    pub async fn run(&self) -> RunOutcome {
        if self.lock.is_locked() {
            let err = CheckError::LockConflict {
                path: self.lock.path().to_path_buf(),
            };
            error!(error = %err, "DANGER: previous VM was not deleted, aborting");
            return RunOutcome::Aborted {
                lock_path: self.lock.path().to_path_buf(),
            };
        }

        let mut trail = StatusTrail::new();
        let mut failure = None;
        let mut lock_released = false;

        let server = match provision(
            self.cloud.as_ref(),
            &self.run,
            &self.probe,
            &self.lock,
            &mut trail,
        )
        .await
        {
            Ok(server) => Some(server),
            Err(err) => {
                failure = Some(err);
                None
            }
        };

        if let Some(server) = &server {
            match teardown(
                self.cloud.as_ref(),
                server,
                &self.run,
                &self.lock,
                &mut trail,
            )
            .await
            {
                Ok(released) => lock_released = released,
                Err(err) => failure = Some(err),
            }
        }

        if let Some(err) = failure.as_ref().filter(|e| e.leaves_server_behind()) {
            warn!(
                error = %err,
                lock_path = %self.lock.path().display(),
                "VM may still exist; lock kept until it is removed by hand"
            );
        }

        let status = trail.render();
        let metric_sent = self.report(&status).await;

        let report = RunReport {
            trail,
            status,
            failure,
            server,
            lock_released,
            metric_sent,
        };
        info!(
            status = %report.status,
            succeeded = report.succeeded(),
            metric_sent,
            "Run finished"
        );
        RunOutcome::Completed(report)
    }

    async fn report(&self, status: &str) -> bool {
        let metric = self.target.metric(status);
        match self.sink.send(std::slice::from_ref(&metric)).await {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, key = %metric.key, "Status metric not delivered");
                false
            }
        }
    }
}
