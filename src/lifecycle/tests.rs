use super::*;

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpListener;

use crate::cloud::{CloudCall, CloudError, MockCloud, Server, ServerStatus};
use crate::config::Config;
use crate::monitoring::MockSink;

const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const ALL_SUCCESS: &str =
    "vm_created:Success, vm_ip_assigned:Success, vm_ssh_connection:Success, vm_deletion:Success ";

fn lock_in(dir: &TempDir) -> RunLock {
    RunLock::new(dir.path().join("vm_check"))
}

async fn open_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind((LOOPBACK, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

async fn closed_port() -> u16 {
    let (listener, port) = open_port().await;
    drop(listener);
    port
}

fn server(id: &str) -> Server {
    Server {
        id: id.to_string(),
        name: "test.vm".to_string(),
        status: ServerStatus::Active,
        floating_ip: Some(LOOPBACK),
    }
}

fn config(lock_path: PathBuf, probe_port: u16) -> Config {
    Config {
        lock_path,
        probe: ProbeConfig::for_testing(probe_port),
        ..Config::default()
    }
}

#[test]
fn test_lock_acquire_and_release() {
    let dir = TempDir::new().unwrap();
    let lock = lock_in(&dir);
    assert!(!lock.is_locked());

    lock.acquire("srv-1").unwrap();
    assert!(lock.is_locked());
    let note = std::fs::read_to_string(lock.path()).unwrap();
    assert!(note.contains("server=srv-1"));

    // idempotent
    lock.acquire("srv-2").unwrap();
    assert!(lock.is_locked());

    assert!(lock.release().unwrap());
    assert!(!lock.is_locked());
}

#[test]
fn test_lock_release_without_marker_fails() {
    let dir = TempDir::new().unwrap();
    let err = lock_in(&dir).release().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn test_lock_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let lock = RunLock::new(dir.path().join("state").join("vm_check"));
    lock.acquire("srv-1").unwrap();
    assert!(lock.is_locked());
}

#[test]
fn test_lock_under_regular_file_is_not_held() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("state");
    std::fs::write(&blocker, "not a directory").unwrap();
    let lock = RunLock::new(blocker.join("vm_check"));

    assert!(!lock.is_locked());
    assert!(lock.acquire("srv-1").is_err());
    assert!(!lock.is_locked());
}

#[test]
fn test_trail_renders_in_record_order() {
    let mut trail = StatusTrail::new();
    assert_eq!(trail.render(), "");

    trail.success(Step::Created);
    trail.success(Step::IpAssigned);
    trail.success(Step::SshConnection);
    trail.success(Step::Deletion);

    assert_eq!(trail.render(), ALL_SUCCESS);
    assert_eq!(trail.len(), 4);
    assert!(trail.all_succeeded());
}

#[test]
fn test_trail_failed_creation() {
    let mut trail = StatusTrail::new();
    trail.failure(Step::Created);

    assert_eq!(trail.render(), "vm_created:Failed, ");
    assert_eq!(trail.outcome(Step::Created), Some(Outcome::Failed));
    assert_eq!(trail.outcome(Step::Deletion), None);
    assert!(!trail.all_succeeded());
}

#[test]
fn test_provision_stage_in_error_message() {
    let err = CheckError::Provision {
        stage: ProvisionStage::Keypair,
        source: CloudError::NotFound {
            kind: "keypair",
            name: "pk".to_string(),
        },
    };
    let message = err.to_string();
    assert!(message.contains("keypair lookup"));
    assert!(message.contains("pk"));
    assert!(!err.leaves_server_behind());
}

#[tokio::test]
async fn test_probe_connects_to_listening_port() {
    let (_listener, port) = open_port().await;
    let probe = ReachabilityProbe::new(ProbeConfig::for_testing(port));

    let report = probe.check(LOOPBACK).await.unwrap();
    assert_eq!(report.attempts, 1);
}

#[tokio::test]
async fn test_probe_gives_up_after_max_attempts() {
    let port = closed_port().await;
    let probe = ReachabilityProbe::new(ProbeConfig::for_testing(port));

    let err = probe.check(LOOPBACK).await.unwrap_err();
    assert_eq!(err.attempts, 2);
    assert_eq!(err.addr.port(), port);
    assert!(!err.last_error.is_empty());
}

#[test]
fn test_probe_duration_bound() {
    let config = ProbeConfig {
        max_attempts: 3,
        retry_interval: Duration::from_secs(10),
        connect_timeout: Duration::from_secs(5),
        ..ProbeConfig::default()
    };
    assert_eq!(config.max_probe_duration(), Duration::from_secs(35));
}

#[tokio::test]
async fn test_provision_image_failure_leaves_no_lock() {
    let dir = TempDir::new().unwrap();
    let lock = lock_in(&dir);
    let cloud = MockCloud::new().fail(CloudCall::FindImage);
    let probe = ReachabilityProbe::new(ProbeConfig::for_testing(closed_port().await));
    let mut trail = StatusTrail::new();

    let err = provision(&cloud, &RunConfig::default(), &probe, &lock, &mut trail)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckError::Provision {
            stage: ProvisionStage::Image,
            ..
        }
    ));
    assert_eq!(trail.render(), "vm_created:Failed, ");
    assert!(!lock.is_locked());
    assert_eq!(cloud.call_count(CloudCall::CreateServer), 0);
}

#[tokio::test]
async fn test_provision_wait_failure_discards_server() {
    let dir = TempDir::new().unwrap();
    let lock = lock_in(&dir);
    let cloud = MockCloud::new().fail_on_call(CloudCall::WaitForServer, 1);
    let probe = ReachabilityProbe::new(ProbeConfig::for_testing(closed_port().await));
    let mut trail = StatusTrail::new();

    let err = provision(&cloud, &RunConfig::default(), &probe, &lock, &mut trail)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckError::Provision {
            stage: ProvisionStage::Wait,
            ..
        }
    ));
    assert_eq!(trail.render(), "vm_created:Failed, ");
    assert!(!lock.is_locked());
    assert_eq!(cloud.live_servers(), 0);
}

#[tokio::test]
async fn test_provision_lock_failure_discards_server() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("state");
    std::fs::write(&blocker, "not a directory").unwrap();
    let lock = RunLock::new(blocker.join("vm_check"));
    let cloud = MockCloud::new();
    let probe = ReachabilityProbe::new(ProbeConfig::for_testing(closed_port().await));
    let mut trail = StatusTrail::new();

    let err = provision(&cloud, &RunConfig::default(), &probe, &lock, &mut trail)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckError::LockAcquire { .. }));
    assert_eq!(trail.render(), "vm_created:Failed, ");
    assert_eq!(cloud.live_servers(), 0);
    assert!(!lock.is_locked());
    assert_eq!(cloud.call_count(CloudCall::DeleteServer), 1);
    assert_eq!(cloud.call_count(CloudCall::AllocateFloatingIp), 0);
}

#[tokio::test]
async fn test_provision_ip_failure_keeps_lock() {
    let dir = TempDir::new().unwrap();
    let lock = lock_in(&dir);
    let cloud = MockCloud::new().fail(CloudCall::AllocateFloatingIp);
    let probe = ReachabilityProbe::new(ProbeConfig::for_testing(closed_port().await));
    let mut trail = StatusTrail::new();

    let err = provision(&cloud, &RunConfig::default(), &probe, &lock, &mut trail)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckError::NetworkAssign { .. }));
    assert!(err.leaves_server_behind());
    assert_eq!(trail.render(), "vm_created:Success, vm_ip_assigned:Failed, ");
    assert!(lock.is_locked());
    assert_eq!(cloud.call_count(CloudCall::DeleteServer), 0);
}

#[tokio::test]
async fn test_provision_unreachable_server() {
    let dir = TempDir::new().unwrap();
    let lock = lock_in(&dir);
    let cloud = MockCloud::new();
    let probe = ReachabilityProbe::new(ProbeConfig::for_testing(closed_port().await));
    let mut trail = StatusTrail::new();

    let err = provision(&cloud, &RunConfig::default(), &probe, &lock, &mut trail)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckError::Reachability { .. }));
    assert_eq!(
        trail.render(),
        "vm_created:Success, vm_ip_assigned:Success, vm_ssh_connection:Failed, "
    );
    assert!(lock.is_locked());
}

#[tokio::test]
async fn test_provision_success_returns_addressed_server() {
    let dir = TempDir::new().unwrap();
    let lock = lock_in(&dir);
    let cloud = MockCloud::new();
    let (_listener, port) = open_port().await;
    let probe = ReachabilityProbe::new(ProbeConfig::for_testing(port));
    let mut trail = StatusTrail::new();

    let server = provision(&cloud, &RunConfig::default(), &probe, &lock, &mut trail)
        .await
        .unwrap();

    assert_eq!(server.floating_ip, Some(LOOPBACK));
    assert!(server.is_active());
    assert!(lock.is_locked());
    assert_eq!(trail.len(), 3);
    assert!(trail.all_succeeded());
}

#[tokio::test]
async fn test_teardown_releases_lock() {
    let dir = TempDir::new().unwrap();
    let lock = lock_in(&dir);
    lock.acquire("srv-1").unwrap();
    let mut trail = StatusTrail::new();

    let released = teardown(
        &MockCloud::new(),
        &server("srv-1"),
        &RunConfig::default(),
        &lock,
        &mut trail,
    )
    .await
    .unwrap();

    assert!(released);
    assert!(!lock.is_locked());
    assert_eq!(trail.render(), "vm_deletion:Success ");
}

#[tokio::test]
async fn test_teardown_failure_keeps_lock() {
    let dir = TempDir::new().unwrap();
    let lock = lock_in(&dir);
    lock.acquire("srv-1").unwrap();
    let mut trail = StatusTrail::new();

    let err = teardown(
        &MockCloud::new().fail(CloudCall::DeleteServer),
        &server("srv-1"),
        &RunConfig::default(),
        &lock,
        &mut trail,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CheckError::Teardown { .. }));
    assert!(lock.is_locked());
    assert_eq!(trail.render(), "vm_deletion:Failed ");
}

#[tokio::test]
async fn test_teardown_missing_marker_reports_release_error() {
    let dir = TempDir::new().unwrap();
    let lock = lock_in(&dir);
    let mut trail = StatusTrail::new();

    let err = teardown(
        &MockCloud::new(),
        &server("srv-1"),
        &RunConfig::default(),
        &lock,
        &mut trail,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CheckError::LockRelease { .. }));
    assert_eq!(trail.outcome(Step::Deletion), Some(Outcome::Success));
}

#[tokio::test]
async fn test_controller_full_run() {
    let dir = TempDir::new().unwrap();
    let (_listener, port) = open_port().await;
    let cloud = Arc::new(MockCloud::new());
    let sink = Arc::new(MockSink::new());
    let controller = RunController::new(
        &config(dir.path().join("vm_check"), port),
        cloud.clone(),
        sink.clone(),
    );

    let outcome = controller.run().await;
    assert_eq!(outcome.exit_code(), 0);

    let report = outcome.report().unwrap();
    assert!(report.succeeded());
    assert_eq!(report.status, ALL_SUCCESS);
    assert!(report.lock_released);
    assert!(report.metric_sent);
    assert!(!controller.lock().is_locked());
    assert_eq!(cloud.live_servers(), 0);

    let sent = sink.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].len(), 1);
    assert_eq!(sent[0][0].key, "openstack.test");
    assert_eq!(sent[0][0].value, ALL_SUCCESS);
}

#[tokio::test]
async fn test_controller_unreachable_vm_keeps_lock_for_next_run() {
    let dir = TempDir::new().unwrap();
    let cloud = Arc::new(MockCloud::new());
    let sink = Arc::new(MockSink::new());
    let controller = RunController::new(
        &config(dir.path().join("vm_check"), closed_port().await),
        cloud.clone(),
        sink.clone(),
    );

    let outcome = controller.run().await;
    let report = outcome.report().unwrap();
    assert!(!report.succeeded());
    assert!(report.failure.as_ref().unwrap().leaves_server_behind());
    assert!(!report.lock_released);
    assert!(controller.lock().is_locked());
    assert_eq!(cloud.live_servers(), 1);
    assert_eq!(sink.send_count(), 1);

    let second = controller.run().await;
    assert!(matches!(second, RunOutcome::Aborted { .. }));
    assert_eq!(sink.send_count(), 1);
}

#[tokio::test]
async fn test_controller_aborts_on_held_lock() {
    let dir = TempDir::new().unwrap();
    let lock_path = dir.path().join("vm_check");
    RunLock::new(lock_path.clone()).acquire("stale").unwrap();

    let cloud = Arc::new(MockCloud::new());
    let sink = Arc::new(MockSink::new());
    let controller = RunController::new(
        &config(lock_path.clone(), closed_port().await),
        cloud.clone(),
        sink.clone(),
    );

    let outcome = controller.run().await;
    assert!(matches!(&outcome, RunOutcome::Aborted { lock_path: p } if *p == lock_path));
    assert_eq!(outcome.exit_code(), 2);
    assert!(outcome.report().is_none());
    assert!(cloud.calls().is_empty());
    assert_eq!(sink.send_count(), 0);
    assert!(controller.lock().is_locked());
}

#[tokio::test]
async fn test_controller_reports_even_when_sink_fails() {
    let dir = TempDir::new().unwrap();
    let cloud = Arc::new(MockCloud::new().fail(CloudCall::FindImage));
    let sink = Arc::new(MockSink::failing());
    let controller = RunController::new(
        &config(dir.path().join("vm_check"), closed_port().await),
        cloud,
        sink.clone(),
    );

    let outcome = controller.run().await;
    assert_eq!(outcome.exit_code(), 0);

    let report = outcome.report().unwrap();
    assert_eq!(report.status, "vm_created:Failed, ");
    assert!(!report.metric_sent);
    assert!(report.server.is_none());
    assert_eq!(sink.send_count(), 1);
}
