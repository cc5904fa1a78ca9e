//! Run-controller harness: temp lock directory, loopback SSH stand-in,
//! scripted cloud and recording sink.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::net::TcpListener;

use vmcheck::{
    CloudProviderType, Config, MockCloud, MockSink, ProbeConfig, RunController, RunLock,
};

pub const ALL_SUCCESS: &str =
    "vm_created:Success, vm_ip_assigned:Success, vm_ssh_connection:Success, vm_deletion:Success ";

pub struct Harness {
    pub cloud: Arc<MockCloud>,
    pub sink: Arc<MockSink>,
    pub config: Config,
    _dir: TempDir,
    _listener: Option<TcpListener>,
}

impl Harness {
    /// Harness whose floating IP answers on the probed port.
    pub async fn reachable(cloud: MockCloud) -> Self {
        Self::build(cloud, MockSink::new(), true).await
    }

    /// Harness whose probed port refuses connections.
    pub async fn unreachable(cloud: MockCloud) -> Self {
        Self::build(cloud, MockSink::new(), false).await
    }

    pub async fn build(cloud: MockCloud, sink: MockSink, reachable: bool) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let listener = TcpListener::bind((IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .expect("bind loopback");
        let port = listener.local_addr().expect("local addr").port();
        let listener = if reachable {
            Some(listener)
        } else {
            drop(listener);
            None
        };

        let config = Config {
            lock_path: dir.path().join("vm_check"),
            cloud_provider: CloudProviderType::Local,
            probe: ProbeConfig::for_testing(port),
            ..Config::default()
        };

        Self {
            cloud: Arc::new(cloud),
            sink: Arc::new(sink),
            config,
            _dir: dir,
            _listener: listener,
        }
    }

    pub fn controller(&self) -> RunController {
        RunController::new(&self.config, self.cloud.clone(), self.sink.clone())
    }

    pub fn lock(&self) -> RunLock {
        RunLock::new(self.config.lock_path.clone())
    }

    /// Values of every metric sent so far.
    pub fn sent_values(&self) -> Vec<String> {
        self.sink
            .sent()
            .into_iter()
            .flatten()
            .map(|metric| metric.value)
            .collect()
    }
}
