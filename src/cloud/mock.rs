//! Scripted [`CloudOps`] double with failure injection and a call log.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{CloudError, CloudResult};
use super::ops::CloudOps;
use super::types::{
    FlavorRef, FloatingIp, ImageRef, KeypairRef, NetworkRef, Server, ServerRequest, ServerStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// One [`CloudOps`] method.
pub enum CloudCall {
    FindImage,
    FindFlavor,
    FindNetwork,
    FindKeypair,
    CreateServer,
    WaitForServer,
    AllocateFloatingIp,
    AssociateFloatingIp,
    DeleteServer,
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Always,
    /// 1-based call index.
    OnCall(usize),
}

/// Mock cloud: every operation succeeds unless told otherwise.
pub struct MockCloud {
    calls: Mutex<Vec<CloudCall>>,
    failures: Mutex<HashMap<CloudCall, Failure>>,
    live_servers: Mutex<Vec<String>>,
    floating_address: IpAddr,
}

impl Default for MockCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCloud {
    pub fn new() -> Self {
        Self::with_floating_address(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    pub fn with_floating_address(floating_address: IpAddr) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            live_servers: Mutex::new(Vec::new()),
            floating_address,
        }
    }

    /// Makes every call of `call` fail.
    pub fn fail(self, call: CloudCall) -> Self {
        self.failures.lock().insert(call, Failure::Always);
        self
    }

    /// Makes only the `nth` (1-based) call of `call` fail.
    pub fn fail_on_call(self, call: CloudCall, nth: usize) -> Self {
        self.failures.lock().insert(call, Failure::OnCall(nth));
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<CloudCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, call: CloudCall) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    /// Servers created and not yet deleted.
    pub fn live_servers(&self) -> usize {
        self.live_servers.lock().len()
    }

    fn record(&self, call: CloudCall) -> CloudResult<()> {
        let nth = {
            let mut calls = self.calls.lock();
            calls.push(call);
            calls.iter().filter(|c| **c == call).count()
        };

        let failing = match self.failures.lock().get(&call) {
            Some(Failure::Always) => true,
            Some(Failure::OnCall(n)) => *n == nth,
            None => false,
        };

        if failing {
            return Err(CloudError::Operation(format!("injected failure in {call:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl CloudOps for MockCloud {
    async fn find_image(&self, name: &str) -> CloudResult<ImageRef> {
        self.record(CloudCall::FindImage)?;
        Ok(ImageRef {
            id: "image-1".to_string(),
            name: name.to_string(),
        })
    }

    async fn find_flavor(&self, name: &str) -> CloudResult<FlavorRef> {
        self.record(CloudCall::FindFlavor)?;
        Ok(FlavorRef {
            id: "flavor-1".to_string(),
            name: name.to_string(),
        })
    }

    async fn find_network(&self, name: &str) -> CloudResult<NetworkRef> {
        self.record(CloudCall::FindNetwork)?;
        Ok(NetworkRef {
            id: "network-1".to_string(),
            name: name.to_string(),
        })
    }

    async fn find_keypair(&self, name: &str) -> CloudResult<KeypairRef> {
        self.record(CloudCall::FindKeypair)?;
        Ok(KeypairRef {
            name: name.to_string(),
        })
    }

    async fn create_server(&self, request: &ServerRequest) -> CloudResult<Server> {
        self.record(CloudCall::CreateServer)?;
        let id = format!("server-{}", self.call_count(CloudCall::CreateServer));
        self.live_servers.lock().push(id.clone());
        Ok(Server {
            id,
            name: request.name.clone(),
            status: ServerStatus::Build,
            floating_ip: None,
        })
    }

    async fn wait_for_server(&self, server: &Server, _timeout: Duration) -> CloudResult<Server> {
        self.record(CloudCall::WaitForServer)?;
        Ok(Server {
            status: ServerStatus::Active,
            ..server.clone()
        })
    }

    async fn allocate_floating_ip(&self, _pool: &str) -> CloudResult<FloatingIp> {
        self.record(CloudCall::AllocateFloatingIp)?;
        Ok(FloatingIp {
            id: "fip-1".to_string(),
            address: self.floating_address,
        })
    }

    async fn associate_floating_ip(&self, _server: &Server, _ip: &FloatingIp) -> CloudResult<()> {
        self.record(CloudCall::AssociateFloatingIp)
    }

    async fn delete_server(&self, server: &Server, _timeout: Duration) -> CloudResult<()> {
        self.record(CloudCall::DeleteServer)?;
        self.live_servers.lock().retain(|id| id != &server.id);
        Ok(())
    }
}
