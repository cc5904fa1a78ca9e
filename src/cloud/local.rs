//! In-process cloud simulator used for dry runs (`VMCHECK_CLOUD_PROVIDER=local`).
//!
//! Every name resolves, servers are `ACTIVE` as soon as they are created and
//! floating IPs point at the loopback interface.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;
use uuid::Uuid;

use super::error::{CloudError, CloudResult};
use super::ops::CloudOps;
use super::types::{
    FlavorRef, FloatingIp, ImageRef, KeypairRef, NetworkRef, Server, ServerRequest, ServerStatus,
};

/// Local simulator implementation of [`CloudOps`].
pub struct LocalCloud {
    servers: Mutex<HashMap<String, Server>>,
    floating_address: IpAddr,
}

impl LocalCloud {
    /// Creates a simulator whose floating IPs are `127.0.0.1`.
    pub fn new() -> Self {
        Self::with_floating_address(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    pub fn with_floating_address(floating_address: IpAddr) -> Self {
        Self {
            servers: Mutex::new(HashMap::new()),
            floating_address,
        }
    }

    /// Number of servers that exist right now.
    pub fn server_count(&self) -> usize {
        self.servers.lock().len()
    }

    fn id() -> String {
        Uuid::new_v4().to_string()
    }
}

impl Default for LocalCloud {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudOps for LocalCloud {
    async fn find_image(&self, name: &str) -> CloudResult<ImageRef> {
        Ok(ImageRef {
            id: Self::id(),
            name: name.to_string(),
        })
    }

    async fn find_flavor(&self, name: &str) -> CloudResult<FlavorRef> {
        Ok(FlavorRef {
            id: Self::id(),
            name: name.to_string(),
        })
    }

    async fn find_network(&self, name: &str) -> CloudResult<NetworkRef> {
        Ok(NetworkRef {
            id: Self::id(),
            name: name.to_string(),
        })
    }

    async fn find_keypair(&self, name: &str) -> CloudResult<KeypairRef> {
        Ok(KeypairRef {
            name: name.to_string(),
        })
    }

    async fn create_server(&self, request: &ServerRequest) -> CloudResult<Server> {
        let server = Server {
            id: Self::id(),
            name: request.name.clone(),
            status: ServerStatus::Active,
            floating_ip: None,
        };
        self.servers.lock().insert(server.id.clone(), server.clone());
        info!(server_id = %server.id, "LocalCloud: server created (simulated)");
        Ok(server)
    }

    async fn wait_for_server(&self, server: &Server, _timeout: Duration) -> CloudResult<Server> {
        self.servers
            .lock()
            .get(&server.id)
            .cloned()
            .ok_or_else(|| CloudError::NotFound {
                kind: "server",
                name: server.id.clone(),
            })
    }

    async fn allocate_floating_ip(&self, _pool: &str) -> CloudResult<FloatingIp> {
        Ok(FloatingIp {
            id: Self::id(),
            address: self.floating_address,
        })
    }

    async fn associate_floating_ip(&self, server: &Server, ip: &FloatingIp) -> CloudResult<()> {
        let mut servers = self.servers.lock();
        let stored = servers
            .get_mut(&server.id)
            .ok_or_else(|| CloudError::NoPort {
                id: server.id.clone(),
            })?;
        stored.floating_ip = Some(ip.address);
        Ok(())
    }

    async fn delete_server(&self, server: &Server, _timeout: Duration) -> CloudResult<()> {
        match self.servers.lock().remove(&server.id) {
            Some(_) => {
                info!(server_id = %server.id, "LocalCloud: server deleted (simulated)");
                Ok(())
            }
            None => Err(CloudError::NotFound {
                kind: "server",
                name: server.id.clone(),
            }),
        }
    }
}
