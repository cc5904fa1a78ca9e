//! The capability surface the health check needs from a cloud.

use std::time::Duration;

use async_trait::async_trait;

use super::error::CloudResult;
use super::types::{
    FlavorRef, FloatingIp, ImageRef, KeypairRef, NetworkRef, Server, ServerRequest,
};

#[async_trait]
/// Cloud operations required to create, expose and delete one server.
pub trait CloudOps: Send + Sync {
    /// Resolves an image by name.
    async fn find_image(&self, name: &str) -> CloudResult<ImageRef>;
    /// Resolves a flavor by name or id.
    async fn find_flavor(&self, name: &str) -> CloudResult<FlavorRef>;
    /// Resolves a network by name.
    async fn find_network(&self, name: &str) -> CloudResult<NetworkRef>;
    /// Resolves a keypair by name.
    async fn find_keypair(&self, name: &str) -> CloudResult<KeypairRef>;
    /// Requests a new server; it is usually still building when this returns.
    async fn create_server(&self, request: &ServerRequest) -> CloudResult<Server>;
    /// Blocks until `server` is `ACTIVE`, fails on `ERROR` or after `timeout`.
    async fn wait_for_server(&self, server: &Server, timeout: Duration) -> CloudResult<Server>;
    /// Returns an unattached floating IP from `pool`, allocating one if needed.
    async fn allocate_floating_ip(&self, pool: &str) -> CloudResult<FloatingIp>;
    /// Attaches `ip` to `server`.
    async fn associate_floating_ip(&self, server: &Server, ip: &FloatingIp) -> CloudResult<()>;
    /// Deletes `server` and waits until it is gone or `timeout` elapses.
    async fn delete_server(&self, server: &Server, timeout: Duration) -> CloudResult<()>;
}
