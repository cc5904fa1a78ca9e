use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::cloud::CloudError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which part of server creation failed.
pub enum ProvisionStage {
    Image,
    Flavor,
    Network,
    Keypair,
    Create,
    Wait,
}

impl fmt::Display for ProvisionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image lookup",
            Self::Flavor => "flavor lookup",
            Self::Network => "network lookup",
            Self::Keypair => "keypair lookup",
            Self::Create => "server create",
            Self::Wait => "wait for ACTIVE",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
#[error("{addr} unreachable after {attempts} attempt(s): {last_error}")]
pub struct ProbeError {
    pub addr: SocketAddr,
    pub attempts: u32,
    pub last_error: String,
}

#[derive(Error, Debug)]
/// Why a run stopped early.
pub enum CheckError {
    #[error("previous VM not cleaned up: lock marker {} exists", .path.display())]
    LockConflict { path: PathBuf },

    #[error("provisioning failed at {stage}: {source}")]
    Provision {
        stage: ProvisionStage,
        #[source]
        source: CloudError,
    },

    #[error(
        "server {server_id} created but lock marker {} could not be written: {source}",
        .path.display()
    )]
    LockAcquire {
        server_id: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("floating IP assignment for server {server_id} failed: {source}")]
    NetworkAssign {
        server_id: String,
        #[source]
        source: CloudError,
    },

    #[error("server {server_id} not reachable over SSH: {source}")]
    Reachability {
        server_id: String,
        #[source]
        source: ProbeError,
    },

    #[error("deletion of server {server_id} failed: {source}")]
    Teardown {
        server_id: String,
        #[source]
        source: CloudError,
    },

    #[error(
        "server deleted but lock marker {} could not be removed: {source}",
        .path.display()
    )]
    LockRelease {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CheckError {
    /// `true` if a server may still exist and the lock marker is held.
    pub fn leaves_server_behind(&self) -> bool {
        matches!(
            self,
            Self::NetworkAssign { .. } | Self::Reachability { .. } | Self::Teardown { .. }
        )
    }
}

pub type CheckResult<T> = Result<T, CheckError>;
