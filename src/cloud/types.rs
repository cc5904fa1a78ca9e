use std::fmt;
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlavorRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypairRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Resolved identifiers for a server create call.
pub struct ServerRequest {
    pub name: String,
    pub image_id: String,
    pub flavor_id: String,
    pub network_id: String,
    pub key_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Server state as reported by the compute API.
pub enum ServerStatus {
    Build,
    Active,
    Error,
    Deleted,
    Other(String),
}

impl ServerStatus {
    /// Maps a compute API status string (case-insensitive).
    pub fn from_api(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "BUILD" => Self::Build,
            "ACTIVE" => Self::Active,
            "ERROR" => Self::Error,
            "DELETED" | "SOFT_DELETED" => Self::Deleted,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => f.write_str("BUILD"),
            Self::Active => f.write_str("ACTIVE"),
            Self::Error => f.write_str("ERROR"),
            Self::Deleted => f.write_str("DELETED"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One compute instance owned by the current run.
pub struct Server {
    pub id: String,
    pub name: String,
    pub status: ServerStatus,
    /// Set once a floating IP has been associated.
    pub floating_ip: Option<IpAddr>,
}

impl Server {
    pub fn is_active(&self) -> bool {
        self.status == ServerStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatingIp {
    pub id: String,
    pub address: IpAddr,
}
