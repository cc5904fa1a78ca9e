use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("no Zabbix server configured (set VMCHECK_ZABBIX_SERVER)")]
    NoServer,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] openssl::error::ErrorStack),

    #[error("TLS-PSK handshake with {server} failed: {reason}")]
    Handshake { server: String, reason: String },

    #[error("sender exchange with {server} timed out after {timeout:?}")]
    Timeout { server: String, timeout: Duration },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server answered '{response}': {info}")]
    Rejected { response: String, info: String },

    #[error("{failed} of {total} values were not accepted")]
    ItemsFailed { failed: u32, total: u32 },
}

pub type MonitoringResult<T> = Result<T, MonitoringError>;
