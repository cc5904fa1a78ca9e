use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("no '{service}' endpoint in the service catalog")]
    EndpointNotFound { service: &'static str },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{method} {url} returned {status}: {body}")]
    Api {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("server {id} entered ERROR state: {fault}")]
    ServerFault { id: String, fault: String },

    #[error("timed out after {elapsed:?} waiting for server {id} to {target}")]
    Timeout {
        id: String,
        target: &'static str,
        elapsed: Duration,
    },

    #[error("server {id} has no port to attach a floating IP to")]
    NoPort { id: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("cloud operation failed: {0}")]
    Operation(String),
}

pub type CloudResult<T> = Result<T, CloudError>;
