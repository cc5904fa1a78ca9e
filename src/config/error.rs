//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}' in {name}: must be between 1 and 65535")]
    InvalidPort { name: &'static str, value: String },

    /// A numeric setting could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// A required environment variable was not set.
    #[error("missing required environment variable: {name}")]
    MissingEnvVar { name: &'static str },

    /// Cloud provider name is not recognised.
    #[error("unknown cloud provider '{value}' (expected 'openstack' or 'local')")]
    UnknownProvider { value: String },

    /// Neither password nor application-credential auth is fully configured.
    #[error("incomplete OpenStack credentials: {reason}")]
    IncompleteCredentials { reason: String },

    /// PSK identity/key pair is malformed.
    #[error("invalid Zabbix PSK: {reason}")]
    InvalidPsk { reason: String },
}
