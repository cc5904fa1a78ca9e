use std::fmt;
use std::time::Duration;

use crate::config::{ConfigError, env_optional, env_port, env_string, env_u64};
use crate::constants::{
    DEFAULT_METRIC_HOST, DEFAULT_METRIC_KEY, DEFAULT_ZABBIX_PORT, DEFAULT_ZABBIX_TIMEOUT_SECS,
};

use super::types::MetricTarget;

/// Zabbix accepts PSKs between 128 and 2048 bits.
const MIN_PSK_BYTES: usize = 16;
const MAX_PSK_BYTES: usize = 256;

#[derive(Clone, PartialEq, Eq)]
/// TLS pre-shared key credentials.
pub struct PreSharedKey {
    pub identity: String,
    key: Vec<u8>,
}

impl PreSharedKey {
    /// Validates `key_hex` and pairs it with `identity`.
    pub fn from_hex(identity: impl Into<String>, key_hex: &str) -> Result<Self, ConfigError> {
        let identity = identity.into();
        if identity.is_empty() {
            return Err(ConfigError::InvalidPsk {
                reason: "identity is empty".to_string(),
            });
        }

        let key = hex::decode(key_hex.trim()).map_err(|e| ConfigError::InvalidPsk {
            reason: format!("key is not valid hex: {e}"),
        })?;

        if !(MIN_PSK_BYTES..=MAX_PSK_BYTES).contains(&key.len()) {
            return Err(ConfigError::InvalidPsk {
                reason: format!(
                    "key is {} bytes, expected {MIN_PSK_BYTES}..={MAX_PSK_BYTES}",
                    key.len()
                ),
            });
        }

        Ok(Self { identity, key })
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

impl fmt::Debug for PreSharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreSharedKey")
            .field("identity", &self.identity)
            .field("key", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Zabbix trapper endpoint and the item the result is filed under.
pub struct ZabbixConfig {
    /// Trapper host; metrics are only logged when unset.
    pub server: Option<String>,
    /// Trapper port. Default: `10051`.
    pub port: u16,
    /// Zabbix host name. Default: `openstack-monitoring`.
    pub host: String,
    /// Item key. Default: `openstack.test`.
    pub key: String,
    /// Enables TLS-PSK when set.
    pub psk: Option<PreSharedKey>,
    /// Bound on one complete exchange. Default: 30s.
    pub timeout: Duration,
}

impl Default for ZabbixConfig {
    fn default() -> Self {
        Self {
            server: None,
            port: DEFAULT_ZABBIX_PORT,
            host: DEFAULT_METRIC_HOST.to_string(),
            key: DEFAULT_METRIC_KEY.to_string(),
            psk: None,
            timeout: Duration::from_secs(DEFAULT_ZABBIX_TIMEOUT_SECS),
        }
    }
}

impl ZabbixConfig {
    const ENV_SERVER: &'static str = "VMCHECK_ZABBIX_SERVER";
    const ENV_PORT: &'static str = "VMCHECK_ZABBIX_PORT";
    const ENV_HOST: &'static str = "VMCHECK_ZABBIX_HOST";
    const ENV_KEY: &'static str = "VMCHECK_ZABBIX_KEY";
    const ENV_PSK_IDENTITY: &'static str = "VMCHECK_ZABBIX_PSK_IDENTITY";
    const ENV_PSK: &'static str = "VMCHECK_ZABBIX_PSK";
    const ENV_TIMEOUT_SECS: &'static str = "VMCHECK_ZABBIX_TIMEOUT_SECS";

    /// Loads sender settings from environment variables (with defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let psk = match (
            env_optional(Self::ENV_PSK_IDENTITY),
            env_optional(Self::ENV_PSK),
        ) {
            (Some(identity), Some(key)) => Some(PreSharedKey::from_hex(identity, &key)?),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::InvalidPsk {
                    reason: format!(
                        "{} is set but {} is not",
                        Self::ENV_PSK_IDENTITY,
                        Self::ENV_PSK
                    ),
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::InvalidPsk {
                    reason: format!(
                        "{} is set but {} is not",
                        Self::ENV_PSK,
                        Self::ENV_PSK_IDENTITY
                    ),
                });
            }
        };

        Ok(Self {
            server: env_optional(Self::ENV_SERVER),
            port: env_port(Self::ENV_PORT, defaults.port)?,
            host: env_string(Self::ENV_HOST, &defaults.host),
            key: env_string(Self::ENV_KEY, &defaults.key),
            psk,
            timeout: Duration::from_secs(env_u64(
                Self::ENV_TIMEOUT_SECS,
                DEFAULT_ZABBIX_TIMEOUT_SECS,
            )?),
        })
    }

    /// The host/key pair results are filed under.
    pub fn target(&self) -> MetricTarget {
        MetricTarget {
            host: self.host.clone(),
            key: self.key.clone(),
        }
    }
}
