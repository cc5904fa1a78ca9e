//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `VMCHECK_*` environment variables
//! (cloud credentials use the standard `OS_*` names). A `.env` file in the
//! working directory is honoured by the binary before this module is consulted.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cloud::{CloudProviderType, OpenStackConfig};
use crate::constants::DEFAULT_LOCK_PATH;
use crate::lifecycle::{ProbeConfig, RunConfig};
use crate::monitoring::ZabbixConfig;

/// Health-check configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Names and timeouts for the disposable server.
    pub run: RunConfig,

    /// SSH reachability probe settings.
    pub probe: ProbeConfig,

    /// Lock marker path. Default: `./vm_check`.
    pub lock_path: PathBuf,

    /// Directory for dated error logs. Default: unset (stderr only).
    pub log_dir: Option<PathBuf>,

    /// Which cloud backend to drive. Default: `openstack`.
    pub cloud_provider: CloudProviderType,

    /// OpenStack credentials; present whenever the provider is `openstack`.
    pub openstack: Option<OpenStackConfig>,

    /// Zabbix sender settings.
    pub zabbix: ZabbixConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            probe: ProbeConfig::default(),
            lock_path: PathBuf::from(DEFAULT_LOCK_PATH),
            log_dir: None,
            cloud_provider: CloudProviderType::default(),
            openstack: None,
            zabbix: ZabbixConfig::default(),
        }
    }
}

impl Config {
    const ENV_LOCK_PATH: &'static str = "VMCHECK_LOCK_PATH";
    const ENV_LOG_DIR: &'static str = "VMCHECK_LOG_DIR";
    const ENV_CLOUD_PROVIDER: &'static str = "VMCHECK_CLOUD_PROVIDER";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cloud_provider = match env_optional(Self::ENV_CLOUD_PROVIDER) {
            Some(value) => value.parse()?,
            None => defaults.cloud_provider,
        };

        let openstack = match cloud_provider {
            CloudProviderType::OpenStack => Some(OpenStackConfig::from_env()?),
            CloudProviderType::Local => None,
        };

        Ok(Self {
            run: RunConfig::from_env()?,
            probe: ProbeConfig::from_env()?,
            lock_path: env_path(Self::ENV_LOCK_PATH, defaults.lock_path),
            log_dir: env_optional(Self::ENV_LOG_DIR).map(PathBuf::from),
            cloud_provider,
            openstack,
            zabbix: ZabbixConfig::from_env()?,
        })
    }
}

/// Returns the trimmed value of `name`, treating empty values as unset.
pub(crate) fn env_optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn env_string(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}

pub(crate) fn env_path(name: &str, default: PathBuf) -> PathBuf {
    env_optional(name).map(PathBuf::from).unwrap_or(default)
}

pub(crate) fn env_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env_optional(name) {
        Some(value) => value
            .parse()
            .map_err(|source| ConfigError::InvalidNumber {
                name,
                value,
                source,
            }),
        None => Ok(default),
    }
}

pub(crate) fn env_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env_optional(name) {
        Some(value) => value
            .parse()
            .map_err(|source| ConfigError::InvalidNumber {
                name,
                value,
                source,
            }),
        None => Ok(default),
    }
}

pub(crate) fn env_port(name: &'static str, default: u16) -> Result<u16, ConfigError> {
    let Some(value) = env_optional(name) else {
        return Ok(default);
    };

    let port: u16 = value
        .parse()
        .map_err(|source| ConfigError::InvalidNumber {
            name,
            value: value.clone(),
            source,
        })?;

    if port == 0 {
        return Err(ConfigError::InvalidPort { name, value });
    }

    Ok(port)
}

/// Reads a duration from the millisecond variable if set, else the seconds one.
pub(crate) fn env_duration(
    millis_name: &'static str,
    secs_name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    if env_optional(millis_name).is_some() {
        return env_u64(millis_name, 0).map(Duration::from_millis);
    }
    if env_optional(secs_name).is_some() {
        return env_u64(secs_name, 0).map(Duration::from_secs);
    }
    Ok(default)
}
