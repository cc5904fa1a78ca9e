use std::time::Duration;

use crate::config::{ConfigError, env_duration, env_port, env_string, env_u32};
use crate::constants::{
    DEFAULT_CREATE_TIMEOUT_SECS, DEFAULT_DELETE_TIMEOUT_SECS, DEFAULT_FLAVOR_NAME,
    DEFAULT_FLOATING_IP_POOL, DEFAULT_IMAGE_NAME, DEFAULT_KEYPAIR_NAME, DEFAULT_NETWORK_NAME,
    DEFAULT_PROBE_CONNECT_TIMEOUT_SECS, DEFAULT_PROBE_INITIAL_DELAY_SECS,
    DEFAULT_PROBE_MAX_ATTEMPTS, DEFAULT_PROBE_RETRY_INTERVAL_SECS, DEFAULT_SERVER_NAME, SSH_PORT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Which resources the disposable server is built from.
pub struct RunConfig {
    /// Server name.
    pub server_name: String,
    /// Image name.
    pub image_name: String,
    /// Flavor name (an id is accepted as well).
    pub flavor_name: String,
    /// Tenant network name.
    pub network_name: String,
    /// External network floating IPs come from.
    pub floating_ip_pool: String,
    /// Keypair name.
    pub keypair_name: String,
    /// Bound for the server to become `ACTIVE`.
    pub create_timeout: Duration,
    /// Bound for the server to be gone after deletion.
    pub delete_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            image_name: DEFAULT_IMAGE_NAME.to_string(),
            flavor_name: DEFAULT_FLAVOR_NAME.to_string(),
            network_name: DEFAULT_NETWORK_NAME.to_string(),
            floating_ip_pool: DEFAULT_FLOATING_IP_POOL.to_string(),
            keypair_name: DEFAULT_KEYPAIR_NAME.to_string(),
            create_timeout: Duration::from_secs(DEFAULT_CREATE_TIMEOUT_SECS),
            delete_timeout: Duration::from_secs(DEFAULT_DELETE_TIMEOUT_SECS),
        }
    }
}

impl RunConfig {
    const ENV_SERVER_NAME: &'static str = "VMCHECK_SERVER_NAME";
    const ENV_IMAGE_NAME: &'static str = "VMCHECK_IMAGE";
    const ENV_FLAVOR_NAME: &'static str = "VMCHECK_FLAVOR";
    const ENV_NETWORK_NAME: &'static str = "VMCHECK_NETWORK";
    const ENV_FLOATING_IP_POOL: &'static str = "VMCHECK_FLOATING_IP_POOL";
    const ENV_KEYPAIR_NAME: &'static str = "VMCHECK_KEYPAIR";
    const ENV_CREATE_TIMEOUT_MS: &'static str = "VMCHECK_CREATE_TIMEOUT_MS";
    const ENV_CREATE_TIMEOUT_SECS: &'static str = "VMCHECK_CREATE_TIMEOUT_SECS";
    const ENV_DELETE_TIMEOUT_MS: &'static str = "VMCHECK_DELETE_TIMEOUT_MS";
    const ENV_DELETE_TIMEOUT_SECS: &'static str = "VMCHECK_DELETE_TIMEOUT_SECS";

    /// Loads the run configuration from environment variables (with defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            server_name: env_string(Self::ENV_SERVER_NAME, &defaults.server_name),
            image_name: env_string(Self::ENV_IMAGE_NAME, &defaults.image_name),
            flavor_name: env_string(Self::ENV_FLAVOR_NAME, &defaults.flavor_name),
            network_name: env_string(Self::ENV_NETWORK_NAME, &defaults.network_name),
            floating_ip_pool: env_string(Self::ENV_FLOATING_IP_POOL, &defaults.floating_ip_pool),
            keypair_name: env_string(Self::ENV_KEYPAIR_NAME, &defaults.keypair_name),
            create_timeout: env_duration(
                Self::ENV_CREATE_TIMEOUT_MS,
                Self::ENV_CREATE_TIMEOUT_SECS,
                defaults.create_timeout,
            )?,
            delete_timeout: env_duration(
                Self::ENV_DELETE_TIMEOUT_MS,
                Self::ENV_DELETE_TIMEOUT_SECS,
                defaults.delete_timeout,
            )?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Bounded polling policy for the SSH reachability check.
pub struct ProbeConfig {
    /// Port probed on the floating IP.
    pub port: u16,
    /// Wait before the first attempt.
    pub initial_delay: Duration,
    /// Total connection attempts (at least one is always made).
    pub max_attempts: u32,
    /// Pause between failed attempts.
    pub retry_interval: Duration,
    /// Bound on a single connect.
    pub connect_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: SSH_PORT,
            initial_delay: Duration::from_secs(DEFAULT_PROBE_INITIAL_DELAY_SECS),
            max_attempts: DEFAULT_PROBE_MAX_ATTEMPTS,
            retry_interval: Duration::from_secs(DEFAULT_PROBE_RETRY_INTERVAL_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_PROBE_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl ProbeConfig {
    const ENV_PORT: &'static str = "VMCHECK_PROBE_PORT";
    const ENV_INITIAL_DELAY_MS: &'static str = "VMCHECK_PROBE_INITIAL_DELAY_MS";
    const ENV_INITIAL_DELAY_SECS: &'static str = "VMCHECK_PROBE_INITIAL_DELAY_SECS";
    const ENV_MAX_ATTEMPTS: &'static str = "VMCHECK_PROBE_MAX_ATTEMPTS";
    const ENV_RETRY_INTERVAL_MS: &'static str = "VMCHECK_PROBE_RETRY_INTERVAL_MS";
    const ENV_RETRY_INTERVAL_SECS: &'static str = "VMCHECK_PROBE_RETRY_INTERVAL_SECS";
    const ENV_CONNECT_TIMEOUT_MS: &'static str = "VMCHECK_PROBE_CONNECT_TIMEOUT_MS";
    const ENV_CONNECT_TIMEOUT_SECS: &'static str = "VMCHECK_PROBE_CONNECT_TIMEOUT_SECS";

    /// Loads the probe policy from environment variables (with defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            port: env_port(Self::ENV_PORT, defaults.port)?,
            initial_delay: env_duration(
                Self::ENV_INITIAL_DELAY_MS,
                Self::ENV_INITIAL_DELAY_SECS,
                defaults.initial_delay,
            )?,
            max_attempts: env_u32(Self::ENV_MAX_ATTEMPTS, defaults.max_attempts)?.max(1),
            retry_interval: env_duration(
                Self::ENV_RETRY_INTERVAL_MS,
                Self::ENV_RETRY_INTERVAL_SECS,
                defaults.retry_interval,
            )?,
            connect_timeout: env_duration(
                Self::ENV_CONNECT_TIMEOUT_MS,
                Self::ENV_CONNECT_TIMEOUT_SECS,
                defaults.connect_timeout,
            )?,
        })
    }

    /// Worst-case time spent probing, excluding the initial delay.
    pub fn max_probe_duration(&self) -> Duration {
        let attempts = self.max_attempts.max(1);
        self.connect_timeout * attempts + self.retry_interval * (attempts - 1)
    }

    #[cfg(any(test, feature = "mock"))]
    /// Fast policy for tests against a loopback listener.
    pub fn for_testing(port: u16) -> Self {
        Self {
            port,
            initial_delay: Duration::ZERO,
            max_attempts: 2,
            retry_interval: Duration::from_millis(10),
            connect_timeout: Duration::from_millis(500),
        }
    }
}
