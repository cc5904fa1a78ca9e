//! Fixed identifiers, ports and timeouts shared across modules.
//!
//! Values that an operator may want to tune live in [`crate::config`]; the
//! constants here are the defaults those settings fall back to.

use std::time::Duration;

// =============================================================================
// Run configuration defaults
// =============================================================================

/// Name given to the disposable server.
pub const DEFAULT_SERVER_NAME: &str = "test.vm";

/// Image looked up by name for the disposable server.
pub const DEFAULT_IMAGE_NAME: &str = "centos7-1907";

/// Flavor looked up by name (or id) for the disposable server.
pub const DEFAULT_FLAVOR_NAME: &str = "m1.small";

/// Tenant network the server is attached to.
pub const DEFAULT_NETWORK_NAME: &str = "default_network";

/// External network floating IPs are taken from.
pub const DEFAULT_FLOATING_IP_POOL: &str = "external";

/// Keypair injected into the server.
pub const DEFAULT_KEYPAIR_NAME: &str = "pk";

/// Upper bound for a server to reach `ACTIVE` after creation.
pub const DEFAULT_CREATE_TIMEOUT_SECS: u64 = 600;

/// Upper bound for a server to disappear after deletion.
pub const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 850;

/// Marker file whose presence blocks new runs.
pub const DEFAULT_LOCK_PATH: &str = "vm_check";

// =============================================================================
// Reachability probe defaults
// =============================================================================

/// SSH port probed on the floating IP.
pub const SSH_PORT: u16 = 22;

/// Delay before the first connection attempt.
pub const DEFAULT_PROBE_INITIAL_DELAY_SECS: u64 = 0;

/// Connection attempts before the server is declared unreachable.
pub const DEFAULT_PROBE_MAX_ATTEMPTS: u32 = 12;

/// Pause between failed attempts.
pub const DEFAULT_PROBE_RETRY_INTERVAL_SECS: u64 = 10;

/// Bound on a single TCP connect.
pub const DEFAULT_PROBE_CONNECT_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// Cloud client tuning
// =============================================================================

/// Interval between server status polls while waiting.
pub const SERVER_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Timeout applied to every HTTP request against the cloud APIs.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Attempts for a single HTTP request (transient failures only).
pub const HTTP_RETRIES: usize = 3;

/// Pause between HTTP retries.
pub const HTTP_RETRY_BACKOFF: Duration = Duration::from_millis(750);

// =============================================================================
// Monitoring defaults
// =============================================================================

/// Default Zabbix trapper port.
pub const DEFAULT_ZABBIX_PORT: u16 = 10051;

/// Zabbix host the result is filed under.
pub const DEFAULT_METRIC_HOST: &str = "openstack-monitoring";

/// Zabbix item key the result is filed under.
pub const DEFAULT_METRIC_KEY: &str = "openstack.test";

/// Bound on one complete sender exchange.
pub const DEFAULT_ZABBIX_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Process exit codes
// =============================================================================

/// Run completed (step failures are reported, not signalled via exit code).
pub const EXIT_OK: i32 = 0;

/// Configuration or logging could not be set up.
pub const EXIT_STARTUP_FAILURE: i32 = 1;

/// A previous run left its lock marker behind.
pub const EXIT_LOCK_CONFLICT: i32 = 2;
