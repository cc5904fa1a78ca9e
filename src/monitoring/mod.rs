//! Monitoring collaborator: delivers the run result to Zabbix.

pub mod config;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
/// Sender wire format.
pub mod protocol;
pub mod sink;
pub mod types;
/// Trapper client.
pub mod zabbix;

#[cfg(test)]
mod tests;

pub use config::{PreSharedKey, ZabbixConfig};
pub use error::{MonitoringError, MonitoringResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockSink;
pub use sink::{LogSink, MetricSink};
pub use types::{Metric, MetricTarget, SendSummary};
pub use zabbix::ZabbixSender;
