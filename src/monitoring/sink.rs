use async_trait::async_trait;
use tracing::info;

use super::error::MonitoringResult;
use super::types::{Metric, SendSummary};

#[async_trait]
/// Transport that delivers metrics to the monitoring system.
pub trait MetricSink: Send + Sync {
    /// Sends all `metrics` in one request.
    async fn send(&self, metrics: &[Metric]) -> MonitoringResult<SendSummary>;
}

/// Sink used when no monitoring server is configured: metrics are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl MetricSink for LogSink {
    async fn send(&self, metrics: &[Metric]) -> MonitoringResult<SendSummary> {
        for metric in metrics {
            info!(
                host = %metric.host,
                key = %metric.key,
                value = %metric.value,
                "Metric (not sent)"
            );
        }
        let total = metrics.len() as u32;
        Ok(SendSummary {
            processed: total,
            total,
            ..SendSummary::default()
        })
    }
}
