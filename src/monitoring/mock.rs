use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{MonitoringError, MonitoringResult};
use super::sink::MetricSink;
use super::types::{Metric, SendSummary};

/// Records every batch it is asked to send.
#[derive(Default)]
pub struct MockSink {
    sent: Mutex<Vec<Vec<Metric>>>,
    fail: bool,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose sends are recorded and then rejected.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Batches received so far.
    pub fn sent(&self) -> Vec<Vec<Metric>> {
        self.sent.lock().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl MetricSink for MockSink {
    async fn send(&self, metrics: &[Metric]) -> MonitoringResult<SendSummary> {
        self.sent.lock().push(metrics.to_vec());
        if self.fail {
            return Err(MonitoringError::Rejected {
                response: "failed".to_string(),
                info: "mock sink configured to fail".to_string(),
            });
        }
        let total = metrics.len() as u32;
        Ok(SendSummary {
            processed: total,
            total,
            ..SendSummary::default()
        })
    }
}
