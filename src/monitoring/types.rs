use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One (source host, item key, value) data point.
pub struct Metric {
    pub host: String,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where the run result is filed.
pub struct MetricTarget {
    pub host: String,
    pub key: String,
}

impl MetricTarget {
    pub fn metric(&self, value: impl Into<String>) -> Metric {
        Metric {
            host: self.host.clone(),
            key: self.key.clone(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
/// Counters from the server's `info` string.
pub struct SendSummary {
    pub processed: u32,
    pub failed: u32,
    pub total: u32,
    pub seconds_spent: f64,
}
