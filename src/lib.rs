//! Recurring VM health check for an OpenStack cloud.
//!
//! Each run creates a disposable server, gives it a floating IP, checks that
//! its SSH port accepts connections, deletes it again, and files the
//! per-step outcome string under one Zabbix item. A file marker prevents a
//! new run from starting while a previous server may still exist.
//!
//! # Modules
//! - [`lifecycle`] - lock guard, provisioning, teardown and [`RunController`]
//! - [`cloud`] - the [`CloudOps`] trait with OpenStack and local backends
//! - [`monitoring`] - the [`MetricSink`] trait and the Zabbix sender
//! - [`config`] - environment-backed [`Config`]
//! - [`logging`] - tracing subscriber setup
//!
//! ## Test/Mock Support
//! [`MockCloud`] and [`MockSink`] are available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod cloud;
pub mod config;
pub mod constants;
pub mod lifecycle;
pub mod logging;
pub mod monitoring;

pub use cloud::{
    CloudError, CloudOps, CloudProviderType, CloudResult, LocalCloud, OpenStackCloud,
    OpenStackConfig, Server, ServerRequest, ServerStatus, build_cloud_ops,
};
#[cfg(any(test, feature = "mock"))]
pub use cloud::{CloudCall, MockCloud};
pub use config::{Config, ConfigError};
pub use lifecycle::{
    CheckError, CheckResult, Outcome, ProbeConfig, ProvisionStage, ReachabilityProbe, RunConfig,
    RunController, RunLock, RunOutcome, RunReport, StatusTrail, Step,
};
#[cfg(any(test, feature = "mock"))]
pub use monitoring::MockSink;
pub use monitoring::{
    LogSink, Metric, MetricSink, MetricTarget, MonitoringError, ZabbixConfig, ZabbixSender,
};
