//! Cloud collaborator: the [`CloudOps`] capability trait and its backends.
//!
//! `OpenStackCloud` talks to the OpenStack REST APIs. `LocalCloud` is an
//! in-process simulator for dry runs. `MockCloud` (tests / `mock` feature)
//! injects failures per operation.

/// Provider selection and OpenStack credentials.
pub mod config;
/// Cloud error types.
pub mod error;
/// Factory helpers.
pub mod factory;
/// In-process simulator.
pub mod local;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod openstack;
/// The capability trait.
pub mod ops;
/// Resource handles.
pub mod types;


pub use config::{
    CloudProviderType, OpenStackConfig, OpenStackCredentials, ProjectScope, Secret,
};
pub use error::{CloudError, CloudResult};
pub use factory::build_cloud_ops;
pub use local::LocalCloud;
#[cfg(any(test, feature = "mock"))]
pub use mock::{CloudCall, MockCloud};
pub use openstack::OpenStackCloud;
pub use ops::CloudOps;
pub use types::{
    FlavorRef, FloatingIp, ImageRef, KeypairRef, NetworkRef, Server, ServerRequest, ServerStatus,
};
