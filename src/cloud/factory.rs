use std::sync::Arc;

use super::config::CloudProviderType;
use super::local::LocalCloud;
use super::openstack::OpenStackCloud;
use super::ops::CloudOps;
use crate::config::{Config, ConfigError};

/// Builds the [`CloudOps`] implementation selected by the config.
pub fn build_cloud_ops(config: &Config) -> Result<Arc<dyn CloudOps>, ConfigError> {
    match config.cloud_provider {
        CloudProviderType::OpenStack => {
            let openstack = config
                .openstack
                .clone()
                .ok_or(ConfigError::MissingEnvVar {
                    name: "OS_AUTH_URL",
                })?;
            Ok(Arc::new(OpenStackCloud::new(openstack)))
        }
        CloudProviderType::Local => Ok(Arc::new(LocalCloud::new())),
    }
}
