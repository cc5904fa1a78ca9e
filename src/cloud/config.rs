use std::fmt;

use crate::config::{ConfigError, env_optional, env_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Cloud provider selection.
pub enum CloudProviderType {
    #[default]
    /// OpenStack (Keystone v3, Nova, Neutron, Glance).
    OpenStack,
    /// In-process simulator for dry runs.
    Local,
}

impl std::str::FromStr for CloudProviderType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openstack" | "os" => Ok(Self::OpenStack),
            "local" => Ok(Self::Local),
            _ => Err(ConfigError::UnknownProvider {
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
/// String that never shows up in `Debug` output.
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Project the password token is scoped to.
pub enum ProjectScope {
    Name { name: String, domain_name: String },
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenStackCredentials {
    Password {
        username: String,
        password: Secret,
        user_domain_name: String,
        project: ProjectScope,
    },
    ApplicationCredential {
        id: String,
        secret: Secret,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Keystone endpoint, credentials and catalog selection.
pub struct OpenStackConfig {
    /// Identity endpoint (with or without the `/v3` suffix).
    pub auth_url: String,
    pub credentials: OpenStackCredentials,
    /// Catalog region; the first matching endpoint wins when unset.
    pub region: Option<String>,
    /// Catalog interface. Default: `public`.
    pub interface: String,
}

impl OpenStackConfig {
    const ENV_AUTH_URL: &'static str = "OS_AUTH_URL";
    const ENV_USERNAME: &'static str = "OS_USERNAME";
    const ENV_PASSWORD: &'static str = "OS_PASSWORD";
    const ENV_PROJECT_NAME: &'static str = "OS_PROJECT_NAME";
    const ENV_PROJECT_ID: &'static str = "OS_PROJECT_ID";
    const ENV_USER_DOMAIN_NAME: &'static str = "OS_USER_DOMAIN_NAME";
    const ENV_PROJECT_DOMAIN_NAME: &'static str = "OS_PROJECT_DOMAIN_NAME";
    const ENV_APP_CRED_ID: &'static str = "OS_APPLICATION_CREDENTIAL_ID";
    const ENV_APP_CRED_SECRET: &'static str = "OS_APPLICATION_CREDENTIAL_SECRET";
    const ENV_REGION_NAME: &'static str = "OS_REGION_NAME";
    const ENV_INTERFACE: &'static str = "OS_INTERFACE";

    const DEFAULT_DOMAIN: &'static str = "Default";
    const DEFAULT_INTERFACE: &'static str = "public";

    /// Loads credentials from the standard `OS_*` variables.
    ///
    /// Application credentials take precedence when
    /// `OS_APPLICATION_CREDENTIAL_ID` is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let auth_url = env_optional(Self::ENV_AUTH_URL).ok_or(ConfigError::MissingEnvVar {
            name: Self::ENV_AUTH_URL,
        })?;

        let credentials = match env_optional(Self::ENV_APP_CRED_ID) {
            Some(id) => {
                let secret = env_optional(Self::ENV_APP_CRED_SECRET).ok_or_else(|| {
                    ConfigError::IncompleteCredentials {
                        reason: format!(
                            "{} is set but {} is not",
                            Self::ENV_APP_CRED_ID,
                            Self::ENV_APP_CRED_SECRET
                        ),
                    }
                })?;
                OpenStackCredentials::ApplicationCredential {
                    id,
                    secret: Secret::new(secret),
                }
            }
            None => Self::password_credentials_from_env()?,
        };

        Ok(Self {
            auth_url,
            credentials,
            region: env_optional(Self::ENV_REGION_NAME),
            interface: env_string(Self::ENV_INTERFACE, Self::DEFAULT_INTERFACE),
        })
    }

    fn password_credentials_from_env() -> Result<OpenStackCredentials, ConfigError> {
        let username = env_optional(Self::ENV_USERNAME);
        let password = env_optional(Self::ENV_PASSWORD);
        let project = match (
            env_optional(Self::ENV_PROJECT_ID),
            env_optional(Self::ENV_PROJECT_NAME),
        ) {
            (Some(id), _) => Some(ProjectScope::Id(id)),
            (None, Some(name)) => Some(ProjectScope::Name {
                name,
                domain_name: env_string(Self::ENV_PROJECT_DOMAIN_NAME, Self::DEFAULT_DOMAIN),
            }),
            (None, None) => None,
        };

        match (username, password, project) {
            (Some(username), Some(password), Some(project)) => {
                Ok(OpenStackCredentials::Password {
                    username,
                    password: Secret::new(password),
                    user_domain_name: env_string(Self::ENV_USER_DOMAIN_NAME, Self::DEFAULT_DOMAIN),
                    project,
                })
            }
            (username, password, project) => {
                let mut missing = Vec::new();
                if username.is_none() {
                    missing.push(Self::ENV_USERNAME);
                }
                if password.is_none() {
                    missing.push(Self::ENV_PASSWORD);
                }
                if project.is_none() {
                    missing.push("OS_PROJECT_NAME or OS_PROJECT_ID");
                }
                Err(ConfigError::IncompleteCredentials {
                    reason: format!("missing {}", missing.join(", ")),
                })
            }
        }
    }

    #[cfg(any(test, feature = "mock"))]
    pub fn for_testing(auth_url: &str) -> Self {
        Self {
            auth_url: auth_url.to_string(),
            credentials: OpenStackCredentials::Password {
                username: "demo".to_string(),
                password: Secret::new("secret"),
                user_domain_name: Self::DEFAULT_DOMAIN.to_string(),
                project: ProjectScope::Name {
                    name: "demo".to_string(),
                    domain_name: Self::DEFAULT_DOMAIN.to_string(),
                },
            },
            region: None,
            interface: Self::DEFAULT_INTERFACE.to_string(),
        }
    }
}
