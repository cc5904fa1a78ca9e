//! JSON shapes for the subset of Keystone/Nova/Neutron/Glance used here.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::cloud::config::{OpenStackConfig, OpenStackCredentials, ProjectScope};

/// Builds the `POST /v3/auth/tokens` body.
pub(crate) fn auth_request(config: &OpenStackConfig) -> Value {
    match &config.credentials {
        OpenStackCredentials::Password {
            username,
            password,
            user_domain_name,
            project,
        } => {
            let project = match project {
                ProjectScope::Id(id) => json!({ "id": id }),
                ProjectScope::Name { name, domain_name } => {
                    json!({ "name": name, "domain": { "name": domain_name } })
                }
            };
            json!({
                "auth": {
                    "identity": {
                        "methods": ["password"],
                        "password": {
                            "user": {
                                "name": username,
                                "domain": { "name": user_domain_name },
                                "password": password.expose(),
                            }
                        }
                    },
                    "scope": { "project": project }
                }
            })
        }
        OpenStackCredentials::ApplicationCredential { id, secret } => json!({
            "auth": {
                "identity": {
                    "methods": ["application_credential"],
                    "application_credential": { "id": id, "secret": secret.expose() }
                }
            }
        }),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub token: Token,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Token {
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Endpoint {
    pub interface: String,
    #[serde(default)]
    pub region_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub url: String,
}

impl Endpoint {
    pub fn in_region(&self, region: &str) -> bool {
        self.region_id.as_deref() == Some(region) || self.region.as_deref() == Some(region)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedResource {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageList {
    pub images: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlavorList {
    pub flavors: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NetworkList {
    pub networks: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KeypairEnvelope {
    pub keypair: Keypair,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Keypair {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServerEnvelope {
    pub server: ServerBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServerBody {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub fault: Option<Fault>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Fault {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FloatingIpList {
    pub floatingips: Vec<FloatingIpBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FloatingIpEnvelope {
    pub floatingip: FloatingIpBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FloatingIpBody {
    pub id: String,
    pub floating_ip_address: String,
    #[serde(default)]
    pub port_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PortList {
    pub ports: Vec<NamedResource>,
}

pub(crate) fn create_server_request(
    name: &str,
    image_id: &str,
    flavor_id: &str,
    network_id: &str,
    key_name: &str,
) -> Value {
    json!({
        "server": {
            "name": name,
            "imageRef": image_id,
            "flavorRef": flavor_id,
            "networks": [{ "uuid": network_id }],
            "key_name": key_name,
        }
    })
}
