//! OpenStack implementation of [`CloudOps`] over the Keystone, Nova, Neutron
//! and Glance REST APIs.
//!
//! Authentication is lazy: the first operation requests a Keystone v3 token and
//! resolves service endpoints from the returned catalog. The token is reused
//! for the rest of the run.

mod wire;


use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info};

use super::config::OpenStackConfig;
use super::error::{CloudError, CloudResult};
use super::ops::CloudOps;
use super::types::{
    FlavorRef, FloatingIp, ImageRef, KeypairRef, NetworkRef, Server, ServerRequest, ServerStatus,
};
use crate::constants::{
    HTTP_REQUEST_TIMEOUT, HTTP_RETRIES, HTTP_RETRY_BACKOFF, SERVER_POLL_INTERVAL,
};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

#[derive(Debug)]
struct Session {
    token: String,
    compute_url: String,
    network_url: String,
    image_url: String,
}

/// REST client for one OpenStack project.
pub struct OpenStackCloud {
    config: OpenStackConfig,
    http: HttpClient,
    session: OnceCell<Session>,
    poll_interval: Duration,
    retry_backoff: Duration,
}

impl OpenStackCloud {
    /// Creates a client; no request is made until the first operation.
    pub fn new(config: OpenStackConfig) -> Self {
        Self {
            config,
            http: HttpClient::builder()
                .timeout(HTTP_REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            session: OnceCell::new(),
            poll_interval: SERVER_POLL_INTERVAL,
            retry_backoff: HTTP_RETRY_BACKOFF,
        }
    }

    /// Overrides the server status poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the pause between retried HTTP requests.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    async fn session(&self) -> CloudResult<&Session> {
        self.session.get_or_try_init(|| self.authenticate()).await
    }

    async fn authenticate(&self) -> CloudResult<Session> {
        let url = format!("{}/auth/tokens", identity_base(&self.config.auth_url));
        let body = wire::auth_request(&self.config);

        let response = self.send(Method::POST, &url, None, Some(&body)).await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CloudError::Auth(format!("{status}: {text}")));
        }

        let token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                CloudError::Auth(format!("response carried no {SUBJECT_TOKEN_HEADER}"))
            })?;

        let body: wire::TokenResponse = response.json().await?;
        let catalog = body.token.catalog;

        let session = Session {
            token,
            compute_url: self.endpoint(&catalog, "compute")?,
            network_url: versioned(&self.endpoint(&catalog, "network")?, "v2.0"),
            image_url: versioned(&self.endpoint(&catalog, "image")?, "v2"),
        };

        info!(
            compute = %session.compute_url,
            network = %session.network_url,
            image = %session.image_url,
            "Authenticated against Keystone"
        );
        Ok(session)
    }

    fn endpoint(
        &self,
        catalog: &[wire::CatalogEntry],
        service: &'static str,
    ) -> CloudResult<String> {
        catalog
            .iter()
            .filter(|entry| entry.service_type == service)
            .flat_map(|entry| entry.endpoints.iter())
            .find(|ep| {
                ep.interface == self.config.interface
                    && self
                        .config
                        .region
                        .as_deref()
                        .is_none_or(|region| ep.in_region(region))
            })
            .map(|ep| ep.url.trim_end_matches('/').to_string())
            .ok_or(CloudError::EndpointNotFound { service })
    }

    /// Sends one request, retrying transient failures.
    ///
    /// Connect errors are retried for every method. Timeouts and 5xx
    /// responses are retried only for idempotent methods: a `POST` that may
    /// have reached the server is never sent twice.
    async fn send(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> CloudResult<Response> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;

            let mut request = self.http.request(method.clone(), url);
            if let Some(token) = token {
                request = request.header(AUTH_TOKEN_HEADER, token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let result = request.send().await;
            let idempotent = is_idempotent(&method);
            let retryable = match &result {
                Ok(response) => idempotent && response.status().is_server_error(),
                Err(e) => e.is_connect() || (idempotent && e.is_timeout()),
            };

            if !retryable || attempt >= HTTP_RETRIES {
                return result.map_err(CloudError::from);
            }

            debug!(%method, url, attempt, "Transient cloud API failure, retrying");
            tokio::time::sleep(self.retry_backoff).await;
        }
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> CloudResult<Response> {
        let session = self.session().await?;
        self.send(method, url, Some(&session.token), body).await
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> CloudResult<T> {
        let response = self.request(method.clone(), url, body).await?;
        let response = check_status(&method, url, response).await?;
        Ok(response.json().await?)
    }

    async fn get_server(&self, id: &str) -> CloudResult<Option<wire::ServerBody>> {
        let url = with_segments(&self.session().await?.compute_url, &["servers", id])?;
        let response = self.request(Method::GET, &url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(&Method::GET, &url, response).await?;
        let envelope: wire::ServerEnvelope = response.json().await?;
        Ok(Some(envelope.server))
    }
}

#[async_trait]
impl CloudOps for OpenStackCloud {
    async fn find_image(&self, name: &str) -> CloudResult<ImageRef> {
        let base = format!("{}/images", self.session().await?.image_url);
        let url = with_query(&base, &[("name", name)])?;
        let list: wire::ImageList = self.request_json(Method::GET, &url, None).await?;

        list.images
            .into_iter()
            .next()
            .map(|image| ImageRef {
                name: image.name.unwrap_or_else(|| name.to_string()),
                id: image.id,
            })
            .ok_or_else(|| CloudError::NotFound {
                kind: "image",
                name: name.to_string(),
            })
    }

    async fn find_flavor(&self, name: &str) -> CloudResult<FlavorRef> {
        let url = format!("{}/flavors/detail", self.session().await?.compute_url);
        let list: wire::FlavorList = self.request_json(Method::GET, &url, None).await?;

        list.flavors
            .into_iter()
            .find(|flavor| flavor.name.as_deref() == Some(name) || flavor.id == name)
            .map(|flavor| FlavorRef {
                name: flavor.name.unwrap_or_else(|| name.to_string()),
                id: flavor.id,
            })
            .ok_or_else(|| CloudError::NotFound {
                kind: "flavor",
                name: name.to_string(),
            })
    }

    async fn find_network(&self, name: &str) -> CloudResult<NetworkRef> {
        let base = format!("{}/networks", self.session().await?.network_url);
        let url = with_query(&base, &[("name", name)])?;
        let list: wire::NetworkList = self.request_json(Method::GET, &url, None).await?;

        list.networks
            .into_iter()
            .next()
            .map(|network| NetworkRef {
                name: network.name.unwrap_or_else(|| name.to_string()),
                id: network.id,
            })
            .ok_or_else(|| CloudError::NotFound {
                kind: "network",
                name: name.to_string(),
            })
    }

    async fn find_keypair(&self, name: &str) -> CloudResult<KeypairRef> {
        let url = with_segments(&self.session().await?.compute_url, &["os-keypairs", name])?;
        let response = self.request(Method::GET, &url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CloudError::NotFound {
                kind: "keypair",
                name: name.to_string(),
            });
        }
        let response = check_status(&Method::GET, &url, response).await?;
        let envelope: wire::KeypairEnvelope = response.json().await?;
        Ok(KeypairRef {
            name: envelope.keypair.name,
        })
    }

    async fn create_server(&self, request: &ServerRequest) -> CloudResult<Server> {
        let url = format!("{}/servers", self.session().await?.compute_url);
        let body = wire::create_server_request(
            &request.name,
            &request.image_id,
            &request.flavor_id,
            &request.network_id,
            &request.key_name,
        );
        let envelope: wire::ServerEnvelope =
            self.request_json(Method::POST, &url, Some(&body)).await?;

        info!(server_id = %envelope.server.id, name = %request.name, "Server create accepted");
        Ok(Server {
            id: envelope.server.id,
            name: request.name.clone(),
            status: envelope
                .server
                .status
                .as_deref()
                .map(ServerStatus::from_api)
                .unwrap_or(ServerStatus::Build),
            floating_ip: None,
        })
    }

    async fn wait_for_server(&self, server: &Server, timeout: Duration) -> CloudResult<Server> {
        let started = Instant::now();
        loop {
            let Some(body) = self.get_server(&server.id).await? else {
                return Err(CloudError::NotFound {
                    kind: "server",
                    name: server.id.clone(),
                });
            };

            let status = ServerStatus::from_api(body.status.as_deref().unwrap_or("BUILD"));
            match status {
                ServerStatus::Active => {
                    return Ok(Server {
                        id: body.id,
                        name: body.name.unwrap_or_else(|| server.name.clone()),
                        status,
                        floating_ip: server.floating_ip,
                    });
                }
                ServerStatus::Error => {
                    return Err(CloudError::ServerFault {
                        id: server.id.clone(),
                        fault: body
                            .fault
                            .map(|f| f.message)
                            .unwrap_or_else(|| "no fault recorded".to_string()),
                    });
                }
                _ => debug!(server_id = %server.id, %status, "Waiting for server"),
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(CloudError::Timeout {
                    id: server.id.clone(),
                    target: "become ACTIVE",
                    elapsed,
                });
            }
            tokio::time::sleep(self.poll_interval.min(timeout - elapsed)).await;
        }
    }

    async fn allocate_floating_ip(&self, pool: &str) -> CloudResult<FloatingIp> {
        let network = self.find_network(pool).await?;
        let network_url = &self.session().await?.network_url;

        let base = format!("{network_url}/floatingips");
        let url = with_query(&base, &[("floating_network_id", network.id.as_str())])?;
        let list: wire::FloatingIpList = self.request_json(Method::GET, &url, None).await?;

        let body = match list.floatingips.into_iter().find(|ip| ip.port_id.is_none()) {
            Some(free) => {
                debug!(address = %free.floating_ip_address, "Reusing unattached floating IP");
                free
            }
            None => {
                let request = json!({ "floatingip": { "floating_network_id": network.id } });
                let envelope: wire::FloatingIpEnvelope =
                    self.request_json(Method::POST, &base, Some(&request)).await?;
                info!(
                    address = %envelope.floatingip.floating_ip_address,
                    pool,
                    "Allocated floating IP"
                );
                envelope.floatingip
            }
        };

        let address: IpAddr = body.floating_ip_address.parse().map_err(|_| {
            CloudError::InvalidResponse(format!(
                "floating IP address '{}' is not an IP address",
                body.floating_ip_address
            ))
        })?;

        Ok(FloatingIp {
            id: body.id,
            address,
        })
    }

    async fn associate_floating_ip(&self, server: &Server, ip: &FloatingIp) -> CloudResult<()> {
        let network_url = &self.session().await?.network_url;

        let url = with_query(
            &format!("{network_url}/ports"),
            &[("device_id", server.id.as_str())],
        )?;
        let ports: wire::PortList = self.request_json(Method::GET, &url, None).await?;
        let port = ports.ports.into_iter().next().ok_or_else(|| CloudError::NoPort {
            id: server.id.clone(),
        })?;

        let url = format!("{network_url}/floatingips/{}", ip.id);
        let body = json!({ "floatingip": { "port_id": port.id } });
        let response = self.request(Method::PUT, &url, Some(&body)).await?;
        check_status(&Method::PUT, &url, response).await?;

        info!(server_id = %server.id, address = %ip.address, "Floating IP associated");
        Ok(())
    }

    async fn delete_server(&self, server: &Server, timeout: Duration) -> CloudResult<()> {
        let compute_url = &self.session().await?.compute_url;
        let url = with_segments(compute_url, &["servers", server.id.as_str()])?;
        let response = self.request(Method::DELETE, &url, None).await?;
        if response.status() != StatusCode::NOT_FOUND {
            check_status(&Method::DELETE, &url, response).await?;
        }

        let started = Instant::now();
        loop {
            let gone = match self.get_server(&server.id).await? {
                None => true,
                Some(body) => {
                    ServerStatus::from_api(body.status.as_deref().unwrap_or_default())
                        == ServerStatus::Deleted
                }
            };
            if gone {
                info!(server_id = %server.id, "Server deleted");
                return Ok(());
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(CloudError::Timeout {
                    id: server.id.clone(),
                    target: "be deleted",
                    elapsed,
                });
            }
            tokio::time::sleep(self.poll_interval.min(timeout - elapsed)).await;
        }
    }
}

async fn check_status(method: &Method, url: &str, response: Response) -> CloudResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(CloudError::Api {
        method: method.to_string(),
        url: url.to_string(),
        status,
        body,
    })
}

fn with_query(base: &str, params: &[(&str, &str)]) -> CloudResult<String> {
    Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| CloudError::InvalidUrl {
            url: base.to_string(),
            reason: e.to_string(),
        })
}

/// Appends percent-encoded path segments to `base`.
fn with_segments(base: &str, segments: &[&str]) -> CloudResult<String> {
    let invalid = |reason: String| CloudError::InvalidUrl {
        url: base.to_string(),
        reason,
    };
    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("URL cannot have a path".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.into())
}

fn is_idempotent(method: &Method) -> bool {
    *method != Method::POST && *method != Method::PATCH
}

/// Keystone v3 base for `auth_url`, which may omit the version suffix.
fn identity_base(auth_url: &str) -> String {
    let trimmed = auth_url.trim_end_matches('/');
    if trimmed.ends_with("/v3") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v3")
    }
}

/// Appends `/{version}` unless the catalog URL already ends with it.
fn versioned(url: &str, version: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with(&format!("/{version}")) {
        trimmed.to_string()
    } else {
        format!("{trimmed}/{version}")
    }
}
