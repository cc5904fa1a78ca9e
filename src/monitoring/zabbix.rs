//! Zabbix trapper client (`zabbix_sender` protocol).
//!
//! Plain TCP by default; TLS with a pre-shared key when one is configured.
//! Certificate verification is off in PSK mode because the key itself
//! authenticates the server.

use std::pin::Pin;

use async_trait::async_trait;
use openssl::error::ErrorStack;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_openssl::SslStream;
use tracing::{debug, info};

use super::config::{PreSharedKey, ZabbixConfig};
use super::error::{MonitoringError, MonitoringResult};
use super::protocol::{self, SenderResponse};
use super::sink::MetricSink;
use super::types::{Metric, SendSummary};

/// TLS 1.2 PSK suites Zabbix agents/servers accept; TLS 1.3 uses OpenSSL defaults.
const PSK_CIPHERS: &str = "kECDHEPSK+AES128:kPSK+AES128";

/// Sends metrics to one Zabbix server or proxy.
pub struct ZabbixSender {
    server: String,
    port: u16,
    timeout: std::time::Duration,
    tls: Option<SslConnector>,
}

impl ZabbixSender {
    /// Builds a sender for `config.server`; fails if no server is configured
    /// or the TLS context cannot be created.
    pub fn new(config: &ZabbixConfig) -> MonitoringResult<Self> {
        let server = config.server.clone().ok_or(MonitoringError::NoServer)?;

        let tls = config.psk.as_ref().map(psk_connector).transpose()?;

        Ok(Self {
            server,
            port: config.port,
            timeout: config.timeout,
            tls,
        })
    }

    /// `true` when the exchange runs over TLS-PSK.
    pub fn is_encrypted(&self) -> bool {
        self.tls.is_some()
    }

    async fn exchange(&self, frame: &[u8]) -> MonitoringResult<SenderResponse> {
        let tcp = TcpStream::connect((self.server.as_str(), self.port)).await?;
        tcp.set_nodelay(true)?;

        match &self.tls {
            None => {
                let mut tcp = tcp;
                round_trip(&mut tcp, frame).await
            }
            Some(connector) => {
                let ssl = connector
                    .configure()?
                    .use_server_name_indication(false)
                    .verify_hostname(false)
                    .into_ssl(&self.server)?;
                let mut stream = SslStream::new(ssl, tcp)?;
                Pin::new(&mut stream)
                    .connect()
                    .await
                    .map_err(|e| MonitoringError::Handshake {
                        server: self.server.clone(),
                        reason: e.to_string(),
                    })?;
                debug!(server = %self.server, "TLS-PSK session established");
                round_trip(&mut stream, frame).await
            }
        }
    }
}

#[async_trait]
impl MetricSink for ZabbixSender {
    async fn send(&self, metrics: &[Metric]) -> MonitoringResult<SendSummary> {
        let frame = protocol::encode_request(metrics)?;

        let response = tokio::time::timeout(self.timeout, self.exchange(&frame))
            .await
            .map_err(|_| MonitoringError::Timeout {
                server: self.server.clone(),
                timeout: self.timeout,
            })??;

        if response.response != "success" {
            return Err(MonitoringError::Rejected {
                response: response.response,
                info: response.info,
            });
        }

        let summary = protocol::parse_info(&response.info);
        if summary.failed > 0 {
            return Err(MonitoringError::ItemsFailed {
                failed: summary.failed,
                total: summary.total,
            });
        }

        info!(
            server = %self.server,
            processed = summary.processed,
            encrypted = self.is_encrypted(),
            "Metrics delivered"
        );
        Ok(summary)
    }
}

async fn round_trip<S>(stream: &mut S, frame: &[u8]) -> MonitoringResult<SenderResponse>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(frame).await?;
    stream.flush().await?;
    let response = protocol::read_response(stream).await?;
    // best-effort close
    let _ = stream.shutdown().await;
    Ok(response)
}

/// Client TLS context that offers `psk` and skips certificate checks.
pub fn psk_connector(psk: &PreSharedKey) -> MonitoringResult<SslConnector> {
    let mut builder = SslConnector::builder(SslMethod::tls_client())?;
    builder.set_verify(SslVerifyMode::NONE);
    builder.set_cipher_list(PSK_CIPHERS)?;

    let identity = psk.identity.as_bytes().to_vec();
    let key = psk.key().to_vec();
    builder.set_psk_client_callback(move |_ssl, _hint, identity_out, psk_out| {
        // identity must be NUL-terminated
        if identity.len() >= identity_out.len() || key.len() > psk_out.len() {
            return Err(ErrorStack::get());
        }
        identity_out[..identity.len()].copy_from_slice(&identity);
        identity_out[identity.len()] = 0;
        psk_out[..key.len()].copy_from_slice(&key);
        Ok(key.len())
    });

    Ok(builder.build())
}
