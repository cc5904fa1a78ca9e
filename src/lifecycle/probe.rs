//! TCP reachability check against the server's SSH port.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::time;
use tracing::debug;

use super::config::ProbeConfig;
use super::error::ProbeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A successful probe.
pub struct ProbeReport {
    /// 1-based attempt that connected.
    pub attempts: u32,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
/// Bounded connect-retry loop.
pub struct ReachabilityProbe {
    config: ProbeConfig,
}

impl ReachabilityProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// Tries to open a TCP connection to `ip` until one succeeds or the
    /// attempt budget is spent. Every connection is closed before returning.
    pub async fn check(&self, ip: IpAddr) -> Result<ProbeReport, ProbeError> {
        let addr = SocketAddr::new(ip, self.config.port);
        let max_attempts = self.config.max_attempts.max(1);
        debug!(
            %addr,
            max_attempts,
            budget_ms = self.config.max_probe_duration().as_millis() as u64,
            "Probing SSH port"
        );

        if !self.config.initial_delay.is_zero() {
            time::sleep(self.config.initial_delay).await;
        }

        let started = Instant::now();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match time::timeout(self.config.connect_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    drop(stream);
                    return Ok(ProbeReport {
                        attempts: attempt,
                        elapsed: started.elapsed(),
                    });
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => {
                    last_error = format!(
                        "connect timed out after {}ms",
                        self.config.connect_timeout.as_millis()
                    );
                }
            }

            debug!(%addr, attempt, max_attempts, error = %last_error, "Probe attempt failed");
            if attempt < max_attempts {
                time::sleep(self.config.retry_interval).await;
            }
        }

        Err(ProbeError {
            addr,
            attempts: max_attempts,
            last_error,
        })
    }
}
