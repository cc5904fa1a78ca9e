//! Zabbix sender wire format.
//!
//! Every message is `"ZBXD"`, a flags byte, then the payload length and a
//! reserved field (little-endian `u32` each, `u64` each with the large-packet
//! flag), then the JSON payload.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::{MonitoringError, MonitoringResult};
use super::types::{Metric, SendSummary};

pub const HEADER_MAGIC: &[u8; 4] = b"ZBXD";
pub const FLAG_PROTOCOL: u8 = 0x01;
pub const FLAG_COMPRESSED: u8 = 0x02;
pub const FLAG_LARGE: u8 = 0x04;

/// Responses larger than this are treated as garbage.
pub const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

#[derive(Serialize)]
struct SenderRequest<'a> {
    request: &'static str,
    data: &'a [Metric],
}

#[derive(Debug, Deserialize)]
/// Decoded trapper response.
pub struct SenderResponse {
    pub response: String,
    #[serde(default)]
    pub info: String,
}

/// Frames a `sender data` request for `metrics`.
pub fn encode_request(metrics: &[Metric]) -> MonitoringResult<Vec<u8>> {
    let payload = serde_json::to_vec(&SenderRequest {
        request: "sender data",
        data: metrics,
    })?;

    let len = u32::try_from(payload.len())
        .map_err(|_| MonitoringError::Protocol("request exceeds 4 GiB".to_string()))?;

    let mut frame = Vec::with_capacity(13 + payload.len());
    frame.extend_from_slice(HEADER_MAGIC);
    frame.push(FLAG_PROTOCOL);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&0u32.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Reads one framed response.
pub async fn read_response<R>(reader: &mut R) -> MonitoringResult<SenderResponse>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 5];
    reader.read_exact(&mut prefix).await?;

    if &prefix[..4] != HEADER_MAGIC {
        return Err(MonitoringError::Protocol(format!(
            "bad header {:02x?}",
            &prefix[..4]
        )));
    }

    let flags = prefix[4];
    if flags & FLAG_PROTOCOL == 0 {
        return Err(MonitoringError::Protocol(format!(
            "unsupported flags {flags:#04x}"
        )));
    }
    if flags & FLAG_COMPRESSED != 0 {
        return Err(MonitoringError::Protocol(
            "compressed responses are not supported".to_string(),
        ));
    }

    let len = if flags & FLAG_LARGE != 0 {
        let len = reader.read_u64_le().await?;
        let _reserved = reader.read_u64_le().await?;
        len
    } else {
        let len = reader.read_u32_le().await?;
        let _reserved = reader.read_u32_le().await?;
        u64::from(len)
    };

    if len > MAX_RESPONSE_BYTES {
        return Err(MonitoringError::Protocol(format!(
            "response of {len} bytes exceeds {MAX_RESPONSE_BYTES}"
        )));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(serde_json::from_slice(&payload)?)
}

/// Parses `"processed: 1; failed: 0; total: 1; seconds spent: 0.000055"`.
///
/// Unknown fields are ignored; missing ones stay zero.
pub fn parse_info(info: &str) -> SendSummary {
    let mut summary = SendSummary::default();
    for part in info.split(';') {
        let Some((name, value)) = part.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim() {
            "processed" => summary.processed = value.parse().unwrap_or(0),
            "failed" => summary.failed = value.parse().unwrap_or(0),
            "total" => summary.total = value.parse().unwrap_or(0),
            "seconds spent" => summary.seconds_spent = value.parse().unwrap_or(0.0),
            _ => {}
        }
    }
    summary
}
