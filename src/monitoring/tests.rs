use super::*;

use std::env;
use std::time::Duration;

use serial_test::serial;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::ConfigError;

const PSK_HEX: &str = "1f87b595725ac58dd977beef14b97461a7c1045b9a1c963065002c5473194952";

fn frame(payload: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"ZBXD\x01");
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(payload.as_bytes());
    out
}

/// Accepts one connection, returns the request JSON, and answers with `reply`.
async fn fake_trapper(reply: Option<&'static str>) -> (u16, JoinHandle<serde_json::Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut header = [0u8; 13];
        socket.read_exact(&mut header).await.unwrap();
        assert_eq!(&header[..5], b"ZBXD\x01");
        let len = u32::from_le_bytes(header[5..9].try_into().unwrap()) as usize;
        let mut body = vec![0u8; len];
        socket.read_exact(&mut body).await.unwrap();

        match reply {
            Some(reply) => socket.write_all(&frame(reply)).await.unwrap(),
            None => tokio::time::sleep(Duration::from_secs(5)).await,
        }
        serde_json::from_slice(&body).unwrap()
    });

    (port, handle)
}

fn sender_config(port: u16) -> ZabbixConfig {
    ZabbixConfig {
        server: Some("127.0.0.1".to_string()),
        port,
        timeout: Duration::from_secs(2),
        ..ZabbixConfig::default()
    }
}

fn metric(value: &str) -> Metric {
    ZabbixConfig::default().target().metric(value)
}

#[test]
fn test_encode_request_frames_payload() {
    let frame = protocol::encode_request(&[metric("vm_created:Failed, ")]).unwrap();

    assert_eq!(&frame[..4], b"ZBXD");
    assert_eq!(frame[4], protocol::FLAG_PROTOCOL);
    let len = u32::from_le_bytes(frame[5..9].try_into().unwrap()) as usize;
    assert_eq!(&frame[9..13], &[0, 0, 0, 0]);
    assert_eq!(frame.len(), 13 + len);

    let json: serde_json::Value = serde_json::from_slice(&frame[13..]).unwrap();
    assert_eq!(json["request"], "sender data");
    assert_eq!(json["data"][0]["host"], "openstack-monitoring");
    assert_eq!(json["data"][0]["key"], "openstack.test");
    assert_eq!(json["data"][0]["value"], "vm_created:Failed, ");
}

#[tokio::test]
async fn test_read_response_standard_header() {
    let bytes = frame(r#"{"response":"success","info":"processed: 1; failed: 0; total: 1"}"#);
    let response = protocol::read_response(&mut bytes.as_slice()).await.unwrap();
    assert_eq!(response.response, "success");
    assert!(response.info.starts_with("processed: 1"));
}

#[tokio::test]
async fn test_read_response_large_header() {
    let payload = r#"{"response":"success","info":""}"#;
    let mut bytes = b"ZBXD\x05".to_vec();
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&0u64.to_le_bytes());
    bytes.extend_from_slice(payload.as_bytes());

    let response = protocol::read_response(&mut bytes.as_slice()).await.unwrap();
    assert_eq!(response.response, "success");
}

#[tokio::test]
async fn test_read_response_rejects_bad_magic_and_compression() {
    let mut bad = frame("{}");
    bad[0] = b'X';
    assert!(matches!(
        protocol::read_response(&mut bad.as_slice()).await,
        Err(MonitoringError::Protocol(_))
    ));

    let mut compressed = frame("{}");
    compressed[4] = protocol::FLAG_PROTOCOL | protocol::FLAG_COMPRESSED;
    assert!(matches!(
        protocol::read_response(&mut compressed.as_slice()).await,
        Err(MonitoringError::Protocol(_))
    ));
}

#[tokio::test]
async fn test_read_response_truncated_payload_is_io_error() {
    let mut bytes = frame(r#"{"response":"success"}"#);
    bytes.truncate(bytes.len() - 3);
    assert!(matches!(
        protocol::read_response(&mut bytes.as_slice()).await,
        Err(MonitoringError::Io(_))
    ));
}

#[test]
fn test_parse_info() {
    let summary =
        protocol::parse_info("processed: 1; failed: 2; total: 3; seconds spent: 0.000055");
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.total, 3);
    assert!((summary.seconds_spent - 0.000055).abs() < 1e-9);

    assert_eq!(protocol::parse_info("garbage"), SendSummary::default());
}

#[tokio::test]
async fn test_sender_delivers_metric() {
    let (port, server) = fake_trapper(Some(
        r#"{"response":"success","info":"processed: 1; failed: 0; total: 1; seconds spent: 0.0001"}"#,
    ))
    .await;

    let sender = ZabbixSender::new(&sender_config(port)).unwrap();
    assert!(!sender.is_encrypted());

    let summary = sender.send(&[metric("vm_created:Success, ")]).await.unwrap();
    assert_eq!(summary.processed, 1);

    let request = server.await.unwrap();
    assert_eq!(request["data"][0]["value"], "vm_created:Success, ");
}

#[tokio::test]
async fn test_sender_reports_failed_items() {
    let (port, _server) = fake_trapper(Some(
        r#"{"response":"success","info":"processed: 0; failed: 1; total: 1; seconds spent: 0.0001"}"#,
    ))
    .await;

    let err = ZabbixSender::new(&sender_config(port))
        .unwrap()
        .send(&[metric("x")])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MonitoringError::ItemsFailed {
            failed: 1,
            total: 1
        }
    ));
}

#[tokio::test]
async fn test_sender_reports_rejection() {
    let (port, _server) =
        fake_trapper(Some(r#"{"response":"failed","info":"host not monitored"}"#)).await;

    let err = ZabbixSender::new(&sender_config(port))
        .unwrap()
        .send(&[metric("x")])
        .await
        .unwrap_err();
    assert!(matches!(err, MonitoringError::Rejected { .. }));
}

#[tokio::test]
async fn test_sender_times_out_on_silent_server() {
    let (port, _server) = fake_trapper(None).await;
    let config = ZabbixConfig {
        timeout: Duration::from_millis(100),
        ..sender_config(port)
    };

    let err = ZabbixSender::new(&config)
        .unwrap()
        .send(&[metric("x")])
        .await
        .unwrap_err();
    assert!(matches!(err, MonitoringError::Timeout { .. }));
}

#[test]
fn test_sender_requires_server() {
    assert!(matches!(
        ZabbixSender::new(&ZabbixConfig::default()),
        Err(MonitoringError::NoServer)
    ));
}

#[test]
fn test_psk_sender_builds_tls_context() {
    let config = ZabbixConfig {
        psk: Some(PreSharedKey::from_hex("PSK 001", PSK_HEX).unwrap()),
        ..sender_config(10051)
    };
    let sender = ZabbixSender::new(&config).unwrap();
    assert!(sender.is_encrypted());
}

#[test]
fn test_psk_validation() {
    let psk = PreSharedKey::from_hex("PSK 001", PSK_HEX).unwrap();
    assert_eq!(psk.key().len(), 32);
    assert!(!format!("{psk:?}").contains("1f87"));

    assert!(matches!(
        PreSharedKey::from_hex("PSK 001", "not-hex"),
        Err(ConfigError::InvalidPsk { .. })
    ));
    assert!(matches!(
        PreSharedKey::from_hex("PSK 001", "abcd"),
        Err(ConfigError::InvalidPsk { .. })
    ));
    assert!(matches!(
        PreSharedKey::from_hex("", PSK_HEX),
        Err(ConfigError::InvalidPsk { .. })
    ));
}

#[tokio::test]
async fn test_log_sink_accepts_everything() {
    let summary = LogSink.send(&[metric("a"), metric("b")]).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 0);
}

fn clear_zabbix_env() {
    // SAFETY: Test code only, serialized with #[serial].
    unsafe {
        env::remove_var("VMCHECK_ZABBIX_SERVER");
        env::remove_var("VMCHECK_ZABBIX_PORT");
        env::remove_var("VMCHECK_ZABBIX_HOST");
        env::remove_var("VMCHECK_ZABBIX_KEY");
        env::remove_var("VMCHECK_ZABBIX_PSK_IDENTITY");
        env::remove_var("VMCHECK_ZABBIX_PSK");
        env::remove_var("VMCHECK_ZABBIX_TIMEOUT_SECS");
    }
}

#[test]
#[serial]
fn test_zabbix_config_from_env() {
    clear_zabbix_env();
    // SAFETY: Test code only, serialized with #[serial].
    unsafe {
        env::set_var("VMCHECK_ZABBIX_SERVER", "zabbix.example.org");
        env::set_var("VMCHECK_ZABBIX_PORT", "10052");
        env::set_var("VMCHECK_ZABBIX_PSK_IDENTITY", "PSK 001");
        env::set_var("VMCHECK_ZABBIX_PSK", PSK_HEX);
        env::set_var("VMCHECK_ZABBIX_TIMEOUT_SECS", "5");
    }

    let config = ZabbixConfig::from_env();
    clear_zabbix_env();
    let config = config.unwrap();

    assert_eq!(config.server.as_deref(), Some("zabbix.example.org"));
    assert_eq!(config.port, 10052);
    assert_eq!(config.host, "openstack-monitoring");
    assert_eq!(config.key, "openstack.test");
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.psk.unwrap().identity, "PSK 001");
}

#[test]
#[serial]
fn test_zabbix_config_requires_psk_pair() {
    clear_zabbix_env();
    // SAFETY: Test code only, serialized with #[serial].
    unsafe { env::set_var("VMCHECK_ZABBIX_PSK_IDENTITY", "PSK 001") };

    let result = ZabbixConfig::from_env();
    clear_zabbix_env();
    assert!(matches!(result, Err(ConfigError::InvalidPsk { .. })));
}
