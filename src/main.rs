//! vmcheck entrypoint: one health-check run per invocation.

use std::sync::Arc;

use mimalloc::MiMalloc;

use vmcheck::config::Config;
use vmcheck::constants::EXIT_STARTUP_FAILURE;
use vmcheck::lifecycle::RunController;
use vmcheck::monitoring::{LogSink, MetricSink, ZabbixSender};
use vmcheck::{build_cloud_ops, logging};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Startup failed: {e:#}");
            EXIT_STARTUP_FAILURE
        }
    };
    std::process::exit(code);
}

async fn run() -> anyhow::Result<i32> {
    let config = Config::from_env();

    let log_dir = config.as_ref().ok().and_then(|c| c.log_dir.as_deref());
    match logging::init(log_dir) {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "Error log enabled"),
        Ok(None) => {}
        Err(e) => eprintln!("vmcheck: logging setup failed: {e}"),
    }

    let config = config?;
    tracing::info!(
        provider = ?config.cloud_provider,
        lock = %config.lock_path.display(),
        server = %config.run.server_name,
        "vmcheck starting"
    );

    let cloud = build_cloud_ops(&config)?;
    let sink: Arc<dyn MetricSink> = if config.zabbix.server.is_some() {
        Arc::new(ZabbixSender::new(&config.zabbix)?)
    } else {
        tracing::warn!("VMCHECK_ZABBIX_SERVER not set, result will only be logged");
        Arc::new(LogSink)
    };

    let outcome = RunController::new(&config, cloud, sink).run().await;
    Ok(outcome.exit_code())
}
