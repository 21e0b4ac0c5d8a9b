//! VPN Monitor Server Entry Point

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use vpn_monitor::cli::Cli;
use vpn_monitor::config::MonitorSettings;
use vpn_monitor::discovery::ServiceDiscoveryClient;
use vpn_monitor::health::{ProbeTimings, VpnMonitor};
use vpn_monitor::shutdown::ShutdownController;
use vpn_monitor::visor::RpcVisor;
use vpn_monitor::{logging, server, AppState};

#[tokio::main]
async fn main() {
    // -h/--help と -V/--version のみ
    let _cli = Cli::parse();

    logging::init().expect("failed to initialize logging");

    let settings = match MonitorSettings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            std::process::exit(1);
        }
    };

    // visorセッションコンテキストの確立。ここで失敗するとプローブは
    // 一切実行できないため、唯一の致命的エラーとして終了する
    let visor = match RpcVisor::bootstrap(&settings.config.visor_api_url).await {
        Ok(visor) => Arc::new(visor),
        Err(err) => {
            error!(error = %err, "Failed to start visor.");
            std::process::exit(1);
        }
    };
    info!(visor_api = %settings.config.visor_api_url, "Visor session context established");

    let discovery = match ServiceDiscoveryClient::new(
        &settings.config.sd_url,
        settings.config.pk.clone(),
        settings.config.sign.clone(),
    ) {
        Ok(discovery) => discovery,
        Err(err) => {
            error!(error = %err, "Failed to create service discovery client");
            std::process::exit(1);
        }
    };

    let shutdown = ShutdownController::default();

    let monitor = VpnMonitor::new(
        visor,
        discovery,
        ProbeTimings::default(),
        settings.config.sleep_interval(),
    );
    monitor.start(shutdown.clone());

    let state = AppState {
        started_at: chrono::Utc::now(),
        shutdown,
    };

    server::run(state, &settings.bind_addr()).await;
}
