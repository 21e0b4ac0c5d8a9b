//! CLI module for vpn-monitor
//!
//! Provides command-line interface for the monitor.
//! All runtime configuration is supplied via environment variables.

use clap::Parser;

/// Skywire VPN Monitor - liveness monitor and deregistration agent for VPN servers
#[derive(Parser, Debug)]
#[command(name = "vpn-monitor")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    VPN_MONITOR_HOST                  Bind address (default: 0.0.0.0)
    VPN_MONITOR_PORT                  Listen port (default: 9081)
    VPN_MONITOR_LOG_LEVEL             Log level (default: info)
    VPN_MONITOR_PK                    Monitor public key (hex, required)
    VPN_MONITOR_SK                    Monitor secret key (hex, optional)
    VPN_MONITOR_SIGN                  Deregistration signature (hex, required)
    VPN_MONITOR_SD_URL                Service discovery base URL
    VPN_MONITOR_UT_URL                Uptime tracker base URL
    VPN_MONITOR_VISOR_API_URL         Local visor API base URL
    VPN_MONITOR_SLEEP_DEREGISTRATION  Inter-cycle sleep in minutes (default: 10)
"#)]
pub struct Cli {}
