//! ロギング初期化ユーティリティ

use tracing_subscriber::EnvFilter;

/// tracingサブスクライバーを初期化する
///
/// フィルタは `VPN_MONITOR_LOG_LEVEL`（未設定時は `info`）から構築する。
/// `RUST_LOG` 形式のディレクティブ（例: `info,vpn_monitor=debug`）も使える。
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let directives = crate::config::get_env_or("VPN_MONITOR_LOG_LEVEL", "info");
    let filter = EnvFilter::try_new(directives)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()?;

    Ok(())
}
