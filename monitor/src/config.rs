//! Configuration management via environment variables
//!
//! Provides helper functions for reading environment variables and the
//! assembled `MonitorSettings` used by `main.rs`.

use vpn_monitor_common::config::MonitorConfig;
use vpn_monitor_common::error::{MonitorError, MonitorResult};

/// Get an environment variable
///
/// # Returns
/// * `Some(value)` - The environment variable value
/// * `None` - The variable is not set
pub fn get_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Get an environment variable with a default value
///
/// # Example
/// ```
/// use vpn_monitor::config::get_env_or;
///
/// let host = get_env_or("VPN_MONITOR_HOST", "0.0.0.0");
/// ```
pub fn get_env_or(name: &str, default: &str) -> String {
    get_env(name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable, parsing to a specific type
///
/// Returns the default if the variable is not set or fails to parse.
pub fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    get_env(name).and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn require_env(name: &str) -> MonitorResult<String> {
    get_env(name).ok_or_else(|| MonitorError::Config(format!("{name} is not set")))
}

/// サーバーと監視ループ全体の設定
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// バインドアドレス
    pub host: String,
    /// リッスンポート
    pub port: u16,
    /// コア設定（鍵・外部サービスURL・監視周期）
    pub config: MonitorConfig,
}

impl MonitorSettings {
    /// 環境変数から設定を組み立てる
    ///
    /// `VPN_MONITOR_PK` と `VPN_MONITOR_SIGN` は必須。欠けている、または
    /// 16進表現として不正な場合はエラーを返す。
    pub fn from_env() -> MonitorResult<Self> {
        let pk = require_env("VPN_MONITOR_PK")?.parse()?;
        let sign = require_env("VPN_MONITOR_SIGN")?.parse()?;
        let sk = match get_env("VPN_MONITOR_SK") {
            Some(raw) => Some(raw.parse()?),
            None => None,
        };

        let config = MonitorConfig {
            pk,
            sk,
            sign,
            sd_url: get_env_or("VPN_MONITOR_SD_URL", MonitorConfig::DEFAULT_SD_URL),
            ut_url: get_env_or("VPN_MONITOR_UT_URL", MonitorConfig::DEFAULT_UT_URL),
            visor_api_url: get_env_or(
                "VPN_MONITOR_VISOR_API_URL",
                MonitorConfig::DEFAULT_VISOR_API_URL,
            ),
            sleep_deregistration_mins: get_env_parse(
                "VPN_MONITOR_SLEEP_DEREGISTRATION",
                MonitorConfig::DEFAULT_SLEEP_DEREGISTRATION_MINS,
            ),
        };

        Ok(Self {
            host: get_env_or("VPN_MONITOR_HOST", "0.0.0.0"),
            port: get_env_parse("VPN_MONITOR_PORT", 9081),
            config,
        })
    }

    /// `host:port` 形式のバインドアドレスを返す
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
