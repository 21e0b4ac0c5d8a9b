//! 設定管理
//!
//! MonitorConfig等の設定構造体

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{PublicKey, SecretKey, Signature};

/// VPN monitor設定
///
/// 鍵と署名、外部サービスのURL、監視周期をまとめた構造体。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// monitor自身の公開鍵（登録解除リクエストのNM-PKヘッダー）
    pub pk: PublicKey,

    /// monitor自身の秘密鍵（コアでは未使用、設定フォーマット互換のため保持）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sk: Option<SecretKey>,

    /// 登録解除の権限を証明する署名（NM-Signヘッダー）
    pub sign: Signature,

    /// サービスディスカバリのベースURL (デフォルト: "https://sd.skycoin.com")
    #[serde(default = "default_sd_url")]
    pub sd_url: String,

    /// アップタイムトラッカーのベースURL（コアの監視ロジックでは未使用）
    #[serde(default = "default_ut_url")]
    pub ut_url: String,

    /// ローカルvisor APIのベースURL (デフォルト: "http://127.0.0.1:3435")
    #[serde(default = "default_visor_api_url")]
    pub visor_api_url: String,

    /// 登録解除周期（分）(デフォルト: 10)
    #[serde(default = "default_sleep_deregistration")]
    pub sleep_deregistration_mins: u64,
}

impl MonitorConfig {
    /// サービスディスカバリのデフォルトURL
    pub const DEFAULT_SD_URL: &'static str = "https://sd.skycoin.com";

    /// アップタイムトラッカーのデフォルトURL
    pub const DEFAULT_UT_URL: &'static str = "https://ut.skywire.skycoin.com";

    /// visor APIのデフォルトURL
    pub const DEFAULT_VISOR_API_URL: &'static str = "http://127.0.0.1:3435";

    /// デフォルトの登録解除周期（分）
    pub const DEFAULT_SLEEP_DEREGISTRATION_MINS: u64 = 10;

    /// 周期間スリープをDurationとして返す
    pub fn sleep_interval(&self) -> Duration {
        Duration::from_secs(self.sleep_deregistration_mins * 60)
    }
}

fn default_sd_url() -> String {
    MonitorConfig::DEFAULT_SD_URL.to_string()
}

fn default_ut_url() -> String {
    MonitorConfig::DEFAULT_UT_URL.to_string()
}

fn default_visor_api_url() -> String {
    MonitorConfig::DEFAULT_VISOR_API_URL.to_string()
}

fn default_sleep_deregistration() -> u64 {
    MonitorConfig::DEFAULT_SLEEP_DEREGISTRATION_MINS
}
