//! サービスディスカバリクライアント
//!
//! 登録中のVPNサービス一覧の取得（Roster）と、死亡判定されたVPNサーバーの
//! 登録解除リクエストを担当する。

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::info;

use vpn_monitor_common::error::{MonitorError, MonitorResult};
use vpn_monitor_common::types::{PublicKey, ServiceEntry, Signature};

/// VPNサービス一覧の取得パス
const SERVICES_PATH: &str = "/api/services?type=vpn";

/// VPN登録解除パス
const DEREGISTER_PATH: &str = "/api/services/deregister/vpn";

/// monitor公開鍵を載せるヘッダー
const HEADER_PK: &str = "NM-PK";

/// 登録解除の署名を載せるヘッダー
const HEADER_SIGN: &str = "NM-Sign";

/// サービスディスカバリへのリクエストタイムアウト
const SD_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// サービスディスカバリクライアント
#[derive(Clone)]
pub struct ServiceDiscoveryClient {
    client: Client,
    base_url: String,
    pk: PublicKey,
    sign: Signature,
}

impl ServiceDiscoveryClient {
    /// 新しいクライアントを作成
    pub fn new(base_url: &str, pk: PublicKey, sign: Signature) -> MonitorResult<Self> {
        let client = Client::builder()
            .timeout(SD_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MonitorError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            pk,
            sign,
        })
    }

    /// 登録中のVPNサービス一覧を取得する
    ///
    /// 空のリストは正常な結果であり、取得エラーとは区別される。
    /// 不正なエントリが1件でもあれば全体をエラーにする（部分的な
    /// Rosterは返さない）。
    pub async fn vpn_services(&self) -> MonitorResult<Vec<ServiceEntry>> {
        let url = format!("{}{}", self.base_url, SERVICES_PATH);

        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MonitorError::Http(e.to_string()))?;

        if !res.status().is_success() {
            return Err(MonitorError::Discovery(format!(
                "service list returned status {}",
                res.status()
            )));
        }

        res.json()
            .await
            .map_err(|e| MonitorError::Discovery(format!("failed to decode service list: {e}")))
    }

    /// VPNサービス一覧から公開鍵のRosterを抽出する
    ///
    /// Rosterは毎周期ここで一から作り直す（差分管理はしない）。
    pub async fn vpn_keys(&self) -> MonitorResult<Vec<PublicKey>> {
        let services = self.vpn_services().await?;

        let keys: Vec<PublicKey> = services
            .iter()
            .map(|service| service.address.public_key().clone())
            .collect();

        info!(vpns = keys.len(), "Vpn keys updated.");
        Ok(keys)
    }

    /// 死亡判定されたVPNサーバー群の登録解除を要求する
    ///
    /// 成功はHTTP 200のみ。リトライはせず、失敗時は次周期の再判定・
    /// 再報告に委ねる。
    pub async fn deregister_vpns(&self, keys: &[PublicKey]) -> MonitorResult<()> {
        let url = format!("{}{}", self.base_url, DEREGISTER_PATH);
        let hex_keys: Vec<&str> = keys.iter().map(PublicKey::as_hex).collect();

        let res = self
            .client
            .delete(&url)
            .header(HEADER_PK, self.pk.as_hex())
            .header(HEADER_SIGN, self.sign.as_hex())
            .json(&hex_keys)
            .send()
            .await
            .map_err(|e| MonitorError::Http(e.to_string()))?;

        if res.status() != StatusCode::OK {
            return Err(MonitorError::Deregistration(res.status().as_u16()));
        }

        Ok(())
    }
}
