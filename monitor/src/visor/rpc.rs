//! visor HTTP APIクライアント
//!
//! ローカルvisorのAPIを経由してトランスポートの開閉とvpn-clientアプリの
//! 起動・停止・状態取得を行う。使用するルート:
//!
//! - `GET  /api/overview` — 疎通確認（ブートストラップ時のみ）
//! - `POST /api/transports` — トランスポート確立
//! - `DELETE /api/transports/{id}` — トランスポート解放
//! - `PUT  /api/apps/{app}` — 接続先設定（`{"pk": ...}`）と起動停止（`{"status": 0|1}`）
//! - `GET  /api/apps/{app}` — アプリ状態（終端エラーは`last_error`）
//! - `GET  /api/apps/{app}/connections` — 接続サマリー一覧

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use vpn_monitor_common::error::{MonitorError, MonitorResult};
use vpn_monitor_common::types::PublicKey;

use super::{ConnectionSummary, TransportId, Visor, VpnClientError, TRANSPORT_TYPE};

/// visor APIリクエストのタイムアウト
///
/// トランスポート確立はvisor側のタイムアウト（リクエストで渡す値）が
/// 先に効くため、こちらはそれより十分長くとる。
const VISOR_RPC_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct AddTransportRequest<'a> {
    remote_pk: &'a str,
    transport_type: &'a str,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct AddTransportResponse {
    id: TransportId,
}

#[derive(Debug, Serialize)]
struct SetAppTargetRequest<'a> {
    pk: &'a str,
}

#[derive(Debug, Serialize)]
struct SetAppStatusRequest {
    status: u8,
}

#[derive(Debug, Deserialize)]
struct AppStateResponse {
    #[serde(default)]
    last_error: Option<String>,
}

/// ローカルvisorのHTTP APIを叩くセッションコンテキスト実装
#[derive(Debug, Clone)]
pub struct RpcVisor {
    client: Client,
    base_url: String,
}

impl RpcVisor {
    /// 新しいクライアントを作成する（疎通確認はしない）
    pub fn new(base_url: &str) -> MonitorResult<Self> {
        let client = Client::builder()
            .timeout(VISOR_RPC_TIMEOUT)
            .build()
            .map_err(|e| MonitorError::Visor(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// visorへの疎通を確認してセッションコンテキストを確立する
    ///
    /// ここで失敗するとプローブは一切実行できないため、呼び出し側
    /// （`main.rs`）はプロセスを終了する。全エラーの中で唯一の致命条件。
    pub async fn bootstrap(base_url: &str) -> MonitorResult<Self> {
        let visor = Self::new(base_url)?;

        let url = format!("{}/api/overview", visor.base_url);
        let res = visor
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MonitorError::Visor(format!("visor is unreachable: {e}")))?;

        if !res.status().is_success() {
            return Err(MonitorError::Visor(format!(
                "visor overview returned status {}",
                res.status()
            )));
        }

        Ok(visor)
    }

    fn app_url(&self, app: &str) -> String {
        format!("{}/api/apps/{app}", self.base_url)
    }

    async fn put_app<B: Serialize>(&self, app: &str, body: &B) -> MonitorResult<()> {
        let res = self
            .client
            .put(self.app_url(app))
            .json(body)
            .send()
            .await
            .map_err(|e| MonitorError::Visor(e.to_string()))?;

        if !res.status().is_success() {
            return Err(MonitorError::Visor(format!(
                "app {app} update returned status {}",
                res.status()
            )));
        }
        Ok(())
    }
}

impl Visor for RpcVisor {
    async fn open_transport(
        &self,
        remote: &PublicKey,
        timeout: Duration,
    ) -> MonitorResult<TransportId> {
        let url = format!("{}/api/transports", self.base_url);
        let body = AddTransportRequest {
            remote_pk: remote.as_hex(),
            transport_type: TRANSPORT_TYPE,
            timeout_secs: timeout.as_secs(),
        };

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| MonitorError::Transport(e.to_string()))?;

        if !res.status().is_success() {
            return Err(MonitorError::Transport(format!(
                "transport setup returned status {}",
                res.status()
            )));
        }

        let added: AddTransportResponse = res
            .json()
            .await
            .map_err(|e| MonitorError::Transport(format!("undecodable transport response: {e}")))?;
        Ok(added.id)
    }

    async fn close_transport(&self, id: &TransportId) -> MonitorResult<()> {
        let url = format!("{}/api/transports/{id}", self.base_url);
        let res = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| MonitorError::Transport(e.to_string()))?;

        if !res.status().is_success() {
            return Err(MonitorError::Transport(format!(
                "transport removal returned status {}",
                res.status()
            )));
        }
        Ok(())
    }

    async fn set_app_target(&self, app: &str, server: &PublicKey) -> MonitorResult<()> {
        self.put_app(
            app,
            &SetAppTargetRequest {
                pk: server.as_hex(),
            },
        )
        .await
    }

    async fn start_app(&self, app: &str) -> MonitorResult<()> {
        self.put_app(app, &SetAppStatusRequest { status: 1 }).await
    }

    async fn stop_app(&self, app: &str) -> MonitorResult<()> {
        self.put_app(app, &SetAppStatusRequest { status: 0 }).await
    }

    async fn app_error(&self, app: &str) -> MonitorResult<Option<VpnClientError>> {
        let res = self
            .client
            .get(self.app_url(app))
            .send()
            .await
            .map_err(|e| MonitorError::Visor(e.to_string()))?;

        if !res.status().is_success() {
            return Err(MonitorError::Visor(format!(
                "app {app} state returned status {}",
                res.status()
            )));
        }

        let state: AppStateResponse = res
            .json()
            .await
            .map_err(|e| MonitorError::Visor(format!("undecodable app state: {e}")))?;

        Ok(state
            .last_error
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .map(VpnClientError::from_app_error))
    }

    async fn connection_summaries(&self, app: &str) -> MonitorResult<Vec<ConnectionSummary>> {
        let url = format!("{}/connections", self.app_url(app));
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MonitorError::Visor(e.to_string()))?;

        if !res.status().is_success() {
            return Err(MonitorError::Visor(format!(
                "app {app} connections returned status {}",
                res.status()
            )));
        }

        res.json()
            .await
            .map_err(|e| MonitorError::Visor(format!("undecodable connection summary: {e}")))
    }
}
