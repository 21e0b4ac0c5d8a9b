//! visorセッションコンテキスト
//!
//! プローブが接続を張るための長寿命ローカルネットワーク識別。起動時に
//! 一度だけ確立され、全プローブで共有される（並行アクセスはしない）。
//! 本番実装（[`RpcVisor`]）はローカルで稼働するvisorのHTTP APIを叩き、
//! テストでは[`Visor`]トレイトの偽実装を注入できる。

pub mod rpc;

pub use rpc::RpcVisor;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use vpn_monitor_common::error::MonitorResult;
use vpn_monitor_common::types::PublicKey;

/// プローブに使うvpn-clientアプリ名
///
/// visor側の制約で `-srv` を渡せるのはvpn-client / skysocks-clientのみの
/// ため、lite版のバイナリであってもこの名前で起動する。
pub const VPN_CLIENT_APP: &str = "vpn-client";

/// プローブ接続のトランスポート種別
pub const TRANSPORT_TYPE: &str = "dmsg";

/// visorが発行するトランスポートID
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransportId(pub String);

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// vpn-clientセッションの接続サマリー
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionSummary {
    /// 往復レイテンシ（ナノ秒）。未計測なら0
    #[serde(rename = "latency", default)]
    pub latency_ns: u64,
}

impl ConnectionSummary {
    /// レイテンシをDurationとして返す
    pub fn latency(&self) -> Duration {
        Duration::from_nanos(self.latency_ns)
    }
}

/// vpn-clientセッションの終端エラー（閉じた分類）
///
/// visorが返す生のエラー文字列はRPC境界で一度だけこの列挙型へ解析され、
/// 以降の分類ロジックは文字列比較を行わない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VpnClientError {
    /// 相手は中継専用のセットアップノード。到達性の証明になる良性エラー
    #[error("setup node")]
    SetupNode,
    /// 相手がセッションを許可しなかった。到達性の証明になる良性エラー
    #[error("not permitted")]
    NotPermitted,
    /// サーバーがオフラインを報告した
    #[error("server offline")]
    ServerOffline,
    /// その他のセッションエラー
    #[error("{0}")]
    Other(String),
}

impl VpnClientError {
    /// visorのアプリエラー文字列を解析する
    pub fn from_app_error(raw: &str) -> Self {
        match raw {
            "setup node" => VpnClientError::SetupNode,
            "not permitted" => VpnClientError::NotPermitted,
            "server offline" => VpnClientError::ServerOffline,
            other => VpnClientError::Other(other.to_string()),
        }
    }

    /// 到達性の証明となる良性エラーかどうか
    ///
    /// セットアップノードと許可拒否は「応答できる相手からの拒否」であり、
    /// 停止の兆候ではない。
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            VpnClientError::SetupNode | VpnClientError::NotPermitted
        )
    }
}

/// visorセッションコンテキストの操作
///
/// 監視ループとプローブ実行器だけが使い、常に逐次アクセスされる。
pub trait Visor: Send + Sync + 'static {
    /// 指定した公開鍵へdmsgトランスポートを確立する
    fn open_transport(
        &self,
        remote: &PublicKey,
        timeout: Duration,
    ) -> impl Future<Output = MonitorResult<TransportId>> + Send;

    /// トランスポートを解放する
    fn close_transport(
        &self,
        id: &TransportId,
    ) -> impl Future<Output = MonitorResult<()>> + Send;

    /// アプリの接続先サーバー公開鍵を設定する
    fn set_app_target(
        &self,
        app: &str,
        server: &PublicKey,
    ) -> impl Future<Output = MonitorResult<()>> + Send;

    /// アプリを起動する
    fn start_app(&self, app: &str) -> impl Future<Output = MonitorResult<()>> + Send;

    /// アプリを停止する
    fn stop_app(&self, app: &str) -> impl Future<Output = MonitorResult<()>> + Send;

    /// アプリの終端エラーを取得する（エラーなしなら`None`）
    fn app_error(
        &self,
        app: &str,
    ) -> impl Future<Output = MonitorResult<Option<VpnClientError>>> + Send;

    /// アプリの接続サマリー一覧を取得する
    fn connection_summaries(
        &self,
        app: &str,
    ) -> impl Future<Output = MonitorResult<Vec<ConnectionSummary>>> + Send;
}
