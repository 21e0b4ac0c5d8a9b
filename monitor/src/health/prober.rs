//! プローブ実行器（生死分類ステートマシン）
//!
//! 接続待ち → セッション待ち → 分類(Alive|Dead) の3段階で1台のVPNサーバーを
//! 判定する。レジストリに載っているかではなく、実際にdmsgトランスポートを
//! 張ってvpn-clientセッションを試行することで生存を運用的に証明する。

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use vpn_monitor_common::error::MonitorError;
use vpn_monitor_common::types::PublicKey;

use crate::visor::{ConnectionSummary, Visor, VpnClientError, VPN_CLIENT_APP};

/// プローブの各待機時間
///
/// 本番デフォルトは固定値。テストはゼロ値を注入して即座に回す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTimings {
    /// トランスポート確立のタイムアウト
    pub connect_timeout: Duration,
    /// アプリ起動後、ハンドシェイクの完了/失敗を待つ時間
    pub handshake_settle: Duration,
    /// サマリー取得からアプリ停止までの待機
    pub summary_settle: Duration,
    /// セッション試行後、結果検査前の待機
    pub post_session_settle: Duration,
    /// トランスポート解放後、次のプローブとのリソース競合を避ける待機
    pub teardown_settle: Duration,
}

impl Default for ProbeTimings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            handshake_settle: Duration::from_secs(15),
            summary_settle: Duration::from_secs(2),
            post_session_settle: Duration::from_secs(4),
            teardown_settle: Duration::from_secs(2),
        }
    }
}

impl ProbeTimings {
    /// 全待機ゼロ（テスト用）
    pub fn zero() -> Self {
        Self {
            connect_timeout: Duration::ZERO,
            handshake_settle: Duration::ZERO,
            summary_settle: Duration::ZERO,
            post_session_settle: Duration::ZERO,
            teardown_settle: Duration::ZERO,
        }
    }
}

/// プローブ失敗の診断原因（閉じた分類）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    /// トランスポート確立失敗。セッションは試行されない
    #[error("connection failure: {0}")]
    Connection(String),
    /// vpn-clientセッションの致命的エラー
    #[error("session failure: {0}")]
    Session(VpnClientError),
    /// セッション操作中のvisor API障害
    #[error("visor failure: {0}")]
    Visor(String),
}

/// 1台のVPNサーバーに対する生死判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// 生存
    Alive {
        /// 接続サマリーが非ゼロのレイテンシを報告した場合のみ値を持つ。
        /// 判定には使わない（情報のみ）
        latency: Option<Duration>,
    },
    /// 死亡
    Dead {
        /// 診断用の失敗原因
        cause: ProbeFailure,
    },
}

impl Verdict {
    /// 生存判定かどうか
    pub fn is_alive(&self) -> bool {
        matches!(self, Verdict::Alive { .. })
    }
}

/// プローブ実行器
///
/// 共有visorセッションコンテキストへの参照と待機時間設定のみを持つ。
/// 周期をまたぐ状態は持たない（判定は毎回一から導出される）。
pub struct Prober<V> {
    visor: Arc<V>,
    timings: ProbeTimings,
}

impl<V: Visor> Prober<V> {
    /// 新しいプローブ実行器を作成
    pub fn new(visor: Arc<V>, timings: ProbeTimings) -> Self {
        Self { visor, timings }
    }

    /// 1台のVPNサーバーをプローブして判定を返す
    ///
    /// トランスポートは結果にかかわらず必ず解放する。解放失敗はログのみで、
    /// 既に決まった判定を覆さない。
    pub async fn probe(&self, key: &PublicKey) -> Verdict {
        let transport = match self
            .visor
            .open_transport(key, self.timings.connect_timeout)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to establish dmsg transport");
                return Verdict::Dead {
                    cause: ProbeFailure::Connection(err.to_string()),
                };
            }
        };
        info!(key = %key, transport = %transport, "Established dmsg transport");

        let outcome = self.run_vpn_client(key).await;
        tokio::time::sleep(self.timings.post_session_settle).await;

        let verdict = match outcome {
            Ok(summaries) => Verdict::Alive {
                latency: first_latency(&summaries),
            },
            Err(ProbeFailure::Session(err)) if err.is_benign() => {
                info!(key = %key, error = %err, "Vpn error on dmsg transport");
                Verdict::Alive { latency: None }
            }
            Err(cause) => {
                info!(key = %key, error = %cause, "Vpn error on dmsg transport");
                Verdict::Dead { cause }
            }
        };

        if let Err(err) = self.visor.close_transport(&transport).await {
            warn!(key = %key, transport = %transport, error = %err, "Error removing dmsg transport");
        }
        tokio::time::sleep(self.timings.teardown_settle).await;

        verdict
    }

    /// 確立済みトランスポート上で短命のvpn-clientセッションを実行する
    ///
    /// ハンドシェイクの完了/失敗は非同期に起きるため、起動後は無条件に
    /// 一定時間待ってから結果を検査する。
    async fn run_vpn_client(
        &self,
        key: &PublicKey,
    ) -> Result<Vec<ConnectionSummary>, ProbeFailure> {
        let visor_failure = |e: MonitorError| ProbeFailure::Visor(e.to_string());

        self.visor
            .set_app_target(VPN_CLIENT_APP, key)
            .await
            .map_err(visor_failure)?;
        self.visor
            .start_app(VPN_CLIENT_APP)
            .await
            .map_err(visor_failure)?;

        tokio::time::sleep(self.timings.handshake_settle).await;

        if let Some(err) = self
            .visor
            .app_error(VPN_CLIENT_APP)
            .await
            .map_err(visor_failure)?
        {
            return Err(ProbeFailure::Session(err));
        }

        let summaries = self
            .visor
            .connection_summaries(VPN_CLIENT_APP)
            .await
            .map_err(visor_failure)?;

        tokio::time::sleep(self.timings.summary_settle).await;

        self.visor
            .stop_app(VPN_CLIENT_APP)
            .await
            .map_err(visor_failure)?;

        Ok(summaries)
    }
}

/// 先頭サマリーのレイテンシを取り出す。ゼロは「未計測」として扱い、
/// 生死判定には影響しない
fn first_latency(summaries: &[ConnectionSummary]) -> Option<Duration> {
    summaries
        .first()
        .map(ConnectionSummary::latency)
        .filter(|latency| !latency.is_zero())
}
