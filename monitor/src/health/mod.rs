//! 死活監視・登録解除ループ
//!
//! サービスディスカバリからRosterを取得し、全VPNサーバーを逐次プローブし、
//! 死亡判定された部分集合の登録解除を依頼する。これを1周期として設定間隔で
//! 繰り返すバックグラウンドループ。
//!
//! プローブの並行実行は意図的に行わない。visorセッションコンテキストは
//! 1つしかなく、同時プローブは接続・セッション状態を曖昧にし、競合由来の
//! 偽陰性やレイテンシの歪みを生むため。

pub mod prober;

pub use prober::{ProbeFailure, ProbeTimings, Prober, Verdict};

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use vpn_monitor_common::types::PublicKey;

use crate::discovery::ServiceDiscoveryClient;
use crate::shutdown::ShutdownController;
use crate::visor::Visor;

/// 1周期の結果サマリー
///
/// ログ出力にのみ使われ、周期をまたいで保持されない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// 生存判定されたVPNサーバー数
    pub online: usize,
    /// 死亡判定されたVPNサーバーの公開鍵（当該周期のRosterの部分集合）
    pub dead: Vec<PublicKey>,
}

/// VPN死活監視ループ
pub struct VpnMonitor<V> {
    prober: Prober<V>,
    discovery: ServiceDiscoveryClient,
    sleep_interval: Duration,
}

impl<V: Visor> VpnMonitor<V> {
    /// 新しい監視ループを作成
    pub fn new(
        visor: Arc<V>,
        discovery: ServiceDiscoveryClient,
        timings: ProbeTimings,
        sleep_interval: Duration,
    ) -> Self {
        Self {
            prober: Prober::new(visor, timings),
            discovery,
            sleep_interval,
        }
    }

    /// バックグラウンドで監視を開始
    pub fn start(self, shutdown: ShutdownController) {
        tokio::spawn(async move {
            self.run(shutdown).await;
        });
    }

    /// 監視ループ本体
    ///
    /// キャンセルは周期の開始前とスリープ中にのみ観測する。実行中の
    /// プローブは必ず完走する。
    pub async fn run(&self, shutdown: ShutdownController) {
        info!(
            interval_secs = self.sleep_interval.as_secs(),
            "VPN monitor loop started"
        );

        loop {
            if shutdown.is_shutdown_requested() {
                break;
            }

            self.run_cycle().await;

            tokio::select! {
                _ = shutdown.wait() => break,
                _ = tokio::time::sleep(self.sleep_interval) => {}
            }
        }

        info!("VPN monitor loop stopped");
    }

    /// 1周期を実行する
    ///
    /// Roster取得失敗と登録解除失敗はこの周期を縮退させるだけで、ループは
    /// 決して止めない。完了ログは縮退した周期でも必ず1回出す。
    pub async fn run_cycle(&self) -> CycleSummary {
        info!("VPN Deregistration started.");

        let summary = self.probe_roster().await;

        info!(
            dead = summary.dead.len(),
            keys = ?summary.dead,
            "VPN Deregistration completed."
        );
        summary
    }

    /// Rosterを取得して全件プローブし、死亡分の登録解除を依頼する
    async fn probe_roster(&self) -> CycleSummary {
        let keys = match self.discovery.vpn_keys().await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(error = %err, "Error while fetching vpns");
                return CycleSummary::default();
            }
        };

        let mut summary = CycleSummary::default();

        if keys.is_empty() {
            warn!("No VPN keys found");
            return summary;
        }

        for key in &keys {
            match self.prober.probe(key).await {
                Verdict::Alive { .. } => summary.online += 1,
                Verdict::Dead { cause } => {
                    info!(key = %key, cause = %cause, "VPN judged dead");
                    summary.dead.push(key.clone());
                }
            }
        }
        info!(count = summary.online, "VPNs online.");

        if !summary.dead.is_empty() {
            match self.discovery.deregister_vpns(&summary.dead).await {
                Ok(()) => info!("Deregister request sent to service discovery"),
                Err(err) => warn!(error = %err, "Failed to deregister dead VPNs"),
            }
        }
        summary
    }
}
