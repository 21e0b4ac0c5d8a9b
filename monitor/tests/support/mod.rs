//! テスト共通ヘルパー
//!
//! 鍵ごとの結果をスクリプトできる偽visorと、テスト用APIサーバーの起動

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vpn_monitor::visor::{ConnectionSummary, TransportId, Visor, VpnClientError};
use vpn_monitor::AppState;
use vpn_monitor_common::error::{MonitorError, MonitorResult};
use vpn_monitor_common::types::PublicKey;

/// テスト用の決定的な公開鍵を生成する
pub fn pk(n: u8) -> PublicKey {
    format!("02{:064x}", n).parse().unwrap()
}

/// 1台分のスクリプトされたプローブ結果
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// トランスポートもセッションも成功
    Healthy {
        /// 接続サマリーが報告するレイテンシ（ナノ秒）
        latency_ns: u64,
    },
    /// トランスポート確立に失敗
    ConnectRefused,
    /// トランスポートは張れるがセッションがエラーで終わる
    AppError(VpnClientError),
}

/// 鍵ごとの結果をスクリプトできる偽visor
///
/// スクリプトされていない鍵はHealthy扱い。`opened_keys`でどの鍵に
/// トランスポートを張ろうとしたか（＝プローブ回数）を検証できる。
#[derive(Default)]
pub struct ScriptedVisor {
    outcomes: HashMap<PublicKey, ScriptedOutcome>,
    target: Mutex<Option<PublicKey>>,
    opened: Mutex<Vec<PublicKey>>,
}

impl ScriptedVisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcome(mut self, key: PublicKey, outcome: ScriptedOutcome) -> Self {
        self.outcomes.insert(key, outcome);
        self
    }

    pub fn opened_keys(&self) -> Vec<PublicKey> {
        self.opened.lock().unwrap().clone()
    }

    fn outcome_for(&self, key: &PublicKey) -> ScriptedOutcome {
        self.outcomes
            .get(key)
            .cloned()
            .unwrap_or(ScriptedOutcome::Healthy { latency_ns: 0 })
    }

    fn current_outcome(&self) -> ScriptedOutcome {
        let target = self.target.lock().unwrap().clone();
        match target {
            Some(key) => self.outcome_for(&key),
            None => ScriptedOutcome::Healthy { latency_ns: 0 },
        }
    }
}

impl Visor for ScriptedVisor {
    async fn open_transport(
        &self,
        remote: &PublicKey,
        _timeout: Duration,
    ) -> MonitorResult<TransportId> {
        self.opened.lock().unwrap().push(remote.clone());
        match self.outcome_for(remote) {
            ScriptedOutcome::ConnectRefused => {
                Err(MonitorError::Transport("connection refused".to_string()))
            }
            _ => Ok(TransportId(format!("tp-{}", &remote.as_hex()[..8]))),
        }
    }

    async fn close_transport(&self, _id: &TransportId) -> MonitorResult<()> {
        Ok(())
    }

    async fn set_app_target(&self, _app: &str, server: &PublicKey) -> MonitorResult<()> {
        *self.target.lock().unwrap() = Some(server.clone());
        Ok(())
    }

    async fn start_app(&self, _app: &str) -> MonitorResult<()> {
        Ok(())
    }

    async fn stop_app(&self, _app: &str) -> MonitorResult<()> {
        Ok(())
    }

    async fn app_error(&self, _app: &str) -> MonitorResult<Option<VpnClientError>> {
        match self.current_outcome() {
            ScriptedOutcome::AppError(err) => Ok(Some(err)),
            _ => Ok(None),
        }
    }

    async fn connection_summaries(&self, _app: &str) -> MonitorResult<Vec<ConnectionSummary>> {
        match self.current_outcome() {
            ScriptedOutcome::Healthy { latency_ns } => {
                Ok(vec![ConnectionSummary { latency_ns }])
            }
            _ => Ok(vec![]),
        }
    }
}

/// 現在のスレッドが出すtracingログをキャプチャする
///
/// ガードが生きている間だけ有効。ログ語彙のアサーションに使う。
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

impl LogCapture {
    /// キャプチャを開始する
    #[allow(dead_code)]
    pub fn start() -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::fmt()
            .with_writer(LogWriter(buffer.clone()))
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);
        Self { buffer, _guard }
    }

    /// ここまでにキャプチャした出力
    #[allow(dead_code)]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

#[derive(Clone)]
struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// テスト用のAPIサーバーを起動してアドレスを返す
#[allow(dead_code)]
pub async fn spawn_app(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().unwrap();

    let app = vpn_monitor::api::create_app(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}
