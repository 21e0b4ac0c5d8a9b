//! Skywire VPN Monitor
//!
//! サービスディスカバリに登録されたVPNサーバーの死活監視・登録解除サーバー

#![warn(missing_docs)]

/// REST APIハンドラー
pub mod api;

/// CLIインターフェース
pub mod cli;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// サービスディスカバリクライアント
pub mod discovery;

/// 死活監視・登録解除ループ
pub mod health;

/// ロギング初期化ユーティリティ
pub mod logging;

/// axumサーバー起動・シャットダウンハンドリング
pub mod server;

/// 協調シャットダウン制御
pub mod shutdown;

/// visorセッションコンテキスト
pub mod visor;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// プロセス起動時刻（/healthで返す）
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// 協調シャットダウンコントローラー
    pub shutdown: shutdown::ShutdownController,
}
