//! REST APIハンドラー
//!
//! 公開するのは `/health` のみ。ビルド情報と起動時刻を返すだけで、
//! 状態の変更や監視ループへの介入は行わない。

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// ビルドメタデータ
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    /// Cargoパッケージバージョン
    pub version: String,
    /// ビルド時に埋め込まれたコミットハッシュ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl BuildInfo {
    /// 現在のバイナリのビルド情報を返す
    pub fn get() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("VPN_MONITOR_COMMIT").map(str::to_string),
        }
    }
}

/// GET /health のレスポンス
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResponse {
    /// ビルド情報
    pub build_info: BuildInfo,
    /// プロセス起動時刻
    pub started_at: DateTime<Utc>,
}

/// ルーターを構築する
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        build_info: BuildInfo::get(),
        started_at: state.started_at,
    })
}
