//! エラー型定義
//!
//! 統一エラー型（thiserror使用）

use thiserror::Error;

/// VPN monitor error type
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Http(String),

    /// Service discovery error
    #[error("Service discovery error: {0}")]
    Discovery(String),

    /// Deregistration rejected by service discovery
    #[error("Deregistration failed: status code {0}")]
    Deregistration(u16),

    /// Transport establishment error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Visor API error
    #[error("Visor API error: {0}")]
    Visor(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result型エイリアス
pub type MonitorResult<T> = Result<T, MonitorError>;
