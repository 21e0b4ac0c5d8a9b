//! VPN monitor 共通ライブラリ
//!
//! monitorクレートが使う型定義・設定構造体・エラー型

#![warn(missing_docs)]

/// 設定構造体
pub mod config;

/// エラー型定義
pub mod error;

/// 共通型定義
pub mod types;
