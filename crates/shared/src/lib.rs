//! # HackHub 共有ユーティリティ
//!
//! サービスとクレートをまたいで使う共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum への依存は持たない（HTTP 変換は各サービスの責務）
//! - トレーシング初期化は `observability` feature でのみ有効

pub mod error_response;
pub mod event_log;
pub mod observability;
pub mod response;

pub use error_response::ErrorResponse;
pub use response::{ApiResponse, HealthResponse, HealthStatus};
