//! # 成功レスポンスの共通形
//!
//! 内部 API の成功レスポンスは `{ "data": ... }` で包む。
//! ヘルスチェックだけはエンベロープを使わず、稼働状態とバージョンを直接返す。

use serde::{Deserialize, Serialize};

/// `{ "data": T }` エンベロープ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// サービスの稼働状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
}

/// `GET /health` のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status:  HealthStatus,
    /// パッケージのバージョン（`CARGO_PKG_VERSION`）
    pub version: String,
}

impl HealthResponse {
    pub fn healthy(version: impl Into<String>) -> Self {
        Self {
            status:  HealthStatus::Healthy,
            version: version.into(),
        }
    }
}
