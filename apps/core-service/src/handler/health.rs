//! `GET /health`
//!
//! ロードバランサーの死活監視用。プロセスが応答できれば `healthy` を返し、
//! 各メールチャネルへの疎通は確認しない（チャネル構成は `/internal/mail/channels`）。

use axum::Json;
use hackhub_shared::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}
