//! # Core Service エラー定義
//!
//! Core Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//! 配信失敗はエラーではなく `DispatchResult` として 200 で返すため、ここには現れない。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hackhub_domain::MailError;
use hackhub_shared::{
    ErrorResponse,
    event_log::error::{category, kind},
};
use thiserror::Error;

/// Core Service で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
    /// 不正なリクエスト（宛先が空、未知の本文種別など）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// メール処理のエラー（テンプレートレンダリング失敗など）
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let body = match &self {
            CoreError::BadRequest(msg) => ErrorResponse::validation_error(msg.clone()),
            CoreError::Mail(MailError::Template(msg)) => {
                tracing::error!(
                    error.category = category::INTERNAL,
                    error.kind = kind::MAIL_TEMPLATE,
                    "テンプレートレンダリングに失敗: {}",
                    msg
                );
                ErrorResponse::new(
                    "template-error",
                    "Template Error",
                    500,
                    "メール本文の生成に失敗しました",
                )
            }
            CoreError::Mail(e) => {
                tracing::error!("メール処理の内部エラー: {}", e);
                ErrorResponse::internal_error()
            }
        };

        let status = StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}
