//! # メールハンドラ
//!
//! 他サービスから呼ばれるメール送信の内部 API を提供する。
//!
//! ## エンドポイント
//!
//! - `GET /internal/mail/channels` - アクティブチャネルとフォールバック候補
//! - `POST /internal/mail/send` - 任意の件名・本文を 1 宛先に送信
//! - `POST /internal/mail/bulk` - 任意の件名・本文を複数宛先に送信
//! - `POST /internal/mail/welcome` - ウェルカムメール
//! - `POST /internal/mail/registration-confirmation` - 参加登録確認メール
//! - `POST /internal/mail/hackathon-reminder` - 開催前リマインダー（一斉送信）
//! - `POST /internal/mail/hackathon-update` - 主催者からのお知らせ（一斉送信）
//!
//! 配信に失敗しても 200 を返し、結果の `status` が `failed` になる。

use std::{str::FromStr, sync::Arc};

use axum::{Json, extract::State};
use hackhub_domain::mail::{
    ChannelKind,
    ContentKind,
    DispatchResult,
    HackathonSummary,
    MailTemplate,
};
use hackhub_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{error::CoreError, usecase::MailService};

/// メール API の共有状態
pub struct MailState {
    pub service: MailService,
}

// --- リクエスト/レスポンス型 ---

#[derive(Debug, Deserialize)]
pub struct SendMailRequest {
    pub to:           String,
    pub subject:      String,
    pub body:         String,
    /// `text/html`（デフォルト）または `text/plain`
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkMailRequest {
    pub recipients:   Vec<String>,
    pub subject:      String,
    pub body:         String,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WelcomeMailRequest {
    pub to:        String,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationConfirmationRequest {
    pub to:        String,
    pub user_name: String,
    pub hackathon: HackathonSummary,
}

#[derive(Debug, Deserialize)]
pub struct HackathonReminderRequest {
    pub recipients: Vec<String>,
    /// 宛名（一斉送信なので共通）
    pub user_name:  String,
    pub hackathon:  HackathonSummary,
}

#[derive(Debug, Deserialize)]
pub struct HackathonUpdateRequest {
    pub recipients: Vec<String>,
    pub user_name:  String,
    pub hackathon:  HackathonSummary,
    pub message:    String,
}

#[derive(Debug, Serialize)]
pub struct ChannelsResponse {
    pub active:    ChannelKind,
    pub fallbacks: Vec<ChannelKind>,
}

type DispatchResponse = Result<Json<ApiResponse<DispatchResult>>, CoreError>;
type BulkDispatchResponse = Result<Json<ApiResponse<Vec<DispatchResult>>>, CoreError>;

// --- バリデーション ---

fn require_recipient(to: &str) -> Result<&str, CoreError> {
    let to = to.trim();
    if to.is_empty() {
        return Err(CoreError::BadRequest("宛先が空です".to_string()));
    }
    Ok(to)
}

fn require_recipients(recipients: &[String]) -> Result<Vec<String>, CoreError> {
    if recipients.is_empty() {
        return Err(CoreError::BadRequest("recipients が空です".to_string()));
    }
    recipients
        .iter()
        .map(|r| require_recipient(r).map(str::to_string))
        .collect()
}

fn parse_content_kind(content_type: Option<&str>) -> Result<ContentKind, CoreError> {
    match content_type {
        None => Ok(ContentKind::default()),
        Some(value) => ContentKind::from_str(value.trim())
            .map_err(|_| CoreError::BadRequest(format!("未知の content_type です: {value}"))),
    }
}

// --- ハンドラ ---

/// GET /internal/mail/channels
pub async fn get_channels(State(state): State<Arc<MailState>>) -> Json<ApiResponse<ChannelsResponse>> {
    let dispatcher = state.service.dispatcher();
    Json(ApiResponse::new(ChannelsResponse {
        active:    dispatcher.active_channel(),
        fallbacks: dispatcher.fallback_channels(),
    }))
}

/// POST /internal/mail/send
pub async fn send_mail(
    State(state): State<Arc<MailState>>,
    Json(req): Json<SendMailRequest>,
) -> DispatchResponse {
    let to = require_recipient(&req.to)?;
    let content_kind = parse_content_kind(req.content_type.as_deref())?;

    let result = state
        .service
        .dispatcher()
        .send(to, &req.subject, &req.body, content_kind)
        .await;

    Ok(Json(ApiResponse::new(result)))
}

/// POST /internal/mail/bulk
pub async fn send_bulk_mail(
    State(state): State<Arc<MailState>>,
    Json(req): Json<BulkMailRequest>,
) -> BulkDispatchResponse {
    let recipients = require_recipients(&req.recipients)?;
    let content_kind = parse_content_kind(req.content_type.as_deref())?;

    let results = state
        .service
        .dispatcher()
        .send_bulk(&recipients, &req.subject, &req.body, content_kind)
        .await;

    Ok(Json(ApiResponse::new(results)))
}

/// POST /internal/mail/welcome
pub async fn send_welcome(
    State(state): State<Arc<MailState>>,
    Json(req): Json<WelcomeMailRequest>,
) -> DispatchResponse {
    let to = require_recipient(&req.to)?;
    let template = MailTemplate::Welcome {
        user_name: req.user_name,
    };

    let result = state.service.notify(to, &template).await?;
    Ok(Json(ApiResponse::new(result)))
}

/// POST /internal/mail/registration-confirmation
pub async fn send_registration_confirmation(
    State(state): State<Arc<MailState>>,
    Json(req): Json<RegistrationConfirmationRequest>,
) -> DispatchResponse {
    let to = require_recipient(&req.to)?;
    let template = MailTemplate::RegistrationConfirmation {
        user_name: req.user_name,
        hackathon: req.hackathon,
    };

    let result = state.service.notify(to, &template).await?;
    Ok(Json(ApiResponse::new(result)))
}

/// POST /internal/mail/hackathon-reminder
pub async fn send_hackathon_reminder(
    State(state): State<Arc<MailState>>,
    Json(req): Json<HackathonReminderRequest>,
) -> BulkDispatchResponse {
    let recipients = require_recipients(&req.recipients)?;
    let template = MailTemplate::HackathonReminder {
        user_name: req.user_name,
        hackathon: req.hackathon,
    };

    let results = state.service.notify_bulk(&recipients, &template).await?;
    Ok(Json(ApiResponse::new(results)))
}

/// POST /internal/mail/hackathon-update
pub async fn send_hackathon_update(
    State(state): State<Arc<MailState>>,
    Json(req): Json<HackathonUpdateRequest>,
) -> BulkDispatchResponse {
    let recipients = require_recipients(&req.recipients)?;
    let template = MailTemplate::HackathonUpdate {
        user_name: req.user_name,
        hackathon: req.hackathon,
        message:   req.message,
    };

    let results = state.service.notify_bulk(&recipients, &template).await?;
    Ok(Json(ApiResponse::new(results)))
}
