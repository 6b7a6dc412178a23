//! # アプリケーション構築
//!
//! 設定からメールチャネル・ディスパッチャ・ルーターを組み立てる。
//! `main` と結合テストの両方から使う。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use hackhub_domain::mail::{ChannelKind, MailError};
use hackhub_infra::{
    MailChannel,
    mail::{GmailApiChannel, SendGridChannel, SmtpChannel},
};
use hackhub_shared::event_log::error::{category, kind};
use tower_http::trace::TraceLayer;

use crate::{
    config::MailConfig,
    handler::{
        MailState,
        get_channels,
        health_check,
        send_bulk_mail,
        send_hackathon_reminder,
        send_hackathon_update,
        send_mail,
        send_registration_confirmation,
        send_welcome,
    },
    usecase::{MailDispatcher, MailService, TemplateRenderer},
};

/// 設定から利用可能なチャネルを構築する
///
/// 認証情報がないチャネルは黙って除外する（debug ログのみ）。
/// 構築に失敗したチャネル（鍵ファイルが読めないなど）は警告を出して除外する。
pub async fn build_mail_channels(config: &MailConfig) -> Vec<Arc<dyn MailChannel>> {
    let mut channels: Vec<Arc<dyn MailChannel>> = Vec::new();

    match &config.smtp {
        Some(settings) => match SmtpChannel::new(settings, config.sender.clone()) {
            Ok(channel) => channels.push(Arc::new(channel)),
            Err(e) => exclude(ChannelKind::Smtp, &e),
        },
        None => tracing::debug!(channel = %ChannelKind::Smtp, "認証情報がないため除外"),
    }

    match &config.sendgrid {
        Some(settings) => match SendGridChannel::new(
            settings.clone(),
            config.sender.clone(),
            config.http_timeout,
        ) {
            Ok(channel) => channels.push(Arc::new(channel)),
            Err(e) => exclude(ChannelKind::SendGrid, &e),
        },
        None => tracing::debug!(channel = %ChannelKind::SendGrid, "認証情報がないため除外"),
    }

    match &config.gmail {
        Some(settings) => {
            match GmailApiChannel::from_settings(settings, config.sender.clone(), config.http_timeout)
                .await
            {
                Ok(channel) => channels.push(Arc::new(channel)),
                Err(e) => exclude(ChannelKind::GmailApi, &e),
            }
        }
        None => tracing::debug!(channel = %ChannelKind::GmailApi, "認証情報がないため除外"),
    }

    channels
}

fn exclude(channel: ChannelKind, error: &MailError) {
    tracing::warn!(
        error.category = category::CONFIGURATION,
        error.kind = kind::CREDENTIALS,
        channel = %channel,
        error = %error,
        "チャネルを初期化できないため除外します"
    );
}

/// 設定からメールサービスを構築する
///
/// # Errors
///
/// 利用可能なチャネルがない場合、またはテンプレートの登録に失敗した場合。
pub async fn build_mail_service(config: &MailConfig) -> Result<MailService, MailError> {
    let channels = build_mail_channels(config).await;
    let dispatcher = MailDispatcher::new(config.active_channel, channels)?;
    let renderer = TemplateRenderer::new()?;

    Ok(MailService::new(
        Arc::new(dispatcher),
        renderer,
        config.base_url.clone(),
    ))
}

/// ルーターを構築する
pub fn build_router(state: Arc<MailState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/internal/mail/channels", get(get_channels))
        .route("/internal/mail/send", post(send_mail))
        .route("/internal/mail/bulk", post(send_bulk_mail))
        .route("/internal/mail/welcome", post(send_welcome))
        .route(
            "/internal/mail/registration-confirmation",
            post(send_registration_confirmation),
        )
        .route(
            "/internal/mail/hackathon-reminder",
            post(send_hackathon_reminder),
        )
        .route(
            "/internal/mail/hackathon-update",
            post(send_hackathon_update),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
