//! SendGrid チャネル実装
//!
//! SendGrid v3 Mail Send API（`POST /v3/mail/send`）を reqwest で呼び出す。
//! 成功時は 202 Accepted が返り、`X-Message-Id` ヘッダーにメッセージ ID が入る。
//! 2xx 以外はすべて失敗として扱う。

use std::time::Duration;

use async_trait::async_trait;
use hackhub_domain::mail::{ChannelKind, MailError, OutgoingEmail, SenderIdentity, SentReceipt};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

use super::MailChannel;

/// SendGrid 接続設定
#[derive(Debug, Clone)]
pub struct SendGridSettings {
    pub api_key:  Secret<String>,
    /// API のベース URL（テストではモックサーバーを指す）
    pub base_url: String,
}

/// SendGrid チャネル
pub struct SendGridChannel {
    client:   reqwest::Client,
    settings: SendGridSettings,
    sender:   SenderIdentity,
}

impl SendGridChannel {
    /// 新しい SendGrid チャネルを作成
    ///
    /// `timeout` はリクエスト全体のタイムアウト。
    pub fn new(
        settings: SendGridSettings,
        sender: SenderIdentity,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MailError::Configuration(format!("HTTP クライアント構築失敗: {e}")))?;

        Ok(Self {
            client,
            settings,
            sender,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v3/mail/send", self.settings.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from:             EmailAddress<'a>,
    subject:          &'a str,
    content:          [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [EmailAddress<'a>; 1],
}

#[derive(Debug, Serialize)]
struct EmailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name:  Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind:  &'static str,
    value: &'a str,
}

impl<'a> SendRequest<'a> {
    fn new(sender: &'a SenderIdentity, email: &'a OutgoingEmail) -> Self {
        let name = (!sender.display_name.is_empty()).then_some(sender.display_name.as_str());
        Self {
            personalizations: [Personalization {
                to: [EmailAddress {
                    email: &email.recipient,
                    name:  None,
                }],
            }],
            from: EmailAddress {
                email: &sender.address,
                name,
            },
            subject: &email.subject,
            content: [Content {
                kind:  email.content_kind.into(),
                value: &email.body,
            }],
        }
    }
}

#[async_trait]
impl MailChannel for SendGridChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::SendGrid
    }

    async fn send_email(&self, email: &OutgoingEmail) -> Result<SentReceipt, MailError> {
        let request = SendRequest::new(&self.sender, email);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.settings.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                MailError::channel_send(ChannelKind::SendGrid, format!("リクエスト失敗: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::channel_send(
                ChannelKind::SendGrid,
                format!("予期しないステータス {status}: {body}"),
            ));
        }

        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(SentReceipt { message_id })
    }
}
