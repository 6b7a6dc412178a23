//! # 配信結果
//!
//! 論理的な送信 1 回分の結果を表す。永続化はせず、呼び出し元に同期的に返す。

use std::fmt;

use serde::{Serialize, Serializer};

use super::{ChannelKind, ContentKind, MailError, OutgoingEmail, SentReceipt};

/// 配信ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DispatchStatus {
    /// いずれかのチャネルで送信できた
    Sent,
    /// 送信できなかった
    Failed,
}

/// 配信結果のタグ
///
/// 成功時は送信に使ったチャネル、全チャネル失敗時は `all_failed`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchSource {
    Channel(ChannelKind),
    AllFailed,
}

impl fmt::Display for DispatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(kind) => write!(f, "{kind}"),
            Self::AllFailed => f.write_str("all_failed"),
        }
    }
}

impl Serialize for DispatchSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 配信試行の記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelAttempt {
    pub channel: ChannelKind,
    /// 失敗時のエラー文言（成功時は `None`）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:   Option<String>,
}

impl ChannelAttempt {
    pub fn succeeded(channel: ChannelKind) -> Self {
        Self {
            channel,
            error: None,
        }
    }

    pub fn failed(channel: ChannelKind, error: impl Into<String>) -> Self {
        Self {
            channel,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// 配信結果
///
/// 生成後は変更しない。`attempts` は試行したチャネルを試行順に保持し、
/// 同じチャネルが 2 回現れることはない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub recipient:    String,
    pub subject:      String,
    #[serde(skip_serializing)]
    pub body:         String,
    pub content_kind: ContentKind,
    pub channel:      DispatchSource,
    pub status:       DispatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id:   Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:        Option<String>,
    pub attempts:     Vec<ChannelAttempt>,
}

impl DispatchResult {
    /// 送信成功の結果を生成する
    pub fn sent(
        email: &OutgoingEmail,
        channel: ChannelKind,
        receipt: SentReceipt,
        attempts: Vec<ChannelAttempt>,
    ) -> Self {
        Self {
            recipient: email.recipient.clone(),
            subject: email.subject.clone(),
            body: email.body.clone(),
            content_kind: email.content_kind,
            channel: DispatchSource::Channel(channel),
            status: DispatchStatus::Sent,
            message_id: receipt.message_id,
            error: None,
            attempts,
        }
    }

    /// 全チャネル失敗の結果を生成する
    ///
    /// エラー文言には各チャネルのエラーを試行順に並べる。
    pub fn all_failed(email: &OutgoingEmail, attempts: Vec<ChannelAttempt>) -> Self {
        let details = attempts
            .iter()
            .map(|attempt| {
                format!(
                    "{}: {}",
                    attempt.channel,
                    attempt.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect::<Vec<_>>()
            .join("; ");
        let error = MailError::AllChannelsFailed {
            recipient: email.recipient.clone(),
            details,
        };

        Self {
            recipient: email.recipient.clone(),
            subject: email.subject.clone(),
            body: email.body.clone(),
            content_kind: email.content_kind,
            channel: DispatchSource::AllFailed,
            status: DispatchStatus::Failed,
            message_id: None,
            error: Some(error.to_string()),
            attempts,
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == DispatchStatus::Sent
    }

    /// 失敗した試行の数
    pub fn failed_attempts(&self) -> usize {
        self.attempts.iter().filter(|a| !a.is_success()).count()
    }
}
