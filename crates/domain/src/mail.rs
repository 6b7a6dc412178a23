//! # メール
//!
//! メール配信に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`ChannelKind`] | チャネル | メールを届ける具体的な手段（SMTP / SendGrid / Gmail API） |
//! | [`OutgoingEmail`] | 送信メッセージ | 宛先・件名・本文・本文種別の組 |
//! | [`ChannelAttempt`] | 配信試行 | 1 宛先に対する 1 チャネルでの 1 回の送信試行 |
//! | [`DispatchResult`] | 配信結果 | 1 宛先に対する論理的な送信 1 回分の結果 |
//! | [`MailTemplate`] | テンプレートイベント | ウェルカム・参加登録確認などの定型メール |
//!
//! ## 設計方針
//!
//! - **優先順位テーブル**: フォールバック順は [`ChannelKind::PRIORITY`] に明示する
//! - **失敗は値で返す**: 全チャネル失敗も [`DispatchResult`] として呼び出し元に返す

mod channel;
mod dispatch;
mod message;
mod template;

pub use channel::ChannelKind;
pub use dispatch::{ChannelAttempt, DispatchResult, DispatchSource, DispatchStatus};
pub use message::{ContentKind, OutgoingEmail, SenderIdentity, SentReceipt};
pub use template::{HackathonSummary, MailTemplate, MailTemplateKind};
use thiserror::Error;

/// メール配信エラー
#[derive(Debug, Error)]
pub enum MailError {
    /// 利用可能なチャネルがない、または設定値が不正
    ///
    /// 起動時（ディスパッチャ構築時）にのみ発生する。
    #[error("メール送信設定が不正です: {0}")]
    Configuration(String),

    /// 単一チャネルでの送信失敗
    ///
    /// ディスパッチャ内でフォールバックにより回復される。
    #[error("{channel} での送信に失敗: {message}")]
    ChannelSend {
        channel: ChannelKind,
        message: String,
    },

    /// 全チャネルでの送信失敗
    ///
    /// 例外としては伝播せず、失敗した [`DispatchResult`] のエラー文言になる。
    #[error("{recipient} 宛のメール送信がすべてのチャネルで失敗: {details}")]
    AllChannelsFailed { recipient: String, details: String },

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    Template(String),

    /// メールアドレスの形式が不正
    #[error("メールアドレスが不正です: {0}")]
    InvalidAddress(String),

    /// MIME メッセージの構築に失敗
    #[error("メッセージ構築に失敗: {0}")]
    MessageBuild(String),
}

impl MailError {
    /// チャネル送信エラーを生成する
    pub fn channel_send(channel: ChannelKind, message: impl Into<String>) -> Self {
        Self::ChannelSend {
            channel,
            message: message.into(),
        }
    }
}
