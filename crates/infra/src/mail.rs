//! # メールチャネル
//!
//! メール送信の具体的な手段を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailChannel` trait で送信手段を抽象化
//! - **3 つの実装**: SMTP（lettre）、SendGrid（HTTP API）、Gmail API（サービスアカウント）
//! - **フォールバックは上位層**: 各チャネルは 1 回だけ送信を試み、結果を返すのみ

mod gmail;
mod mime;
mod sendgrid;
mod smtp;

use async_trait::async_trait;
pub use gmail::{GmailApiChannel, GmailSettings, ServiceAccountKey};
use hackhub_domain::mail::{ChannelKind, MailError, OutgoingEmail, SentReceipt};
pub use sendgrid::{SendGridChannel, SendGridSettings};
pub use smtp::{SmtpChannel, SmtpSettings};

/// メールチャネルトレイト
///
/// 1 回の呼び出しで 1 回だけ送信を試みる。リトライやフォールバックは行わない。
/// どのような失敗もパニックではなく `Err` で返すこと。
#[async_trait]
pub trait MailChannel: Send + Sync {
    /// チャネル種別
    fn kind(&self) -> ChannelKind;

    /// メールを送信する
    async fn send_email(&self, email: &OutgoingEmail) -> Result<SentReceipt, MailError>;
}
