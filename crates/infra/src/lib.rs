//! # HackHub インフラ層
//!
//! 外部のメール配信サービスとの通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **メールチャネル**: SMTP / SendGrid / Gmail API クライアントの具体実装
//! - **テスト用モック**: `test-utils` feature でインメモリのチャネルを提供
//!
//! ## 依存関係
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`mail`] - `MailChannel` トレイトと各チャネル実装
//! - `mock` - テスト用モックチャネル（`test-utils` feature）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use hackhub_infra::mail::{MailChannel, SendGridChannel, SendGridSettings};
//!
//! let channel = SendGridChannel::new(settings, sender, timeout)?;
//! let receipt = channel.send_email(&email).await?;
//! ```

pub mod mail;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use mail::MailChannel;
