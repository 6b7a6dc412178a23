//! # HackHub ドメイン層
//!
//! メール配信に関するドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **値オブジェクト**: チャネル種別・本文種別・配信結果は不変の値として扱う
//! - **外部依存なし**: SMTP や HTTP クライアントの詳細はインフラ層に閉じ込める
//!
//! ## 依存関係の方向
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`mail`] - メールチャネル、送信メッセージ、配信結果、テンプレートイベント
//!
//! ## 使用例
//!
//! ```rust
//! use hackhub_domain::mail::{ChannelKind, ContentKind};
//!
//! let channel: ChannelKind = "vendor_a_api".parse().unwrap();
//! assert_eq!(channel, ChannelKind::SendGrid);
//! assert_eq!(ContentKind::default().to_string(), "text/html");
//! ```

pub mod mail;

pub use mail::MailError;
