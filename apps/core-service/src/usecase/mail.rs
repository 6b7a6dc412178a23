//! # メール配信ユースケース
//!
//! ## モジュール構成
//!
//! - [`dispatcher`] - フォールバック付きのマルチチャネル送信
//! - [`template_renderer`] - tera テンプレートエンジンによる定型メール生成
//! - [`service`] - テンプレートレンダリング + 送信の統合サービス

pub mod dispatcher;
pub mod service;
pub mod template_renderer;

pub use dispatcher::{BULK_CONCURRENCY, MailDispatcher};
pub use service::MailService;
pub use template_renderer::{RenderedEmail, TemplateRenderer};
