//! # ユースケース層
//!
//! ハンドラから呼ばれるアプリケーションロジックを配置する。

pub mod mail;

pub use mail::{MailDispatcher, MailService, TemplateRenderer};
