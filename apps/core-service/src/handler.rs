//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、送信ロジックはユースケース層に委譲

pub mod health;
pub mod mail;

pub use health::health_check;
pub use mail::{
    MailState,
    get_channels,
    send_bulk_mail,
    send_hackathon_reminder,
    send_hackathon_update,
    send_mail,
    send_registration_confirmation,
    send_welcome,
};
