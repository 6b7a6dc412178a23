//! # Core Service ライブラリ
//!
//! メール配信のユースケース、HTTP ハンドラ、起動処理を公開する。
//! バイナリ（`main.rs`）と結合テストの両方から使う。

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
