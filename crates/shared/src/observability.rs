//! # ログ出力の初期化
//!
//! `tracing-subscriber` の初期化を `observability` feature の裏に置く。
//! ライブラリクレートは `tracing` のマクロだけを使い、subscriber は
//! バイナリの `main` で 1 度だけ組み立てる。
//!
//! ## 環境変数
//!
//! - `LOG_FORMAT`: `json`（本番）または `pretty`（開発、既定）
//! - `RUST_LOG`: フィルタ。未設定なら [`DEFAULT_LOG_FILTER`]
//!
//! メール配信では `mail.send` スパンの中でチャネルごとの試行が `warn` として、
//! 配信結果が [`log_business_event!`](crate::log_business_event) として出力される。

use std::str::FromStr;

/// `RUST_LOG` 未設定時のフィルタ
pub const DEFAULT_LOG_FILTER: &str = "info,hackhub=debug";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// 1 行 1 JSON。フィールドはトップレベルに展開する
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// `LOG_FORMAT` の値を解釈する
    ///
    /// 未設定・空文字は既定値。未知の値も既定値に倒し、subscriber が
    /// まだないので stderr に直接警告する。
    pub fn from_env_value(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::default();
        };
        Self::from_str(value).unwrap_or_else(|_| {
            eprintln!("WARNING: LOG_FORMAT={value:?} は不明な値です。pretty で出力します");
            Self::default()
        })
    }
}

/// subscriber の組み立てに使う設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub service_name: String,
    pub log_format:   LogFormat,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
        }
    }

    pub fn from_env(service_name: impl Into<String>) -> Self {
        let format = std::env::var("LOG_FORMAT").ok();
        Self::new(service_name, LogFormat::from_env_value(format.as_deref()))
    }
}

/// グローバル subscriber を登録する
///
/// # Errors
///
/// すでに subscriber が登録されている場合。
#[cfg(feature = "observability")]
pub fn init_tracing(
    config: &TracingConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::{EnvFilter, Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let output = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        log_format = %config.log_format,
        "ログ出力を初期化しました"
    );
    Ok(())
}
