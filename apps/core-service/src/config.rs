//! # Core Service 設定
//!
//! 環境変数から Core Service サーバーとメール配信の設定を読み込む。
//!
//! 認証情報が揃っていないチャネルは `None` になり、ディスパッチャの候補から外れる。
//! 値の形式が不正な場合（未知のチャネル名、数値でないポートなど）は起動時エラーとする。

use std::{path::PathBuf, str::FromStr, time::Duration};

use hackhub_domain::mail::{ChannelKind, SenderIdentity};
use hackhub_infra::mail::{GmailSettings, SendGridSettings, SmtpSettings};
use secrecy::Secret;
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error)]
#[error("環境変数 {key} の値が不正です: {value:?}")]
pub struct ConfigError {
    pub key:   &'static str,
    pub value: String,
}

/// Core Service サーバーの設定
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    pub mail: MailConfig,
}

/// メール配信の設定
///
/// `MAIL_ACTIVE_CHANNEL` でアクティブチャネルを選ぶ:
/// - `smtp`: SMTP サーバー経由で送信
/// - `sendgrid`（別名 `vendor_a_api`）: SendGrid v3 API
/// - `gmail_api`（別名 `vendor_b_api`）: Gmail API（サービスアカウント）
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub active_channel: ChannelKind,
    pub sender:         SenderIdentity,
    /// フロントエンド URL（メール内リンク用）
    pub base_url:       String,
    /// HTTP チャネル（SendGrid / Gmail API）のリクエストタイムアウト
    pub http_timeout:   Duration,
    pub smtp:           Option<SmtpSettings>,
    pub sendgrid:       Option<SendGridSettings>,
    pub gmail:          Option<GmailSettings>,
}

impl CoreConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を読み込む
    ///
    /// 空文字列は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Lookup(lookup);

        Ok(Self {
            host: env.or("CORE_HOST", "0.0.0.0"),
            port: env.parse_or("CORE_PORT", 8000)?,
            mail: MailConfig::from_lookup(&env)?,
        })
    }
}

impl MailConfig {
    fn from_lookup<F: Fn(&str) -> Option<String>>(env: &Lookup<F>) -> Result<Self, ConfigError> {
        let active_channel = env.parse_or("MAIL_ACTIVE_CHANNEL", ChannelKind::Smtp)?;
        let sender = SenderIdentity::new(
            env.or("MAIL_FROM_ADDRESS", "noreply@hackhub.example.com"),
            env.or("MAIL_FROM_NAME", "HackHub Team"),
        );
        let http_timeout = Duration::from_millis(env.parse_or("MAIL_HTTP_TIMEOUT_MS", 10_000)?);

        let smtp = match (env.get("SMTP_USERNAME"), env.get("SMTP_PASSWORD")) {
            (Some(username), Some(password)) => Some(SmtpSettings {
                host: env.or("SMTP_HOST", "smtp.gmail.com"),
                port: env.parse_or("SMTP_PORT", 587)?,
                username,
                password: Secret::new(password),
                starttls: env.flag_or("SMTP_STARTTLS", true)?,
            }),
            _ => None,
        };

        let sendgrid = env.get("SENDGRID_API_KEY").map(|api_key| SendGridSettings {
            api_key:  Secret::new(api_key),
            base_url: env.or("SENDGRID_BASE_URL", "https://api.sendgrid.com"),
        });

        let gmail = env
            .get("GMAIL_SERVICE_ACCOUNT_FILE")
            .or_else(|| env.get("GOOGLE_APPLICATION_CREDENTIALS"))
            .map(|path| GmailSettings {
                service_account_file: PathBuf::from(path),
                delegated_sender:     env.get("GMAIL_DELEGATED_SENDER"),
                api_base_url:         env.or("GMAIL_API_BASE_URL", "https://gmail.googleapis.com"),
            });

        Ok(Self {
            active_channel,
            sender,
            base_url: env
                .or("MAIL_BASE_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            http_timeout,
            smtp,
            sendgrid,
            gmail,
        })
    }
}

struct Lookup<F>(F);

impl<F: Fn(&str) -> Option<String>> Lookup<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(value) => value.parse().map_err(|_| ConfigError { key, value }),
            None => Ok(default),
        }
    }

    fn flag_or(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(default);
        };
        match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError { key, value }),
        }
    }
}
