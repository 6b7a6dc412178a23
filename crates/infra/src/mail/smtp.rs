//! SMTP チャネル実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 本番では STARTTLS + ログイン認証、開発では TLS なしで Mailpit 等に接続する。

use async_trait::async_trait;
use hackhub_domain::mail::{ChannelKind, MailError, OutgoingEmail, SenderIdentity, SentReceipt};
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    transport::smtp::authentication::Credentials,
};
use secrecy::{ExposeSecret, Secret};

use super::{MailChannel, mime::build_message};

/// SMTP 接続設定
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// SMTP サーバーのホスト名（例: "smtp.gmail.com"）
    pub host:     String,
    /// ポート番号（STARTTLS なら通常 587）
    pub port:     u16,
    pub username: String,
    pub password: Secret<String>,
    /// STARTTLS を使うか（false なら平文接続で認証なし）
    pub starttls: bool,
}

/// SMTP チャネル
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender:    SenderIdentity,
}

impl SmtpChannel {
    /// 新しい SMTP チャネルを作成
    ///
    /// 接続はまだ行わない。送信時に接続する。
    pub fn new(settings: &SmtpSettings, sender: SenderIdentity) -> Result<Self, MailError> {
        let transport = if settings.starttls {
            let credentials = Credentials::new(
                settings.username.clone(),
                settings.password.expose_secret().clone(),
            );
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|e| MailError::Configuration(format!("SMTP リレー設定失敗: {e}")))?
                .port(settings.port)
                .credentials(credentials)
                .build()
        } else {
            // builder_dangerous: TLS なしで接続（Mailpit 等のローカル SMTP 向け）
            // 平文接続では認証情報を送らない
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
                .port(settings.port)
                .build()
        };

        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl MailChannel for SmtpChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Smtp
    }

    async fn send_email(&self, email: &OutgoingEmail) -> Result<SentReceipt, MailError> {
        let message = build_message(&self.sender, email)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| MailError::channel_send(ChannelKind::Smtp, format!("SMTP 送信失敗: {e}")))?;

        Ok(SentReceipt {
            message_id: response.first_line().map(str::to_string),
        })
    }
}
