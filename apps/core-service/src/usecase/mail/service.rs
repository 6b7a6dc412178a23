//! # メールサービス
//!
//! テンプレートレンダリング → ディスパッチを統合するサービス。
//!
//! ## 設計方針
//!
//! - **配信失敗は値で返す**: 全チャネル失敗も `DispatchResult` として返す
//! - **レンダリング失敗のみ `Err`**: ログを出したうえで `MailError::Template` を返す。
//!   参加登録などの呼び出し元はこれを無視して処理を続行できる

use std::sync::Arc;

use hackhub_domain::mail::{DispatchResult, MailError, MailTemplate};
use hackhub_shared::event_log::error::{category, kind};

use super::{MailDispatcher, RenderedEmail, TemplateRenderer};

/// メールサービス
pub struct MailService {
    dispatcher:        Arc<MailDispatcher>,
    template_renderer: TemplateRenderer,
    base_url:          String,
}

impl MailService {
    pub fn new(
        dispatcher: Arc<MailDispatcher>,
        template_renderer: TemplateRenderer,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher,
            template_renderer,
            base_url: base_url.into(),
        }
    }

    pub fn dispatcher(&self) -> &MailDispatcher {
        &self.dispatcher
    }

    /// 定型メールを 1 宛先に送る
    pub async fn notify(
        &self,
        recipient: &str,
        template: &MailTemplate,
    ) -> Result<DispatchResult, MailError> {
        let email = self.render(template)?;

        Ok(self
            .dispatcher
            .send(recipient, &email.subject, &email.body, email.content_kind)
            .await)
    }

    /// 定型メールを複数宛先に送る（お知らせ・リマインダーの一斉送信）
    ///
    /// 本文は 1 度だけレンダリングし、全宛先で共有する。
    pub async fn notify_bulk(
        &self,
        recipients: &[String],
        template: &MailTemplate,
    ) -> Result<Vec<DispatchResult>, MailError> {
        let email = self.render(template)?;

        Ok(self
            .dispatcher
            .send_bulk(recipients, &email.subject, &email.body, email.content_kind)
            .await)
    }

    fn render(&self, template: &MailTemplate) -> Result<RenderedEmail, MailError> {
        self.template_renderer
            .render(template, &self.base_url)
            .inspect_err(|e| {
                tracing::error!(
                    error.category = category::INTERNAL,
                    error.kind = kind::MAIL_TEMPLATE,
                    template = %template.kind(),
                    error = %e,
                    "メールテンプレートのレンダリングに失敗"
                );
            })
    }
}

#[cfg(test)]
mod tests {
    use hackhub_domain::mail::{ChannelKind, DispatchSource, HackathonSummary};
    use hackhub_infra::{MailChannel, mock::MockMailChannel};
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_service(channels: &[&MockMailChannel]) -> MailService {
        let channels = channels
            .iter()
            .map(|c| Arc::new((*c).clone()) as Arc<dyn MailChannel>)
            .collect();
        let dispatcher = MailDispatcher::new(ChannelKind::Smtp, channels).unwrap();
        MailService::new(
            Arc::new(dispatcher),
            TemplateRenderer::new().unwrap(),
            "http://localhost:3000",
        )
    }

    fn update() -> MailTemplate {
        MailTemplate::HackathonUpdate {
            user_name: "Participant".to_string(),
            hackathon: HackathonSummary {
                id: "hk-1".to_string(),
                title: "Rust Hack".to_string(),
                ..HackathonSummary::default()
            },
            message:   "Doors open at 9am".to_string(),
        }
    }

    #[tokio::test]
    async fn notifyはレンダリングした本文を送信する() {
        let smtp = MockMailChannel::succeeding(ChannelKind::Smtp);
        let service = make_service(&[&smtp]);
        let template = MailTemplate::Welcome {
            user_name: "Aiko".to_string(),
        };

        let result = service.notify("aiko@example.com", &template).await.unwrap();

        assert!(result.is_sent());
        let sent = smtp.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].subject,
            "Welcome to HackHub - Let's Build Something Amazing!"
        );
        assert!(sent[0].body.contains("Hello Aiko!"));
    }

    #[tokio::test]
    async fn 配信失敗はエラーではなく失敗結果として返る() {
        let smtp = MockMailChannel::failing(ChannelKind::Smtp, "down");
        let service = make_service(&[&smtp]);

        let result = service.notify("a@example.com", &update()).await.unwrap();

        assert!(!result.is_sent());
        assert_eq!(result.channel, DispatchSource::AllFailed);
    }

    #[tokio::test]
    async fn notify_bulkは全宛先に同じ本文を送る() {
        let smtp = MockMailChannel::succeeding(ChannelKind::Smtp);
        let service = make_service(&[&smtp]);
        let recipients = vec!["a@example.com".to_string(), "b@example.com".to_string()];

        let results = service.notify_bulk(&recipients, &update()).await.unwrap();

        assert_eq!(results.len(), 2);
        let sent = smtp.sent_emails();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body, sent[1].body);
        assert_eq!(sent[0].subject, "Important Update: Rust Hack");
    }
}
