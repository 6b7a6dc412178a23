//! # メールディスパッチャ
//!
//! アクティブチャネルで送信し、失敗したら優先順位テーブルに従って
//! 残りのチャネルへフォールバックする。
//!
//! ## 不変条件
//!
//! - 1 回の論理的な送信で、各チャネルを試すのは最大 1 回
//! - 最初に成功したチャネルで打ち切る
//! - チャネルの失敗はエラーとして伝播せず、`DispatchResult` に記録する
//!
//! ## 一括送信
//!
//! `send_bulk` は順序を保つバッファ付きストリームで、同時送信数を
//! [`BULK_CONCURRENCY`] 件に制限する。1 件の失敗は他の宛先に影響しない。

use std::sync::Arc;

use futures::{StreamExt, stream};
use hackhub_domain::mail::{
    ChannelAttempt,
    ChannelKind,
    ContentKind,
    DispatchResult,
    MailError,
    OutgoingEmail,
};
use hackhub_infra::MailChannel;
use hackhub_shared::{
    event_log::{
        error::{category, kind},
        event,
    },
    log_business_event,
};
use tracing::Instrument;

/// 一括送信時の同時送信数の上限
pub const BULK_CONCURRENCY: usize = 5;

/// マルチチャネルのメールディスパッチャ
///
/// 起動時に 1 度だけ構築し、`Arc` で共有する。構築後は読み取り専用。
pub struct MailDispatcher {
    /// 試行順のチャネル列。先頭がアクティブチャネル。
    sequence: Vec<Arc<dyn MailChannel>>,
}

impl MailDispatcher {
    /// 利用可能なチャネルからディスパッチャを構築する
    ///
    /// `channels` には認証情報が揃い構築に成功したチャネルだけを渡す。
    /// `preferred` が利用できない場合は優先順位の最も高いチャネルをアクティブにする。
    ///
    /// # Errors
    ///
    /// 利用可能なチャネルが 1 つもない場合は `MailError::Configuration` を返す。
    pub fn new(
        preferred: ChannelKind,
        channels: Vec<Arc<dyn MailChannel>>,
    ) -> Result<Self, MailError> {
        let find = |kind: ChannelKind| channels.iter().find(|c| c.kind() == kind).cloned();

        let active = match find(preferred) {
            Some(channel) => channel,
            None => {
                let fallback = ChannelKind::PRIORITY
                    .into_iter()
                    .find_map(find)
                    .ok_or_else(|| {
                        MailError::Configuration(
                            "利用可能なメールチャネルがありません（認証情報を確認してください）"
                                .to_string(),
                        )
                    })?;
                tracing::warn!(
                    error.category = category::CONFIGURATION,
                    error.kind = kind::CREDENTIALS,
                    configured = %preferred,
                    active = %fallback.kind(),
                    "設定されたアクティブチャネルが利用できないため切り替えます"
                );
                fallback
            }
        };

        let mut sequence = vec![active.clone()];
        sequence.extend(active.kind().fallback_sequence().filter_map(find));

        tracing::info!(
            active = %active.kind(),
            fallbacks = ?sequence[1..].iter().map(|c| c.kind()).collect::<Vec<_>>(),
            "メールディスパッチャを初期化しました"
        );

        Ok(Self { sequence })
    }

    /// アクティブチャネル
    pub fn active_channel(&self) -> ChannelKind {
        self.sequence[0].kind()
    }

    /// フォールバック候補（優先順）
    pub fn fallback_channels(&self) -> Vec<ChannelKind> {
        self.sequence[1..].iter().map(|c| c.kind()).collect()
    }

    /// 1 宛先に送信する
    ///
    /// 全チャネルが失敗しても `Err` は返さず、`all_failed` の結果を返す。
    pub async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        content_kind: ContentKind,
    ) -> DispatchResult {
        let email = OutgoingEmail::new(recipient, subject, body, content_kind);
        let span = tracing::info_span!(
            "mail.send",
            recipient = %email.recipient,
            channel = tracing::field::Empty,
        );
        self.dispatch(&email).instrument(span).await
    }

    /// 複数宛先に送信する
    ///
    /// 結果は入力と同じ順序で返す。各宛先は個別にフォールバックを行う。
    pub async fn send_bulk(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
        content_kind: ContentKind,
    ) -> Vec<DispatchResult> {
        let sends: Vec<_> = recipients
            .iter()
            .map(|recipient| self.send(recipient, subject, body, content_kind))
            .collect();
        let results: Vec<DispatchResult> = stream::iter(sends)
            .buffered(BULK_CONCURRENCY)
            .collect()
            .await;

        let sent = results.iter().filter(|r| r.is_sent()).count();
        let outcome = if sent == results.len() {
            event::result::SUCCESS
        } else {
            event::result::FAILURE
        };
        log_business_event!(
            event.category = event::category::MAIL,
            event.action = event::action::BULK_COMPLETED,
            event.result = outcome,
            mail.total = results.len(),
            mail.sent = sent,
            mail.failed = results.len() - sent,
            "一括送信が完了しました"
        );

        results
    }

    async fn dispatch(&self, email: &OutgoingEmail) -> DispatchResult {
        let mut attempts = Vec::with_capacity(self.sequence.len());

        for channel in &self.sequence {
            let channel_kind = channel.kind();
            match channel.send_email(email).await {
                Ok(receipt) => {
                    attempts.push(ChannelAttempt::succeeded(channel_kind));
                    tracing::Span::current().record("channel", tracing::field::display(channel_kind));

                    if attempts.len() > 1 {
                        log_business_event!(
                            event.category = event::category::MAIL,
                            event.action = event::action::MAIL_FALLBACK,
                            event.result = event::result::SUCCESS,
                            event.channel = %channel_kind,
                            event.attempts = attempts.len(),
                            "フォールバックチャネルで送信しました"
                        );
                    }
                    log_business_event!(
                        event.category = event::category::MAIL,
                        event.action = event::action::MAIL_SENT,
                        event.result = event::result::SUCCESS,
                        event.channel = %channel_kind,
                        event.attempts = attempts.len(),
                        "メールを送信しました"
                    );

                    return DispatchResult::sent(email, channel_kind, receipt, attempts);
                }
                Err(e) => {
                    tracing::warn!(
                        error.category = category::EXTERNAL_SERVICE,
                        error.kind = kind::MAIL_CHANNEL,
                        channel = %channel_kind,
                        error = %e,
                        "チャネルでの送信に失敗しました"
                    );
                    attempts.push(ChannelAttempt::failed(channel_kind, e.to_string()));
                }
            }
        }

        let result = DispatchResult::all_failed(email, attempts);
        tracing::Span::current().record("channel", "all_failed");
        log_business_event!(
            event.category = event::category::MAIL,
            event.action = event::action::MAIL_FAILED,
            event.result = event::result::FAILURE,
            event.channel = "all_failed",
            event.attempts = result.attempts.len(),
            error = result.error.as_deref().unwrap_or_default(),
            "すべてのチャネルで送信に失敗しました"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use hackhub_domain::mail::{DispatchSource, DispatchStatus};
    use hackhub_infra::mock::MockMailChannel;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn arc(channel: &MockMailChannel) -> Arc<dyn MailChannel> {
        Arc::new(channel.clone())
    }

    #[test]
    fn チャネルがなければ構築に失敗する() {
        let result = MailDispatcher::new(ChannelKind::Smtp, vec![]);

        assert!(matches!(result, Err(MailError::Configuration(_))));
    }

    #[rstest]
    #[case::smtpがアクティブ(
        ChannelKind::Smtp,
        vec![ChannelKind::SendGrid, ChannelKind::GmailApi]
    )]
    #[case::sendgridがアクティブ(
        ChannelKind::SendGrid,
        vec![ChannelKind::Smtp, ChannelKind::GmailApi]
    )]
    #[case::gmailがアクティブ(
        ChannelKind::GmailApi,
        vec![ChannelKind::Smtp, ChannelKind::SendGrid]
    )]
    fn フォールバックは優先順位順でアクティブを除く(
        #[case] active: ChannelKind,
        #[case] expected: Vec<ChannelKind>,
    ) {
        // 入力順は優先順位と無関係
        let channels = vec![
            arc(&MockMailChannel::succeeding(ChannelKind::GmailApi)),
            arc(&MockMailChannel::succeeding(ChannelKind::Smtp)),
            arc(&MockMailChannel::succeeding(ChannelKind::SendGrid)),
        ];

        let dispatcher = MailDispatcher::new(active, channels).unwrap();

        assert_eq!(dispatcher.active_channel(), active);
        assert_eq!(dispatcher.fallback_channels(), expected);
    }

    #[test]
    fn 設定されたチャネルがなければ最優先の利用可能チャネルを使う() {
        let channels = vec![
            arc(&MockMailChannel::succeeding(ChannelKind::GmailApi)),
            arc(&MockMailChannel::succeeding(ChannelKind::SendGrid)),
        ];

        let dispatcher = MailDispatcher::new(ChannelKind::Smtp, channels).unwrap();

        assert_eq!(dispatcher.active_channel(), ChannelKind::SendGrid);
        assert_eq!(dispatcher.fallback_channels(), vec![ChannelKind::GmailApi]);
    }

    #[tokio::test]
    async fn アクティブが成功すればフォールバックしない() {
        let smtp = MockMailChannel::succeeding(ChannelKind::Smtp);
        let sendgrid = MockMailChannel::succeeding(ChannelKind::SendGrid);
        let dispatcher =
            MailDispatcher::new(ChannelKind::Smtp, vec![arc(&smtp), arc(&sendgrid)]).unwrap();

        let result = dispatcher
            .send("a@example.com", "Hi", "body", ContentKind::Html)
            .await;

        assert_eq!(result.status, DispatchStatus::Sent);
        assert_eq!(result.channel, DispatchSource::Channel(ChannelKind::Smtp));
        assert_eq!(result.message_id.as_deref(), Some("smtp-1"));
        assert_eq!(result.attempts, vec![ChannelAttempt::succeeded(ChannelKind::Smtp)]);
        assert_eq!(sendgrid.call_count(), 0);
    }

    #[tokio::test]
    async fn アクティブが失敗したら次のチャネルで送る() {
        let sendgrid = MockMailChannel::failing(ChannelKind::SendGrid, "401 Unauthorized");
        let smtp = MockMailChannel::succeeding(ChannelKind::Smtp);
        let gmail = MockMailChannel::succeeding(ChannelKind::GmailApi);
        let dispatcher = MailDispatcher::new(
            ChannelKind::SendGrid,
            vec![arc(&sendgrid), arc(&smtp), arc(&gmail)],
        )
        .unwrap();

        let result = dispatcher
            .send("a@example.com", "Hi", "body", ContentKind::Html)
            .await;

        assert!(result.is_sent());
        assert_eq!(result.channel, DispatchSource::Channel(ChannelKind::Smtp));
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.attempts[0].channel, ChannelKind::SendGrid);
        assert!(!result.attempts[0].is_success());
        assert_eq!(sendgrid.call_count(), 1);
        assert_eq!(smtp.call_count(), 1);
        assert_eq!(gmail.call_count(), 0);
    }

    #[tokio::test]
    async fn 全チャネル失敗ならall_failedを返し各チャネルを1回ずつ試す() {
        let smtp = MockMailChannel::failing(ChannelKind::Smtp, "connection refused");
        let sendgrid = MockMailChannel::failing(ChannelKind::SendGrid, "503");
        let gmail = MockMailChannel::failing(ChannelKind::GmailApi, "invalid_grant");
        let dispatcher = MailDispatcher::new(
            ChannelKind::Smtp,
            vec![arc(&smtp), arc(&sendgrid), arc(&gmail)],
        )
        .unwrap();

        let result = dispatcher
            .send("a@example.com", "Hi", "body", ContentKind::PlainText)
            .await;

        assert_eq!(result.status, DispatchStatus::Failed);
        assert_eq!(result.channel, DispatchSource::AllFailed);
        assert_eq!(result.failed_attempts(), 3);
        let error = result.error.unwrap();
        assert!(error.contains("connection refused"));
        assert!(error.contains("503"));
        assert!(error.contains("invalid_grant"));
        assert_eq!(
            (smtp.call_count(), sendgrid.call_count(), gmail.call_count()),
            (1, 1, 1)
        );
    }

    #[tokio::test]
    async fn 結果は送信内容を保持する() {
        let smtp = MockMailChannel::succeeding(ChannelKind::Smtp);
        let dispatcher = MailDispatcher::new(ChannelKind::Smtp, vec![arc(&smtp)]).unwrap();

        let result = dispatcher
            .send("a@example.com", "Subject", "<p>body</p>", ContentKind::Html)
            .await;

        assert_eq!(result.recipient, "a@example.com");
        assert_eq!(result.subject, "Subject");
        assert_eq!(result.body, "<p>body</p>");
        assert_eq!(result.content_kind, ContentKind::Html);
        assert_eq!(
            smtp.sent_emails(),
            vec![OutgoingEmail::new(
                "a@example.com",
                "Subject",
                "<p>body</p>",
                ContentKind::Html
            )]
        );
    }

    #[tokio::test]
    async fn 空の宛先リストは空の結果を返す() {
        let smtp = MockMailChannel::succeeding(ChannelKind::Smtp);
        let dispatcher = MailDispatcher::new(ChannelKind::Smtp, vec![arc(&smtp)]).unwrap();

        let results = dispatcher
            .send_bulk(&[], "Hi", "body", ContentKind::Html)
            .await;

        assert!(results.is_empty());
        assert_eq!(smtp.call_count(), 0);
    }
}
