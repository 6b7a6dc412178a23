//! # テスト用モックチャネル
//!
//! ディスパッチャのテストで使用するインメモリのメールチャネル。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! hackhub-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashSet,
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use hackhub_domain::mail::{ChannelKind, MailError, OutgoingEmail, SentReceipt};

use crate::mail::MailChannel;

#[derive(Default)]
struct MockState {
    sent:          Mutex<Vec<OutgoingEmail>>,
    calls:         AtomicUsize,
    in_flight:     AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_all:      Option<String>,
    fail_for:      Mutex<HashSet<String>>,
    delay:         Mutex<Option<Duration>>,
}

/// 成功・失敗・遅延を設定できるモックチャネル
///
/// クローンは状態を共有する。ディスパッチャに渡した後も呼び出し記録を参照できる。
#[derive(Clone)]
pub struct MockMailChannel {
    kind:  ChannelKind,
    state: Arc<MockState>,
}

impl MockMailChannel {
    /// 常に成功するチャネル
    pub fn succeeding(kind: ChannelKind) -> Self {
        Self {
            kind,
            state: Arc::new(MockState::default()),
        }
    }

    /// 常に失敗するチャネル
    pub fn failing(kind: ChannelKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            state: Arc::new(MockState {
                fail_all: Some(message.into()),
                ..MockState::default()
            }),
        }
    }

    /// 送信ごとに指定時間待機する
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.state.delay.lock().unwrap() = Some(delay);
        self
    }

    /// 指定した宛先への送信だけ失敗させる
    pub fn fail_for(self, recipient: impl Into<String>) -> Self {
        self.state.fail_for.lock().unwrap().insert(recipient.into());
        self
    }

    /// `send_email` が呼ばれた回数（失敗を含む）
    pub fn call_count(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// 送信に成功したメール
    pub fn sent_emails(&self) -> Vec<OutgoingEmail> {
        self.state.sent.lock().unwrap().clone()
    }

    /// 同時に処理中だった送信の最大数
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailChannel for MockMailChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send_email(&self, email: &OutgoingEmail) -> Result<SentReceipt, MailError> {
        let state = &self.state;
        state.calls.fetch_add(1, Ordering::SeqCst);
        let current = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *state.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        state.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(message) = &state.fail_all {
            return Err(MailError::channel_send(self.kind, message.clone()));
        }
        if state.fail_for.lock().unwrap().contains(&email.recipient) {
            return Err(MailError::channel_send(
                self.kind,
                format!("rejected recipient {}", email.recipient),
            ));
        }

        let mut sent = state.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(SentReceipt::with_message_id(format!(
            "{}-{}",
            self.kind,
            sent.len()
        )))
    }
}
