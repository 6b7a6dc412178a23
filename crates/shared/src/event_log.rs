//! # 配信イベントのログ語彙
//!
//! メール配信の結果を後から集計できるよう、構造化ログのフィールド名と値を固定する。
//!
//! - 配信結果（送信成功・フォールバック・全失敗・一括送信完了）は
//!   [`log_business_event!`] で `info` に出す。`event.kind = "business_event"` が付く
//! - チャネル単体の失敗や設定不備は `tracing::warn!` / `error!` に
//!   [`error::category`] と [`error::kind`] を付けて出す
//!
//! JSON 出力ではドット記法のフィールドがそのままキーになる:
//!
//! ```text
//! jq 'select(.["event.action"] == "mail.failed") | .recipient'
//! ```

/// 配信イベントを `info` レベルで出力する
///
/// 引数は `tracing::info!` と同じ。`event.category` / `event.action` / `event.result` を
/// [`event`] の定数で必ず指定する。メール配信では `event.channel`（成功したチャネル、
/// 全失敗なら `all_failed`）と `event.attempts`（試行数）も付ける。
///
/// ```
/// use hackhub_shared::{event_log::event, log_business_event};
///
/// log_business_event!(
///     event.category = event::category::MAIL,
///     event.action = event::action::MAIL_FALLBACK,
///     event.result = event::result::SUCCESS,
///     event.channel = "sendgrid",
///     event.attempts = 2,
///     "フォールバックチャネルで送信しました"
/// );
/// ```
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(event.kind = "business_event", $($args)*)
    };
}

/// `event.*` フィールドの値
pub mod event {
    pub mod category {
        pub const MAIL: &str = "mail";
    }

    pub mod action {
        /// 1 宛先への送信が成功した
        pub const MAIL_SENT: &str = "mail.sent";
        /// 1 宛先への送信が全チャネルで失敗した
        pub const MAIL_FAILED: &str = "mail.failed";
        /// アクティブ以外のチャネルで送信できた
        pub const MAIL_FALLBACK: &str = "mail.fallback";
        /// 一括送信の全宛先が終わった
        pub const BULK_COMPLETED: &str = "mail.bulk_completed";
    }

    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// `error.*` フィールドの値
pub mod error {
    pub mod category {
        /// SMTP サーバー・SendGrid・Gmail API 側の失敗
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// 認証情報や設定値の不備（起動時）
        pub const CONFIGURATION: &str = "configuration";
        /// テンプレートなどサービス内部の失敗
        pub const INTERNAL: &str = "internal";
    }

    pub mod kind {
        pub const MAIL_CHANNEL: &str = "mail_channel";
        pub const MAIL_TEMPLATE: &str = "mail_template";
        pub const CREDENTIALS: &str = "credentials";
    }
}
