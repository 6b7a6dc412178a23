//! # 送信メッセージ
//!
//! チャネルに渡すメール 1 通分の値と、送信元の識別情報を定義する。

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// 本文種別
///
/// MIME タイプ文字列（`text/html` / `text/plain`）と相互変換する。
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
pub enum ContentKind {
    /// HTML 本文
    #[default]
    #[serde(rename = "text/html")]
    #[strum(to_string = "text/html")]
    Html,
    /// プレーンテキスト本文
    #[serde(rename = "text/plain")]
    #[strum(to_string = "text/plain")]
    PlainText,
}

/// 送信メッセージ
///
/// ディスパッチャが各チャネルに渡す。チャネルをまたいで同じ値が使われる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// 送信先メールアドレス
    pub recipient:    String,
    /// 件名
    pub subject:      String,
    /// 本文
    pub body:         String,
    /// 本文種別
    pub content_kind: ContentKind,
}

impl OutgoingEmail {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        content_kind: ContentKind,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            content_kind,
        }
    }
}

/// 送信元の識別情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    /// 送信元メールアドレス
    pub address:      String,
    /// 表示名（空文字列なら表示名なし）
    pub display_name: String,
}

impl SenderIdentity {
    pub fn new(address: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            address:      address.into(),
            display_name: display_name.into(),
        }
    }
}

/// チャネルが送信成功時に返す受領情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentReceipt {
    /// プロバイダが採番したメッセージ ID（返さないプロバイダもある）
    pub message_id: Option<String>,
}

impl SentReceipt {
    pub fn with_message_id(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
        }
    }
}
