//! MIME メッセージの組み立て
//!
//! SMTP と Gmail API（raw 形式）で共通に使う。

use hackhub_domain::mail::{ContentKind, MailError, OutgoingEmail, SenderIdentity};
use lettre::{
    Address,
    Message,
    message::{Mailbox, header::ContentType},
};

/// 送信メッセージから lettre の `Message` を組み立てる
pub(crate) fn build_message(
    sender: &SenderIdentity,
    email: &OutgoingEmail,
) -> Result<Message, MailError> {
    let from_address: Address = sender
        .address
        .parse()
        .map_err(|e| MailError::InvalidAddress(format!("送信元 {}: {e}", sender.address)))?;
    let display_name = (!sender.display_name.is_empty()).then(|| sender.display_name.clone());

    let to: Mailbox = email
        .recipient
        .parse()
        .map_err(|e| MailError::InvalidAddress(format!("宛先 {}: {e}", email.recipient)))?;

    let content_type = match email.content_kind {
        ContentKind::Html => ContentType::TEXT_HTML,
        ContentKind::PlainText => ContentType::TEXT_PLAIN,
    };

    Message::builder()
        .from(Mailbox::new(display_name, from_address))
        .to(to)
        .subject(&email.subject)
        .header(content_type)
        .body(email.body.clone())
        .map_err(|e| MailError::MessageBuild(e.to_string()))
}
