//! # メールチャネル
//!
//! メールを届ける手段の種別と、フォールバックの優先順位を定義する。

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// メールチャネル種別
///
/// 設定値（`MAIL_ACTIVE_CHANNEL`）としては `smtp` / `sendgrid` / `gmail_api` を受け付ける。
/// ベンダー API を抽象的に指す `vendor_a_api`（SendGrid）と
/// `vendor_b_api`（Gmail API）も別名として解釈する。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
pub enum ChannelKind {
    /// SMTP サーバーへの直接送信
    #[serde(rename = "smtp")]
    #[strum(to_string = "smtp")]
    Smtp,
    /// SendGrid v3 Mail Send API（API キー認証）
    #[serde(rename = "sendgrid")]
    #[strum(to_string = "sendgrid", serialize = "vendor_a_api")]
    SendGrid,
    /// Gmail API（サービスアカウント認証）
    #[serde(rename = "gmail_api")]
    #[strum(to_string = "gmail_api", serialize = "vendor_b_api")]
    GmailApi,
}

impl ChannelKind {
    /// フォールバックの優先順位
    ///
    /// チャネルを追加する場合はこのテーブルに位置を明示すること。
    pub const PRIORITY: [ChannelKind; 3] = [Self::Smtp, Self::SendGrid, Self::GmailApi];

    /// このチャネルがアクティブなときのフォールバック候補を優先順に返す
    ///
    /// 自分自身は含まない。認証情報の有無による絞り込みは呼び出し側で行う。
    pub fn fallback_sequence(self) -> impl Iterator<Item = ChannelKind> {
        Self::PRIORITY.into_iter().filter(move |kind| *kind != self)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("smtp", ChannelKind::Smtp)]
    #[case("sendgrid", ChannelKind::SendGrid)]
    #[case("vendor_a_api", ChannelKind::SendGrid)]
    #[case("gmail_api", ChannelKind::GmailApi)]
    #[case("vendor_b_api", ChannelKind::GmailApi)]
    fn test_設定値からチャネル種別をパースできる(
        #[case] input: &str,
        #[case] expected: ChannelKind,
    ) {
        assert_eq!(ChannelKind::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_未知の設定値はパースエラーになる() {
        assert!(ChannelKind::from_str("postmark").is_err());
        assert!(ChannelKind::from_str("").is_err());
    }

    #[test]
    fn test_表示名は正規名を使う() {
        assert_eq!(ChannelKind::Smtp.to_string(), "smtp");
        assert_eq!(ChannelKind::SendGrid.to_string(), "sendgrid");
        assert_eq!(ChannelKind::GmailApi.to_string(), "gmail_api");

        let name: &str = ChannelKind::GmailApi.into();
        assert_eq!(name, "gmail_api");
    }

    #[test]
    fn test_優先順位はsmtp_sendgrid_gmail_apiの順() {
        assert_eq!(
            ChannelKind::PRIORITY,
            [ChannelKind::Smtp, ChannelKind::SendGrid, ChannelKind::GmailApi]
        );
    }

    #[rstest]
    #[case(ChannelKind::Smtp, vec![ChannelKind::SendGrid, ChannelKind::GmailApi])]
    #[case(ChannelKind::SendGrid, vec![ChannelKind::Smtp, ChannelKind::GmailApi])]
    #[case(ChannelKind::GmailApi, vec![ChannelKind::Smtp, ChannelKind::SendGrid])]
    fn test_フォールバック候補はアクティブチャネルを除いた優先順(
        #[case] active: ChannelKind,
        #[case] expected: Vec<ChannelKind>,
    ) {
        let sequence: Vec<_> = active.fallback_sequence().collect();
        assert_eq!(sequence, expected);
    }

    #[test]
    fn test_serdeは正規名でシリアライズする() {
        let json = serde_json::to_value(ChannelKind::SendGrid).unwrap();
        assert_eq!(json, serde_json::json!("sendgrid"));
    }
}
