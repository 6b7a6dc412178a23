//! # テンプレートイベント
//!
//! リクエストハンドラが業務処理の後に送る定型メールを表す。
//! メール本文の生成（テンプレートレンダリング）は core-service が担当する。

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// 定型メール種別
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MailTemplateKind {
    /// 新規ユーザーへのウェルカムメール
    Welcome,
    /// ハッカソン参加登録の確認
    RegistrationConfirmation,
    /// 開催前リマインダー
    HackathonReminder,
    /// 主催者からのお知らせ
    HackathonUpdate,
}

/// メール本文に埋め込むハッカソンの概要
///
/// 表示用の項目は任意。未設定の項目はテンプレート側で `TBD` と表示する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HackathonSummary {
    pub id:                    String,
    pub title:                 String,
    #[serde(default)]
    pub venue_name:            Option<String>,
    #[serde(default)]
    pub start_date:            Option<String>,
    #[serde(default)]
    pub end_date:              Option<String>,
    #[serde(default)]
    pub registration_deadline: Option<String>,
}

/// 定型メールイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTemplate {
    Welcome {
        user_name: String,
    },
    RegistrationConfirmation {
        user_name: String,
        hackathon: HackathonSummary,
    },
    HackathonReminder {
        user_name: String,
        hackathon: HackathonSummary,
    },
    HackathonUpdate {
        user_name: String,
        hackathon: HackathonSummary,
        message:   String,
    },
}

impl MailTemplate {
    /// 定型メール種別を返す
    pub fn kind(&self) -> MailTemplateKind {
        match self {
            Self::Welcome { .. } => MailTemplateKind::Welcome,
            Self::RegistrationConfirmation { .. } => MailTemplateKind::RegistrationConfirmation,
            Self::HackathonReminder { .. } => MailTemplateKind::HackathonReminder,
            Self::HackathonUpdate { .. } => MailTemplateKind::HackathonUpdate,
        }
    }

    /// 宛名に使うユーザー名
    pub fn user_name(&self) -> &str {
        match self {
            Self::Welcome { user_name }
            | Self::RegistrationConfirmation { user_name, .. }
            | Self::HackathonReminder { user_name, .. }
            | Self::HackathonUpdate { user_name, .. } => user_name,
        }
    }

    /// 対象ハッカソン（ウェルカムメールにはない）
    pub fn hackathon(&self) -> Option<&HackathonSummary> {
        match self {
            Self::Welcome { .. } => None,
            Self::RegistrationConfirmation { hackathon, .. }
            | Self::HackathonReminder { hackathon, .. }
            | Self::HackathonUpdate { hackathon, .. } => Some(hackathon),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_hackathon() -> HackathonSummary {
        HackathonSummary {
            id: "hk-42".to_string(),
            title: "Rust Hack Night".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_kindが各バリアントで正しい値を返す() {
        let welcome = MailTemplate::Welcome {
            user_name: "Alice".to_string(),
        };
        let update = MailTemplate::HackathonUpdate {
            user_name: "Alice".to_string(),
            hackathon: make_hackathon(),
            message:   "会場が変更になりました".to_string(),
        };

        assert_eq!(welcome.kind(), MailTemplateKind::Welcome);
        assert_eq!(update.kind(), MailTemplateKind::HackathonUpdate);
        assert_eq!(
            MailTemplateKind::RegistrationConfirmation.to_string(),
            "registration_confirmation"
        );
    }

    #[test]
    fn test_ウェルカムメールにはハッカソンがない() {
        let welcome = MailTemplate::Welcome {
            user_name: "Alice".to_string(),
        };
        assert!(welcome.hackathon().is_none());
        assert_eq!(welcome.user_name(), "Alice");
    }

    #[test]
    fn test_ハッカソン概要の任意項目は省略できる() {
        let json = r#"{"id": "hk-1", "title": "Spring Hack"}"#;
        let hackathon: HackathonSummary = serde_json::from_str(json).unwrap();

        assert_eq!(hackathon.title, "Spring Hack");
        assert!(hackathon.venue_name.is_none());
        assert!(hackathon.registration_deadline.is_none());
    }
}
