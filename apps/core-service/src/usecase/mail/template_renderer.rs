//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで定型メールの HTML 本文と件名を生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **共通レイアウト**: `base.html` を各テンプレートが継承する
//! - **リンク**: `{base_url}/dashboard`、`{base_url}/hackathons/{id}`、`{base_url}/calendar`
//! - **未設定項目**: 会場や日付が未設定なら `TBD` と表示する

use hackhub_domain::mail::{ContentKind, HackathonSummary, MailError, MailTemplate};
use tera::{Context, Tera};

const NOT_DECIDED: &str = "TBD";

/// レンダリング済みのメール
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject:      String,
    pub body:         String,
    pub content_kind: ContentKind,
}

/// テンプレートレンダラー
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// `include_str!` で埋め込んだテンプレートを tera に登録する
    pub fn new() -> Result<Self, MailError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                ("base.html", include_str!("../../../templates/mail/base.html")),
                (
                    "welcome.html",
                    include_str!("../../../templates/mail/welcome.html"),
                ),
                (
                    "registration_confirmation.html",
                    include_str!("../../../templates/mail/registration_confirmation.html"),
                ),
                (
                    "hackathon_reminder.html",
                    include_str!("../../../templates/mail/hackathon_reminder.html"),
                ),
                (
                    "hackathon_update.html",
                    include_str!("../../../templates/mail/hackathon_update.html"),
                ),
            ])
            .map_err(|e| MailError::Template(e.to_string()))?;

        Ok(Self { engine })
    }

    /// 定型メールイベントから件名と本文を生成する
    ///
    /// `base_url` はフロントエンドのベース URL（末尾スラッシュなし）。
    pub fn render(
        &self,
        template: &MailTemplate,
        base_url: &str,
    ) -> Result<RenderedEmail, MailError> {
        let (subject, context) = Self::build_params(template, base_url);
        let template_name = format!("{}.html", template.kind());

        let body = self
            .engine
            .render(&template_name, &context)
            .map_err(|e| MailError::Template(format!("{template_name}: {e}")))?;

        Ok(RenderedEmail {
            subject,
            body,
            content_kind: ContentKind::Html,
        })
    }

    fn build_params(template: &MailTemplate, base_url: &str) -> (String, Context) {
        let mut context = Context::new();
        context.insert("user_name", template.user_name());
        context.insert("dashboard_url", &format!("{base_url}/dashboard"));
        context.insert("calendar_url", &format!("{base_url}/calendar"));

        if let Some(hackathon) = template.hackathon() {
            insert_hackathon(&mut context, hackathon, base_url);
        }

        let subject = match template {
            MailTemplate::Welcome { .. } => {
                "Welcome to HackHub - Let's Build Something Amazing!".to_string()
            }
            MailTemplate::RegistrationConfirmation { hackathon, .. } => {
                format!("Registration Confirmed - {}", hackathon.title)
            }
            MailTemplate::HackathonReminder { hackathon, .. } => {
                format!("Reminder: {} starts soon!", hackathon.title)
            }
            MailTemplate::HackathonUpdate {
                hackathon, message, ..
            } => {
                context.insert("message", message);
                format!("Important Update: {}", hackathon.title)
            }
        };

        (subject, context)
    }
}

fn insert_hackathon(context: &mut Context, hackathon: &HackathonSummary, base_url: &str) {
    let or_tbd = |value: &Option<String>| {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(NOT_DECIDED)
            .to_string()
    };

    context.insert("hackathon_title", &hackathon.title);
    context.insert(
        "hackathon_url",
        &format!("{base_url}/hackathons/{}", hackathon.id),
    );
    context.insert("venue_name", &or_tbd(&hackathon.venue_name));
    context.insert("start_date", &or_tbd(&hackathon.start_date));
    context.insert("end_date", &or_tbd(&hackathon.end_date));
    context.insert(
        "registration_deadline",
        &or_tbd(&hackathon.registration_deadline),
    );
}
