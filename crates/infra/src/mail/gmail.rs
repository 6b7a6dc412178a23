//! Gmail API チャネル実装
//!
//! サービスアカウント鍵で署名した JWT をアクセストークンに交換し、
//! `users.messages.send` に RFC 5322 形式のメッセージ（base64url）を送る。
//!
//! ## トークンの扱い
//!
//! アクセストークンは有効期限の 60 秒前までキャッシュする。
//! キャッシュはこのチャネル内の唯一の可変状態で、`tokio::sync::Mutex` で保護する。
//!
//! ## ドメイン全体の委任
//!
//! 委任先ユーザー（`delegated_sender`）が `@gmail.com` 以外のときだけ
//! JWT の `sub` に設定する。個人の Gmail アカウントは委任を受けられない。

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE};
use hackhub_domain::mail::{ChannelKind, MailError, OutgoingEmail, SenderIdentity, SentReceipt};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::Instant};

use super::{MailChannel, mime::build_message};

const GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
/// `expires_in` がこれより長くてもキャッシュはこの期間で打ち切る
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(ASSERTION_LIFETIME_SECS as u64);

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// サービスアカウント鍵（Google Cloud が発行する JSON ファイル）
///
/// 使用するフィールドのみ読み込む。
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key:  Secret<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri:    String,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, MailError> {
        serde_json::from_str(json).map_err(|e| {
            MailError::Configuration(format!("サービスアカウント鍵の形式が不正: {e}"))
        })
    }

    /// ファイルから読み込む
    pub async fn from_file(path: &Path) -> Result<Self, MailError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            MailError::Configuration(format!(
                "サービスアカウント鍵を読み込めません ({}): {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
    }
}

/// Gmail API 接続設定
#[derive(Debug, Clone)]
pub struct GmailSettings {
    pub service_account_file: PathBuf,
    /// 委任先ユーザー
    pub delegated_sender:     Option<String>,
    pub api_base_url:         String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss:   &'a str,
    scope: &'static str,
    aud:   &'a str,
    iat:   i64,
    exp:   i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub:   Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in:   u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

struct CachedToken {
    access_token: Secret<String>,
    refresh_at:   Instant,
}

/// Gmail API チャネル
pub struct GmailApiChannel {
    client:           reqwest::Client,
    key:              ServiceAccountKey,
    encoding_key:     EncodingKey,
    delegated_sender: Option<String>,
    api_base_url:     String,
    sender:           SenderIdentity,
    token:            Mutex<Option<CachedToken>>,
}

impl GmailApiChannel {
    /// 設定からチャネルを作成する
    ///
    /// 鍵ファイルの読み込みに失敗した場合は `MailError::Configuration` を返す。
    /// 呼び出し側はこのチャネルを候補から外す。
    pub async fn from_settings(
        settings: &GmailSettings,
        sender: SenderIdentity,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let key = ServiceAccountKey::from_file(&settings.service_account_file).await?;
        Self::new(
            key,
            settings.delegated_sender.clone(),
            settings.api_base_url.clone(),
            sender,
            timeout,
        )
    }

    pub fn new(
        key: ServiceAccountKey,
        delegated_sender: Option<String>,
        api_base_url: String,
        sender: SenderIdentity,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
            .map_err(|e| MailError::Configuration(format!("秘密鍵を解釈できません: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MailError::Configuration(format!("HTTP クライアント構築失敗: {e}")))?;

        Ok(Self {
            client,
            key,
            encoding_key,
            delegated_sender,
            api_base_url,
            sender,
            token: Mutex::new(None),
        })
    }

    /// JWT の `sub` に設定する委任先
    fn subject(&self) -> Option<&str> {
        self.delegated_sender
            .as_deref()
            .filter(|s| !s.is_empty() && !s.ends_with("@gmail.com"))
    }

    fn claims(&self, now: i64) -> AssertionClaims<'_> {
        AssertionClaims {
            iss: &self.key.client_email,
            scope: GMAIL_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
            sub: self.subject(),
        }
    }

    fn failure(message: impl Into<String>) -> MailError {
        MailError::channel_send(ChannelKind::GmailApi, message)
    }

    /// キャッシュ済みのトークンを返す。期限が近ければ取り直す。
    async fn access_token(&self) -> Result<Secret<String>, MailError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.access_token.clone());
        }

        let fresh = self.fetch_token().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn fetch_token(&self) -> Result<CachedToken, MailError> {
        let claims = self.claims(chrono::Utc::now().timestamp());
        let assertion =
            jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
                .map_err(|e| Self::failure(format!("JWT 署名失敗: {e}")))?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| Self::failure(format!("トークン取得リクエスト失敗: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::failure(format!("トークン取得失敗 {status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Self::failure(format!("トークン応答の形式が不正: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in)
            .min(MAX_TOKEN_LIFETIME)
            .saturating_sub(TOKEN_REFRESH_MARGIN);
        tracing::debug!(
            lifetime_secs = lifetime.as_secs(),
            "Gmail API アクセストークンを取得"
        );

        Ok(CachedToken {
            access_token: Secret::new(token.access_token),
            refresh_at:   Instant::now() + lifetime,
        })
    }
}

#[async_trait]
impl MailChannel for GmailApiChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::GmailApi
    }

    async fn send_email(&self, email: &OutgoingEmail) -> Result<SentReceipt, MailError> {
        let message = build_message(&self.sender, email)?;
        let raw = URL_SAFE.encode(message.formatted());
        let token = self.access_token().await?;

        let response = self
            .client
            .post(format!(
                "{}/gmail/v1/users/me/messages/send",
                self.api_base_url.trim_end_matches('/')
            ))
            .bearer_auth(token.expose_secret())
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| Self::failure(format!("送信リクエスト失敗: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::failure(format!("予期しないステータス {status}: {body}")));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| Self::failure(format!("送信応答の形式が不正: {e}")))?;

        Ok(SentReceipt {
            message_id: sent.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use hackhub_domain::mail::ContentKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use wiremock::{
        Mock,
        MockServer,
        ResponseTemplate,
        matchers::{body_string_contains, header, method, path},
    };

    use super::*;

    const TEST_PRIVATE_KEY: &str = include_str!("../../tests/fixtures/service_account_test_key.pem");

    fn key(token_uri: &str) -> ServiceAccountKey {
        ServiceAccountKey::from_json(
            &json!({
                "type": "service_account",
                "client_email": "mailer@hackhub.iam.gserviceaccount.com",
                "private_key": TEST_PRIVATE_KEY,
                "token_uri": token_uri,
            })
            .to_string(),
        )
        .unwrap()
    }

    fn channel(server: &MockServer, delegated_sender: Option<&str>) -> GmailApiChannel {
        GmailApiChannel::new(
            key(&format!("{}/token", server.uri())),
            delegated_sender.map(str::to_string),
            server.uri(),
            SenderIdentity::new("team@hackhub.example.com", "HackHub Team"),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail::new("a@example.com", "Hi", "<p>hello</p>", ContentKind::Html)
    }

    async fn mount_token(server: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("jwt-bearer"))
            .and(body_string_contains("assertion="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.test",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GmailApiChannel>();
    }

    #[test]
    fn token_uriが省略されたらgoogleの既定値を使う() {
        let key = ServiceAccountKey::from_json(
            &json!({ "client_email": "x@y", "private_key": "k" }).to_string(),
        )
        .unwrap();

        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn 不正なjsonは設定エラーになる() {
        let result = ServiceAccountKey::from_json("{ not json");

        assert!(matches!(result, Err(MailError::Configuration(_))));
    }

    #[tokio::test]
    async fn 存在しない鍵ファイルは設定エラーになる() {
        let settings = GmailSettings {
            service_account_file: PathBuf::from("/nonexistent/service-account.json"),
            delegated_sender:     None,
            api_base_url:         "http://localhost".to_string(),
        };

        let result = GmailApiChannel::from_settings(
            &settings,
            SenderIdentity::new("team@hackhub.example.com", ""),
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(result, Err(MailError::Configuration(_))));
    }

    #[test]
    fn 不正な秘密鍵は設定エラーになる() {
        let mut key = key("http://localhost/token");
        key.private_key = Secret::new("not a pem".to_string());

        let result = GmailApiChannel::new(
            key,
            None,
            "http://localhost".to_string(),
            SenderIdentity::new("team@hackhub.example.com", ""),
            Duration::from_secs(1),
        );

        assert!(matches!(result, Err(MailError::Configuration(_))));
    }

    #[rstest]
    #[case::独自ドメインは委任する(Some("team@hackhub.dev"), Some("team@hackhub.dev"))]
    #[case::gmailアカウントは委任しない(Some("hackhub.team@gmail.com"), None)]
    #[case::未設定なら委任しない(None, None)]
    #[tokio::test]
    async fn 委任先に応じてsubを設定する(
        #[case] delegated_sender: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let server = MockServer::start().await;
        let channel = channel(&server, delegated_sender);

        let claims = channel.claims(1_700_000_000);

        assert_eq!(claims.sub, expected);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.scope, "https://www.googleapis.com/auth/gmail.send");
        assert_eq!(claims.aud, format!("{}/token", server.uri()));
    }

    #[tokio::test]
    async fn 送信に成功するとメッセージidを返しトークンを再利用する() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .and(header("authorization", "Bearer ya29.test"))
            .and(body_string_contains("\"raw\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "gm-1" })))
            .expect(2)
            .mount(&server)
            .await;
        let channel = channel(&server, None);

        let first = channel.send_email(&email()).await.unwrap();
        let second = channel.send_email(&email()).await.unwrap();

        assert_eq!(first.message_id.as_deref(), Some("gm-1"));
        assert_eq!(second.message_id.as_deref(), Some("gm-1"));
    }

    #[tokio::test]
    async fn 極端に長いexpires_inでも送信できキャッシュ期間は上限で打ち切る() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.test",
                "expires_in": u64::MAX,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "gm-2" })))
            .mount(&server)
            .await;
        let channel = channel(&server, None);

        let receipt = channel.send_email(&email()).await.unwrap();

        assert_eq!(receipt.message_id.as_deref(), Some("gm-2"));
        let cached = channel.token.lock().await;
        let remaining = cached.as_ref().unwrap().refresh_at - Instant::now();
        assert!(remaining <= MAX_TOKEN_LIFETIME - TOKEN_REFRESH_MARGIN);
    }

    #[tokio::test]
    async fn トークン取得に失敗するとチャネルエラーになる() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let error = channel(&server, None).send_email(&email()).await.unwrap_err();

        match error {
            MailError::ChannelSend { channel, message } => {
                assert_eq!(channel, ChannelKind::GmailApi);
                assert!(message.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn 送信apiのエラーステータスはチャネルエラーになる() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let result = channel(&server, None).send_email(&email()).await;

        assert!(matches!(
            result,
            Err(MailError::ChannelSend {
                channel: ChannelKind::GmailApi,
                ..
            })
        ));
    }
}
