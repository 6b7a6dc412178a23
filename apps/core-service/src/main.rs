//! # Core Service サーバー
//!
//! HackHub のメール配信を担当する内部サービス。
//!
//! ## 役割
//!
//! - **メールディスパッチ**: SMTP / SendGrid / Gmail API のフォールバック付き送信
//! - **定型メール**: ウェルカム・参加登録確認・リマインダー・お知らせの生成と送信
//!
//! ## アクセス制御
//!
//! 内部ネットワークからのみアクセス可能とする。
//! ユーザー向けの API サーバーが業務処理の後にこのサービスを呼ぶ。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `CORE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `CORE_PORT` | No | ポート番号（デフォルト: `8000`） |
//! | `MAIL_ACTIVE_CHANNEL` | No | `smtp` / `sendgrid` / `gmail_api`（デフォルト: `smtp`） |
//! | `SMTP_USERNAME`, `SMTP_PASSWORD` | ※ | SMTP チャネルの認証情報 |
//! | `SENDGRID_API_KEY` | ※ | SendGrid チャネルの API キー |
//! | `GMAIL_SERVICE_ACCOUNT_FILE` | ※ | Gmail API チャネルのサービスアカウント鍵 |
//!
//! ※ 少なくとも 1 つのチャネルの認証情報が必要。その他は `config.rs` を参照。
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（Mailpit）
//! SMTP_HOST=localhost SMTP_PORT=1025 SMTP_STARTTLS=false \
//!   SMTP_USERNAME=dev SMTP_PASSWORD=dev cargo run -p hackhub-core-service
//!
//! # 本番環境
//! LOG_FORMAT=json MAIL_ACTIVE_CHANNEL=sendgrid SENDGRID_API_KEY=... \
//!   cargo run -p hackhub-core-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use hackhub_core_service::{
    app_builder::{build_mail_service, build_router},
    config::CoreConfig,
    handler::MailState,
};
use hackhub_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Core Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(&TracingConfig::from_env("core-service"))
        .context("ログ出力の初期化に失敗しました")?;

    let config = CoreConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Core Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let service = build_mail_service(&config.mail)
        .await
        .context("メール配信の初期化に失敗しました")?;
    let app = build_router(Arc::new(MailState { service }));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Core Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Core Service サーバーを停止しました");
    Ok(())
}

/// Ctrl-C または SIGTERM を待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl-C ハンドラの登録に失敗: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM ハンドラの登録に失敗: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("シャットダウンシグナルを受信しました");
}
