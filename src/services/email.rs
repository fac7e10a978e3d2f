use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::AppError;

/// 送信メール通知の送り先
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}

/// メール送信サービス
///
/// `email` feature が有効かつ SMTP 設定がある場合は lettre で送信する。
/// それ以外は開発モードとしてログ出力のみ。
#[derive(Clone)]
pub struct EmailService {
    #[cfg(feature = "email")]
    smtp: Option<SmtpMailer>,
}

#[cfg(feature = "email")]
#[derive(Clone)]
struct SmtpMailer {
    transport: Arc<lettre::AsyncSmtpTransport<lettre::Tokio1Executor>>,
    from: lettre::message::Mailbox,
}

impl EmailService {
    /// 新しい EmailService を作成
    #[cfg(feature = "email")]
    pub fn new(config: Arc<Config>) -> Result<Self, AppError> {
        use lettre::transport::smtp::authentication::Credentials;
        use secrecy::ExposeSecret;

        let (Some(host), Some(from)) = (&config.smtp_host, &config.smtp_from_address) else {
            tracing::info!("SMTP 未設定（開発モード: メールはログ出力のみ）");
            return Ok(Self { smtp: None });
        };

        let from = from.parse::<lettre::message::Mailbox>().map_err(|e| {
            AppError::Configuration(format!("SMTP_FROM_ADDRESS が不正です: {e}"))
        })?;

        let mut builder = lettre::AsyncSmtpTransport::<lettre::Tokio1Executor>::relay(host)
            .map_err(|e| AppError::Configuration(format!("SMTP 接続設定エラー: {e}")))?
            .port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(
                username.expose_secret().clone(),
                password.expose_secret().clone(),
            ));
        }

        tracing::info!(host = %host, port = config.smtp_port, "SMTP メール送信を初期化");

        Ok(Self {
            smtp: Some(SmtpMailer {
                transport: Arc::new(builder.build()),
                from,
            }),
        })
    }

    /// 新しい EmailService を作成（email feature 無効時は常に開発モード）
    #[cfg(not(feature = "email"))]
    pub fn new(config: Arc<Config>) -> Result<Self, AppError> {
        if config.smtp_host.is_some() {
            tracing::warn!("SMTP 設定がありますが email feature が無効です（ログ出力のみ）");
        }
        Ok(Self {})
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        #[cfg(feature = "email")]
        if let Some(smtp) = &self.smtp {
            return smtp.send(to, subject, html_body).await;
        }

        // 開発モード: メール送信せずログ出力のみ（本文にはリセットリンクが含まれる）
        tracing::info!(to = %to, subject = %subject, "メール送信（開発モード）");
        tracing::debug!(body = %html_body, "メール本文（開発モード）");

        Ok(())
    }
}

#[cfg(feature = "email")]
impl SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        use lettre::AsyncTransport;
        use lettre::message::header::ContentType;

        let to_mailbox = to
            .parse::<lettre::message::Mailbox>()
            .map_err(|e| AppError::Notification(format!("宛先アドレスが不正です: {e}")))?;

        let message = lettre::Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| AppError::Notification(format!("メール作成エラー: {e}")))?;

        self.transport.send(message).await.map_err(|e| {
            tracing::error!(error = ?e, to = %to, "SMTP 送信エラー");
            AppError::Notification(format!("SMTP 送信エラー: {e}"))
        })?;

        tracing::info!(to = %to, subject = %subject, "メール送信完了");

        Ok(())
    }
}

/// パスワードリセットメールの本文（HTML）
pub fn render_password_reset_email(name: &str, reset_link: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: sans-serif; line-height: 1.5;">
    <p>{name} 様</p>
    <p>パスワード再設定のリクエストを受け付けました。下のリンクから新しいパスワードを設定してください。</p>
    <p><a href="{reset_link}">{reset_link}</a></p>
    <p>このリンクは一度だけ使用でき、一定時間で無効になります。心当たりがない場合はこのメールを破棄してください。</p>
  </body>
</html>
"#,
        name = escape_html(name),
        reset_link = reset_link,
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
