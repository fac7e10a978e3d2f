use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use garde::Validate;
use rand::RngCore;
use rand::rngs::OsRng;
use time::Duration;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::AppError;
use crate::repositories::{CredentialStore, ResetTokenStore};
use crate::services::auth::hash_password;
use crate::services::email::{Mailer, render_password_reset_email};

const RESET_EMAIL_SUBJECT: &str = "Password reset";

/// リセットトークンのバイト長（URL-safe base64 で43文字）
const TOKEN_BYTES: usize = 32;

/// パスワードリセットサービス
#[derive(Clone)]
pub struct PasswordResetService {
    credentials: Arc<dyn CredentialStore>,
    tokens: Arc<dyn ResetTokenStore>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    base_url: String,
    token_ttl: Duration,
}

impl PasswordResetService {
    /// 新しい PasswordResetService を作成
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        tokens: Arc<dyn ResetTokenStore>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        base_url: &str,
        token_ttl: Duration,
    ) -> Self {
        Self {
            credentials,
            tokens,
            mailer,
            clock,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_ttl,
        }
    }

    /// パスワードリセットをリクエスト
    ///
    /// 有効なトークンがあれば再利用し、なければ新規発行してリンクをメール送信する。
    ///
    /// # Errors
    /// - メール形式不正: `Validation`
    /// - ユーザー不在: `UserNotFound`
    /// - メール送信失敗: `Notification`（発行済みトークンは残る）
    ///
    /// # Security
    /// トークン（平文）はログに出力しない
    pub async fn request_reset(&self, email: &str) -> Result<(), AppError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(AppError::Validation(
                "有効なメールアドレスを入力してください".to_string(),
            ));
        }

        let credential = self
            .credentials
            .find_by_email(email)
            .await?
            .ok_or_else(|| {
                tracing::info!(email = %email, "パスワードリセット: ユーザー不在");
                AppError::UserNotFound
            })?;

        let now = self.clock.now();
        let token = match self
            .tokens
            .find_live(credential.id, now - self.token_ttl)
            .await?
        {
            Some(live) => {
                tracing::debug!(user_id = %credential.id, token_id = %live.id, "有効なリセットトークンを再利用");
                live.token
            }
            None => {
                let token = generate_token();
                let record = self.tokens.create(credential.id, &token, now).await?;
                tracing::debug!(user_id = %credential.id, token_id = %record.id, "リセットトークン発行");
                token
            }
        };

        let reset_link = self.build_reset_link(credential.id, &token);
        let body = render_password_reset_email(&credential.name, &reset_link);
        self.mailer
            .send(&credential.email, RESET_EMAIL_SUBJECT, &body)
            .await?;

        tracing::info!(user_id = %credential.id, "パスワードリセットメール送信完了");

        Ok(())
    }

    /// リセットリンクを使ってパスワードを更新
    ///
    /// トークンは照合時に削除する（先に削除した呼び出しのみ成功）。
    /// 失敗理由はすべて `InvalidLink` に丸める。
    ///
    /// # Security
    /// トークン・新パスワードはログに出力しない
    pub async fn confirm_reset(
        &self,
        user_id: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if new_password.is_empty() {
            return Err(AppError::Validation("パスワードは必須です".to_string()));
        }

        let user_id = Uuid::parse_str(user_id.trim()).map_err(|_| {
            tracing::warn!("パスワードリセット: 不正なユーザーID");
            AppError::InvalidLink
        })?;

        if self.credentials.find_by_id(user_id).await?.is_none() {
            tracing::warn!(user_id = %user_id, "パスワードリセット: ユーザー不在");
            return Err(AppError::InvalidLink);
        }

        let reset_token = self
            .tokens
            .consume(user_id, token)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = %user_id, "パスワードリセット: トークン不一致または使用済み");
                AppError::InvalidLink
            })?;

        if reset_token.is_expired(self.clock.now(), self.token_ttl) {
            tracing::warn!(user_id = %user_id, token_id = %reset_token.id, "期限切れトークン");
            return Err(AppError::InvalidLink);
        }

        let password_hash = hash_password(new_password)?;
        if !self
            .credentials
            .update_password_hash(user_id, &password_hash)
            .await?
        {
            return Err(AppError::InvalidLink);
        }

        tracing::info!(user_id = %user_id, "パスワードリセット完了");

        Ok(())
    }

    /// 期限切れトークンを削除
    ///
    /// # Returns
    /// 削除件数
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let deleted = self
            .tokens
            .delete_expired(self.clock.now() - self.token_ttl)
            .await?;
        if deleted > 0 {
            tracing::info!(deleted, "期限切れリセットトークンを削除");
        }
        Ok(deleted)
    }

    fn build_reset_link(&self, user_id: Uuid, token: &str) -> String {
        format!("{}/password-reset/{}/{}", self.base_url, user_id, token)
    }
}

/// OS乱数から32バイトのトークンを生成
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Validate)]
struct EmailAddress {
    #[garde(email)]
    value: String,
}

/// メール形式（garde の email ルール）かつドメインに `.` を含むか
fn is_valid_email(email: &str) -> bool {
    let address = EmailAddress {
        value: email.to_string(),
    };
    if address.validate().is_err() {
        return false;
    }
    // localhost などの単一ラベルのドメインは受け付けない
    email.rsplit_once('@').is_some_and(|(_, domain)| {
        domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
    })
}
