use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{Credential, PasswordResetToken};

pub mod credential;
pub mod owner;
pub mod password_reset_token;
pub mod venue;

pub use credential::CredentialRepository;
pub use owner::OwnerRepository;
pub use password_reset_token::PasswordResetTokenRepository;
pub use venue::VenueRepository;

/// 認証情報ストア
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// メールアドレスで検索（大文字小文字を区別しない）
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, sqlx::Error>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, sqlx::Error>;

    /// パスワードハッシュを更新
    ///
    /// # Returns
    /// 更新対象が存在した場合 true
    async fn update_password_hash(&self, id: Uuid, password_hash: &str)
    -> Result<bool, sqlx::Error>;
}

/// パスワードリセットトークンストア
#[async_trait]
pub trait ResetTokenStore: Send + Sync + 'static {
    /// `issued_after` 以降に発行された有効なトークンを検索
    async fn find_live(
        &self,
        user_id: Uuid,
        issued_after: OffsetDateTime,
    ) -> Result<Option<PasswordResetToken>, sqlx::Error>;

    async fn create(
        &self,
        user_id: Uuid,
        token: &str,
        created_at: OffsetDateTime,
    ) -> Result<PasswordResetToken, sqlx::Error>;

    /// (user_id, token) が完全一致するトークンを削除して返す
    ///
    /// 削除が直列化点になる: 同じトークンで同時に呼ばれても
    /// Some を受け取るのは1呼び出しのみ
    async fn consume(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, sqlx::Error>;

    /// `issued_before` より前に発行されたトークンを削除
    ///
    /// # Returns
    /// 削除された行数
    async fn delete_expired(&self, issued_before: OffsetDateTime) -> Result<u64, sqlx::Error>;
}
