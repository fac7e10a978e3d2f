use async_trait::async_trait;
use uuid::Uuid;

use crate::db::ConnectionManager;
use crate::models::Credential;
use crate::repositories::CredentialStore;

#[derive(Clone)]
pub struct CredentialRepository {
    db: ConnectionManager,
}

impl CredentialRepository {
    pub fn new(db: ConnectionManager) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for CredentialRepository {
    /// # Note
    /// `lower(email)` のユニークインデックスを利用する
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, Credential>(
            r#"
            SELECT id, email, password_hash, name, role, active, created_at, updated_at
            FROM credentials
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&pool)
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, Credential>(
            r#"
            SELECT id, email, password_hash, name, role, active, created_at, updated_at
            FROM credentials
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&pool)
        .await
    }

    /// # Note
    /// password_hash はログに出力しないこと
    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let pool = self.db.acquire().await?;
        let result = sqlx::query(
            r#"
            UPDATE credentials
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
