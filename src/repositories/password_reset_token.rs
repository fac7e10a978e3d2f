use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::ConnectionManager;
use crate::models::PasswordResetToken;
use crate::repositories::ResetTokenStore;

#[derive(Clone)]
pub struct PasswordResetTokenRepository {
    db: ConnectionManager,
}

impl PasswordResetTokenRepository {
    pub fn new(db: ConnectionManager) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResetTokenStore for PasswordResetTokenRepository {
    async fn find_live(
        &self,
        user_id: Uuid,
        issued_after: OffsetDateTime,
    ) -> Result<Option<PasswordResetToken>, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, PasswordResetToken>(
            r#"
            SELECT id, user_id, token, created_at
            FROM password_reset_tokens
            WHERE user_id = $1 AND created_at >= $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(issued_after)
        .fetch_optional(&pool)
        .await
    }

    /// # Arguments
    /// * `user_id` - 対象ユーザーのID
    /// * `token` - ランダム生成されたトークン値
    /// * `created_at` - 発行時刻（有効期限の起点）
    async fn create(
        &self,
        user_id: Uuid,
        token: &str,
        created_at: OffsetDateTime,
    ) -> Result<PasswordResetToken, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, token, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token)
        .bind(created_at)
        .fetch_one(&pool)
        .await
    }

    /// # Note
    /// DELETE ... RETURNING により、同一トークンの同時消費は片方のみ成功する
    /// 有効期限の検証は呼び出し側で行う
    async fn consume(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, PasswordResetToken>(
            r#"
            DELETE FROM password_reset_tokens
            WHERE user_id = $1 AND token = $2
            RETURNING id, user_id, token, created_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_optional(&pool)
        .await
    }

    async fn delete_expired(&self, issued_before: OffsetDateTime) -> Result<u64, sqlx::Error> {
        let pool = self.db.acquire().await?;
        let result = sqlx::query(
            r#"
            DELETE FROM password_reset_tokens
            WHERE created_at < $1
            "#,
        )
        .bind(issued_before)
        .execute(&pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use time::Duration;

    use super::*;

    fn repository(pool: PgPool) -> PasswordResetTokenRepository {
        PasswordResetTokenRepository::new(ConnectionManager::from_pool(pool))
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_concurrent_consume_deletes_once(pool: PgPool) {
        let repo = repository(pool);
        let user_id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        repo.create(user_id, "reset-token", now).await.expect("create");

        let (first, second) = tokio::join!(
            repo.consume(user_id, "reset-token"),
            repo.consume(user_id, "reset-token"),
        );
        let consumed = [first.expect("consume"), second.expect("consume")];
        assert_eq!(consumed.iter().filter(|t| t.is_some()).count(), 1);

        let live = repo
            .find_live(user_id, now - Duration::hours(1))
            .await
            .expect("find");
        assert!(live.is_none());
        assert!(repo.consume(user_id, "reset-token").await.expect("consume").is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_consume_requires_matching_user(pool: PgPool) {
        let repo = repository(pool);
        let user_id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        repo.create(user_id, "reset-token", now).await.expect("create");

        let other = repo
            .consume(Uuid::new_v4(), "reset-token")
            .await
            .expect("consume");
        assert!(other.is_none());

        let consumed = repo
            .consume(user_id, "reset-token")
            .await
            .expect("consume")
            .expect("token");
        assert_eq!(consumed.user_id, user_id);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_delete_expired_keeps_recent_tokens(pool: PgPool) {
        let repo = repository(pool);
        let user_id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        repo.create(user_id, "old", now - Duration::hours(2)).await.expect("create");
        repo.create(user_id, "new", now).await.expect("create");

        let deleted = repo
            .delete_expired(now - Duration::hours(1))
            .await
            .expect("delete");
        assert_eq!(deleted, 1);

        let live = repo
            .find_live(user_id, now - Duration::hours(1))
            .await
            .expect("find")
            .expect("token");
        assert_eq!(live.token, "new");
    }
}
