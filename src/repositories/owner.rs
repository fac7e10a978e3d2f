use uuid::Uuid;

use crate::db::ConnectionManager;
use crate::models::{NewOwner, Owner, OwnerChanges};

/// identification のユニーク制約名
pub const OWNER_IDENTIFICATION_CONSTRAINT: &str = "owners_identification_key";

#[derive(Clone)]
pub struct OwnerRepository {
    db: ConnectionManager,
}

impl OwnerRepository {
    pub fn new(db: ConnectionManager) -> Self {
        Self { db }
    }

    /// 全オーナーを新しい順に取得
    pub async fn list(&self) -> Result<Vec<Owner>, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, Owner>(
            r#"
            SELECT id, first_name, last_name, identification, email, phone, status,
                   created_at, updated_at
            FROM owners
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&pool)
        .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Owner>, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, Owner>(
            r#"
            SELECT id, first_name, last_name, identification, email, phone, status,
                   created_at, updated_at
            FROM owners
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&pool)
        .await
    }

    /// # Errors
    /// - UNIQUE制約違反時: `sqlx::Error::Database` (constraint = "owners_identification_key")
    ///   呼び出し側で `AppError::Conflict` に変換すること
    pub async fn create(&self, owner: &NewOwner) -> Result<Owner, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, Owner>(
            r#"
            INSERT INTO owners (id, first_name, last_name, identification, email, phone, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, first_name, last_name, identification, email, phone, status,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&owner.first_name)
        .bind(&owner.last_name)
        .bind(&owner.identification)
        .bind(&owner.email)
        .bind(&owner.phone)
        .bind(owner.status)
        .fetch_one(&pool)
        .await
    }

    /// 指定フィールドのみ更新（None は現在値を維持）
    pub async fn update(
        &self,
        id: Uuid,
        changes: &OwnerChanges,
    ) -> Result<Option<Owner>, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, Owner>(
            r#"
            UPDATE owners
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                identification = COALESCE($4, identification),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                status = COALESCE($7, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, first_name, last_name, identification, email, phone, status,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.identification)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(changes.status)
        .fetch_optional(&pool)
        .await
    }

    /// # Errors
    /// - 会場が紐付いている場合: 外部キー制約違反 (constraint = "venues_owner_id_fkey")
    pub async fn delete(&self, id: Uuid) -> Result<Option<Owner>, sqlx::Error> {
        let pool = self.db.acquire().await?;
        sqlx::query_as::<_, Owner>(
            r#"
            DELETE FROM owners
            WHERE id = $1
            RETURNING id, first_name, last_name, identification, email, phone, status,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&pool)
        .await
    }
}
