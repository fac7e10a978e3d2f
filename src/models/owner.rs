use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "owner_status", rename_all = "lowercase")]
pub enum OwnerStatus {
    #[default]
    Active,
    Inactive,
}

/// 物件オーナー
#[derive(Debug, Clone, FromRow)]
pub struct Owner {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// 本人確認番号（一意）
    pub identification: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: OwnerStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Owner {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// 登録用（正規化済み）
#[derive(Debug, Clone)]
pub struct NewOwner {
    pub first_name: String,
    pub last_name: String,
    pub identification: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: OwnerStatus,
}

/// 部分更新用（None のフィールドは変更しない）
#[derive(Debug, Clone, Default)]
pub struct OwnerChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub identification: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<OwnerStatus>,
}

impl OwnerChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.identification.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.status.is_none()
    }
}
