use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// ログイン用の認証情報
///
/// email は小文字に正規化して保存される（大文字小文字を区別せず一意）
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Credential {
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
