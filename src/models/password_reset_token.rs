use serde::Serialize;
use sqlx::FromRow;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// パスワードリセットトークン
///
/// 1ユーザーにつき有効なトークンは最大1件。使用時に削除される。
/// user_id は credentials への弱参照（外部キーなし）
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip)]
    pub token: String,
    pub created_at: OffsetDateTime,
}

impl PasswordResetToken {
    /// 発行時刻 + TTL を過ぎていれば期限切れ
    pub fn is_expired(&self, now: OffsetDateTime, ttl: Duration) -> bool {
        now > self.created_at + ttl
    }
}
