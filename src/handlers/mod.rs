use axum::extract::FromRequest;
use uuid::Uuid;

use crate::error::AppError;

pub mod health;
pub mod login;
pub mod owner;
pub mod password_reset;
pub mod venue;

pub use health::{health_check, password_reset_health};
pub use login::{check_login, login};
pub use owner::{create_owner, delete_owner, get_owner, list_owners, update_owner};
pub use password_reset::{confirm_password_reset, request_password_reset};
pub use venue::{create_venue, delete_venue, get_venue, list_venues};

/// JSON リクエストボディ
///
/// 読み取り失敗も `AppError` の応答形式（400）で返す
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// パスパラメータのIDをパース（不正なら ValidationError）
pub(crate) fn parse_id(value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::Validation("IDの形式が不正です".to_string()))
}

/// 前後の空白を除去し、空なら None
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
