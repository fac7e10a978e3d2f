use axum::extract::{Path, State};
use serde::Deserialize;

use crate::error::AppError;
use crate::handlers::AppJson;
use crate::state::AppState;

// === リセットリクエスト ===

#[derive(Debug, Deserialize)]
pub struct ResetRequestRequest {
    #[serde(default)]
    pub email: String,
}

/// POST /api/password-reset
///
/// 登録済みメールアドレスにリセットリンクを送信する
pub async fn request_password_reset(
    State(state): State<AppState>,
    AppJson(request): AppJson<ResetRequestRequest>,
) -> Result<&'static str, AppError> {
    state
        .password_reset_service
        .request_reset(&request.email)
        .await?;

    Ok("パスワードリセット用のリンクをメールで送信しました")
}

// === パスワードリセット実行 ===

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
}

/// POST /api/password-reset/{user_id}/{token}
///
/// # Security
/// - token, password はログに出力しない
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Path((user_id, token)): Path<(String, String)>,
    AppJson(request): AppJson<ResetPasswordRequest>,
) -> Result<&'static str, AppError> {
    state
        .password_reset_service
        .confirm_reset(&user_id, &token, &request.password)
        .await?;

    Ok("パスワードを更新しました")
}
