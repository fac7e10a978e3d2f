use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::handlers::AppJson;
use crate::state::AppState;

/// ログインリクエスト
///
/// 欠けたフィールドは空文字として扱い、サービス側で ValidationError にする
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// メールアドレス（`email` / `user` も受け付ける）
    #[serde(default, alias = "email", alias = "user")]
    pub identity: String,
    #[serde(default)]
    pub password: String,
}

/// ログインレスポンス
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// セッショントークン（Bearer で使用）
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginCheckResponse {
    pub message: &'static str,
}

/// ログインハンドラー
///
/// POST /api/login
///
/// 処理フロー:
/// 1. 入力チェック
/// 2. 認証情報の照合
/// 3. セッショントークンを返却
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let token = state
        .auth_service
        .login(&request.identity, &request.password)
        .await?;

    Ok(Json(LoginResponse { token }))
}

/// GET /api/login/check
pub async fn check_login() -> Json<LoginCheckResponse> {
    Json(LoginCheckResponse {
        message: "ログインルートは稼働中です",
    })
}
