use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// `Authorization: Bearer <token>` を検証し、クレームをリクエスト拡張に格納する
///
/// ヘッダー欠落・形式不正・トークン不正はすべて 401
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::InvalidToken("missing bearer token".to_string()))?;

    let claims = state.token_issuer.verify(token)?;
    tracing::debug!(user_id = %claims.session.sub, path = %request.uri().path(), "認証済みリクエスト");

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
