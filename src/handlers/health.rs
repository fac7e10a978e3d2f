use axum::Json;
use serde::Serialize;

/// ヘルスチェックレスポンス
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// パスワードリセット系ルートのヘルスチェックレスポンス
#[derive(Debug, Serialize)]
pub struct RouteHealthResponse {
    pub status: &'static str,
}

/// ヘルスチェックハンドラー
///
/// GET /api/health
///
/// サービスの稼働状況を返す。
/// ロードバランサーやモニタリングツールから呼び出される。
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/password-reset/health
pub async fn password_reset_health() -> Json<RouteHealthResponse> {
    Json(RouteHealthResponse { status: "ok" })
}
