use axum::{
    Router, middleware,
    routing::{get, post},
};
use http::header::{REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Router の構築
///
/// オーナー・会場系のルートは Bearer トークン必須
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_allowed_origins);

    let protected = Router::new()
        .route(
            "/api/owners",
            get(handlers::list_owners).post(handlers::create_owner),
        )
        .route(
            "/api/owners/{id}",
            get(handlers::get_owner)
                .patch(handlers::update_owner)
                .delete(handlers::delete_owner),
        )
        .route(
            "/api/venues",
            get(handlers::list_venues).post(handlers::create_venue),
        )
        .route(
            "/api/venues/{id}",
            get(handlers::get_venue).delete(handlers::delete_venue),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/health", get(handlers::health_check))
        // ログイン
        .route("/api/login", post(handlers::login))
        .route("/api/login/check", get(handlers::check_login))
        // パスワードリセット
        .route(
            "/api/password-reset",
            post(handlers::request_password_reset),
        )
        .route(
            "/api/password-reset/health",
            get(handlers::password_reset_health),
        )
        .route(
            "/api/password-reset/{user_id}/{token}",
            post(handlers::confirm_password_reset),
        )
        .merge(protected)
        // セキュリティヘッダー（全レスポンス）
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS 設定（"*" は全許可、それ以外はカンマ区切りのオリジン）
fn build_cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        tracing::warn!("CORS: 全オリジン許可（本番環境では非推奨）");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "CORS: 不正なオリジンを無視");
                None
            }
        })
        .collect();

    tracing::info!(count = origins.len(), "CORS: 許可オリジンを制限");

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
        ])
}
