use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("認証エラー")]
    Authentication,

    #[error("アカウントが無効化されています")]
    AccountInactive,

    #[error("ユーザーが見つかりません")]
    UserNotFound,

    #[error("無効または期限切れのリンクです")]
    InvalidLink,

    #[error("無効なトークン: {0}")]
    InvalidToken(String),

    #[error("{0}が見つかりません")]
    NotFound(&'static str),

    #[error("競合: {0}")]
    Conflict(String),

    #[error("設定エラー: {0}")]
    Configuration(String),

    #[error("通知送信エラー: {0}")]
    Notification(String),

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),
}

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        Self::Validation(report.to_string())
    }
}

/// JSON ボディの読み取り失敗（形式不正・型不一致・Content-Type 欠落）は 400
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "JSON ボディの読み取りに失敗");
        Self::Validation(format!(
            "リクエストボディが不正です: {}",
            rejection.body_text()
        ))
    }
}

const INTERNAL_ERROR_MESSAGE: &str = "内部エラーが発生しました";

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    message: String,
}

impl AppError {
    /// エラー種別 → (HTTPステータス, クライアント向けメッセージ) の対応表
    ///
    /// 500系の詳細はサーバーログにのみ出力し、クライアントには固定文言を返す
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // 未登録ユーザーとパスワード不一致は同一の応答（アカウント列挙対策）
            Self::Authentication => (
                StatusCode::UNAUTHORIZED,
                "メールアドレスまたはパスワードが正しくありません".to_string(),
            ),
            Self::AccountInactive => (
                StatusCode::FORBIDDEN,
                "このアカウントは無効化されています".to_string(),
            ),
            Self::UserNotFound => (
                StatusCode::BAD_REQUEST,
                "このメールアドレスのユーザーは存在しません".to_string(),
            ),
            // どの段階で失敗したかは返さない
            Self::InvalidLink => (
                StatusCode::BAD_REQUEST,
                "無効または期限切れのリンクです".to_string(),
            ),
            Self::InvalidToken(reason) => {
                tracing::debug!(reason = %reason, "トークン検証失敗");
                (
                    StatusCode::UNAUTHORIZED,
                    "トークンが無効または期限切れです".to_string(),
                )
            }
            Self::NotFound(resource) => (StatusCode::NOT_FOUND, format!("{resource}が見つかりません")),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Configuration(msg) => {
                tracing::error!(error = %msg, "設定エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
            Self::Notification(msg) => {
                tracing::error!(error = %msg, "メール送信エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (
            status,
            Json(ErrorResponse {
                status: status.as_u16(),
                message,
            }),
        )
            .into_response()
    }
}
