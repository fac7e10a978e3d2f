use secrecy::{ExposeSecret, SecretBox};
use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: SecretBox<String>,
    /// セッショントークン署名用シークレット（HS256）
    pub jwt_secret: SecretBox<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_database_acquire_timeout_secs")]
    pub database_acquire_timeout_secs: u64,

    /// パスワードリセットリンクのベースURL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    // トークン設定
    #[serde(default = "default_session_token_ttl_secs")]
    pub session_token_ttl_secs: i64,
    #[serde(default = "default_password_reset_token_ttl_secs")]
    pub password_reset_token_ttl_secs: i64,
    #[serde(default = "default_reset_token_sweep_interval_secs")]
    pub reset_token_sweep_interval_secs: u64,

    /// カンマ区切りの許可オリジン（"*" で全許可）
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: String,

    // SMTP設定（オプション - email機能有効時のみ使用）
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<SecretBox<String>>,
    pub smtp_password: Option<SecretBox<String>>,
    #[serde(default)]
    pub smtp_from_address: Option<String>,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BASE_URL: &str = "http://localhost:3001";
const DEFAULT_SESSION_TOKEN_TTL_SECS: i64 = 3600;
const DEFAULT_PASSWORD_RESET_TOKEN_TTL_SECS: i64 = 3600;
const DEFAULT_RESET_TOKEN_SWEEP_INTERVAL_SECS: u64 = 300;
const DEFAULT_CORS_ALLOWED_ORIGINS: &str = "*";
const DEFAULT_SMTP_PORT: u16 = 465;

/// セッショントークンTTLの許容範囲（10分〜60分）
const SESSION_TOKEN_TTL_RANGE_SECS: std::ops::RangeInclusive<i64> = 600..=3600;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_database_max_connections() -> u32 {
    DEFAULT_DATABASE_MAX_CONNECTIONS
}

fn default_database_acquire_timeout_secs() -> u64 {
    DEFAULT_DATABASE_ACQUIRE_TIMEOUT_SECS
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_session_token_ttl_secs() -> i64 {
    DEFAULT_SESSION_TOKEN_TTL_SECS
}

fn default_password_reset_token_ttl_secs() -> i64 {
    DEFAULT_PASSWORD_RESET_TOKEN_TTL_SECS
}

fn default_reset_token_sweep_interval_secs() -> u64 {
    DEFAULT_RESET_TOKEN_SWEEP_INTERVAL_SECS
}

fn default_cors_allowed_origins() -> String {
    DEFAULT_CORS_ALLOWED_ORIGINS.to_string()
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// 起動前の設定検証
    ///
    /// 署名シークレットや接続文字列が欠けた状態ではトラフィックを受け付けない
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt_secret.expose_secret().trim().is_empty() {
            return Err(AppError::Configuration(
                "JWT_SECRET が設定されていません".to_string(),
            ));
        }
        if self.database_url.expose_secret().trim().is_empty() {
            return Err(AppError::Configuration(
                "DATABASE_URL が設定されていません".to_string(),
            ));
        }
        if !SESSION_TOKEN_TTL_RANGE_SECS.contains(&self.session_token_ttl_secs) {
            return Err(AppError::Configuration(format!(
                "SESSION_TOKEN_TTL_SECS は {}〜{} の範囲で指定してください",
                SESSION_TOKEN_TTL_RANGE_SECS.start(),
                SESSION_TOKEN_TTL_RANGE_SECS.end()
            )));
        }
        if self.password_reset_token_ttl_secs <= 0 {
            return Err(AppError::Configuration(
                "PASSWORD_RESET_TOKEN_TTL_SECS は正の値で指定してください".to_string(),
            ));
        }
        if self.reset_token_sweep_interval_secs == 0 {
            return Err(AppError::Configuration(
                "RESET_TOKEN_SWEEP_INTERVAL_SECS は正の値で指定してください".to_string(),
            ));
        }
        Ok(())
    }

    pub fn database_acquire_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.database_acquire_timeout_secs)
    }

    pub fn session_token_ttl(&self) -> time::Duration {
        time::Duration::seconds(self.session_token_ttl_secs)
    }

    pub fn password_reset_token_ttl(&self) -> time::Duration {
        time::Duration::seconds(self.password_reset_token_ttl_secs)
    }
}
