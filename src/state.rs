use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::ConnectionManager;
use crate::error::AppError;
use crate::repositories::{
    CredentialRepository, CredentialStore, OwnerRepository, PasswordResetTokenRepository,
    ResetTokenStore, VenueRepository,
};
use crate::services::{AuthService, EmailService, Mailer, PasswordResetService, TokenIssuer};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// セッショントークン発行・検証
    pub token_issuer: TokenIssuer,
    pub auth_service: AuthService,
    pub password_reset_service: PasswordResetService,
    pub owner_repo: OwnerRepository,
    pub venue_repo: VenueRepository,
}

impl AppState {
    /// 新しい AppState を作成（PostgreSQL・SMTP・システム時計）
    pub fn new(db: ConnectionManager, config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let credentials = Arc::new(CredentialRepository::new(db.clone()));
        let reset_tokens = Arc::new(PasswordResetTokenRepository::new(db.clone()));
        let mailer = Arc::new(EmailService::new(config.clone())?);

        Self::with_collaborators(
            config,
            db,
            credentials,
            reset_tokens,
            mailer,
            Arc::new(SystemClock),
        )
    }

    /// ストア・メーラー・時計を指定して作成
    pub fn with_collaborators(
        config: Arc<Config>,
        db: ConnectionManager,
        credentials: Arc<dyn CredentialStore>,
        reset_tokens: Arc<dyn ResetTokenStore>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let token_issuer = TokenIssuer::new(config.jwt_secret.expose_secret(), clock.clone())?;

        let auth_service = AuthService::new(
            credentials.clone(),
            token_issuer.clone(),
            config.session_token_ttl(),
        );
        let password_reset_service = PasswordResetService::new(
            credentials,
            reset_tokens,
            mailer,
            clock,
            &config.base_url,
            config.password_reset_token_ttl(),
        );

        Ok(Self {
            owner_repo: OwnerRepository::new(db.clone()),
            venue_repo: VenueRepository::new(db),
            config,
            token_issuer,
            auth_service,
            password_reset_service,
        })
    }
}
