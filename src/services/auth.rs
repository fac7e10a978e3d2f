use std::sync::{Arc, LazyLock};

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use time::Duration;

use crate::error::AppError;
use crate::models::Credential;
use crate::repositories::CredentialStore;
use crate::services::token::{SessionClaims, TokenIssuer};

/// タイミング攻撃対策用のダミーハッシュ（ユーザー不在時にも同じコストの検証を行う）
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("venuedesk-timing-equalizer").unwrap_or_default());

/// パスワードをargon2idでハッシュ化
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!(error = ?e, "パスワードハッシュ生成エラー");
            AppError::Internal(anyhow::anyhow!("password hash error"))
        })?;
    Ok(hash.to_string())
}

/// パスワードを検証
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| {
        tracing::error!(error = ?e, "パスワードハッシュのパースエラー");
        AppError::Internal(anyhow::anyhow!("password hash parse error"))
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 認証サービス
#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    token_issuer: TokenIssuer,
    session_ttl: Duration,
}

impl AuthService {
    /// 新しい AuthService を作成
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        token_issuer: TokenIssuer,
        session_ttl: Duration,
    ) -> Self {
        Self {
            credentials,
            token_issuer,
            session_ttl,
        }
    }

    /// ログインしてセッショントークンを発行
    ///
    /// 処理フロー:
    /// 1. 入力チェック（空欄は ValidationError）
    /// 2. 認証情報の照合（不在・不一致は同じ AuthenticationError）
    /// 3. 無効化アカウントは AccountInactive（パスワード照合後に判定）
    /// 4. トークン発行
    pub async fn login(&self, identity: &str, password: &str) -> Result<String, AppError> {
        let identity = identity.trim();
        if identity.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "メールアドレスとパスワードは必須です".to_string(),
            ));
        }

        let credential = self.authenticate(identity, password).await?;

        if !credential.active {
            tracing::warn!(user_id = %credential.id, "ログイン拒否: 無効化アカウント");
            return Err(AppError::AccountInactive);
        }

        let token = self
            .token_issuer
            .issue(SessionClaims::from(&credential), self.session_ttl)?;

        tracing::info!(user_id = %credential.id, role = %credential.role, "ログイン成功");

        Ok(token)
    }

    /// ユーザー認証を実行
    ///
    /// タイミング攻撃対策: ユーザーが存在しない場合もダミーのパスワード検証を実行
    async fn authenticate(&self, identity: &str, password: &str) -> Result<Credential, AppError> {
        let credential = self.credentials.find_by_email(identity).await?;

        match credential {
            Some(credential) => {
                if verify_password(password, &credential.password_hash)? {
                    Ok(credential)
                } else {
                    tracing::warn!(identity = %identity, "認証失敗: パスワード不一致");
                    Err(AppError::Authentication)
                }
            }
            None => {
                let _ = verify_password(password, &DUMMY_HASH);
                tracing::warn!(identity = %identity, "認証失敗: ユーザー不在");
                Err(AppError::Authentication)
            }
        }
    }
}
