use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::AppError;
use crate::models::Credential;

/// 署名アルゴリズム（固定。ヘッダーで別アルゴリズムを指定したトークンは拒否）
const ALGORITHM: Algorithm = Algorithm::HS256;

/// セッショントークンに載せるユーザー情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// 認証情報ID
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<&Credential> for SessionClaims {
    fn from(credential: &Credential) -> Self {
        Self {
            sub: credential.id,
            email: credential.email.clone(),
            name: credential.name.clone(),
            role: credential.role.clone(),
        }
    }
}

/// 検証済みトークンのクレーム一式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub session: SessionClaims,
    /// 発行時刻（Unix秒）
    pub iat: i64,
    /// 有効期限（Unix秒）
    pub exp: i64,
}

/// セッショントークン発行・検証
///
/// ステートレス（失効リストなし）。有効性は署名と有効期限のみで判定する。
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// 新しい TokenIssuer を作成
    ///
    /// 署名シークレットが空の場合は設定エラー（署名なしトークンは発行しない）
    pub fn new(secret: &str, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        if secret.trim().is_empty() {
            return Err(AppError::Configuration(
                "署名シークレットが設定されていません".to_string(),
            ));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            clock,
        })
    }

    /// セッショントークンを発行
    pub fn issue(&self, claims: SessionClaims, ttl: Duration) -> Result<String, AppError> {
        if ttl.whole_seconds() <= 0 {
            return Err(AppError::Configuration(
                "トークンの有効期間は1秒以上で指定してください".to_string(),
            ));
        }

        let issued_at = self.clock.now().unix_timestamp();
        let claims = Claims {
            session: claims,
            iat: issued_at,
            exp: issued_at + ttl.whole_seconds(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = ?e, "トークン署名エラー");
            AppError::Internal(anyhow::anyhow!("token encode error"))
        })
    }

    /// トークンを検証してクレームを返す
    ///
    /// # Errors
    /// 署名不正・形式不正・アルゴリズム不一致・期限切れはすべて `InvalidToken`
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(ALGORITHM);
        // 有効期限は注入された Clock で判定する
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::InvalidToken(e.to_string()))?;

        if self.clock.now().unix_timestamp() >= data.claims.exp {
            return Err(AppError::InvalidToken("expired".to_string()));
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::testing::ManualClock;

    const SECRET: &str = "test_secret_key_at_least_32_bytes!";

    fn session_claims() -> SessionClaims {
        SessionClaims {
            sub: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            name: "System Administrator".to_string(),
            role: "admin".to_string(),
        }
    }

    fn issuer_with(clock: Arc<dyn Clock>) -> TokenIssuer {
        TokenIssuer::new(SECRET, clock).expect("issuer")
    }

    #[test]
    fn test_empty_secret_is_configuration_error() {
        let result = TokenIssuer::new("", Arc::new(SystemClock));
        assert!(matches!(result, Err(AppError::Configuration(_))));

        let result = TokenIssuer::new("   ", Arc::new(SystemClock));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_issue_then_verify_returns_same_claims() {
        let issuer = issuer_with(Arc::new(SystemClock));

        for ttl in [Duration::seconds(1), Duration::minutes(10), Duration::hours(1)] {
            let claims = session_claims();
            let token = issuer.issue(claims.clone(), ttl).expect("issue");
            let verified = issuer.verify(&token).expect("verify");

            assert_eq!(verified.session, claims);
            assert_eq!(verified.exp - verified.iat, ttl.whole_seconds());
        }
    }

    #[test]
    fn test_non_positive_ttl_is_rejected() {
        let issuer = issuer_with(Arc::new(SystemClock));
        assert!(issuer.issue(session_claims(), Duration::ZERO).is_err());
        assert!(issuer.issue(session_claims(), Duration::milliseconds(500)).is_err());
    }

    #[test]
    fn test_verify_fails_after_ttl() {
        let clock = Arc::new(ManualClock::starting_now());
        let issuer = issuer_with(clock.clone());

        let token = issuer
            .issue(session_claims(), Duration::minutes(10))
            .expect("issue");

        clock.advance(Duration::minutes(9));
        assert!(issuer.verify(&token).is_ok());

        clock.advance(Duration::minutes(1));
        assert!(matches!(
            issuer.verify(&token),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        let issuer = issuer_with(Arc::new(SystemClock));
        let other = TokenIssuer::new("another_secret_key_at_least_32_bytes", Arc::new(SystemClock))
            .expect("issuer");

        let token = other
            .issue(session_claims(), Duration::minutes(10))
            .expect("issue");
        assert!(matches!(
            issuer.verify(&token),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_verify_rejects_other_algorithm() {
        let issuer = issuer_with(Arc::new(SystemClock));
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            session: session_claims(),
            iat: now,
            exp: now + 600,
        };

        // 同じシークレットでも HS384 署名は拒否される
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("encode");

        assert!(matches!(
            issuer.verify(&token),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_and_tampered() {
        let issuer = issuer_with(Arc::new(SystemClock));
        assert!(issuer.verify("invalid.token.here").is_err());
        assert!(issuer.verify("").is_err());

        let token = issuer
            .issue(session_claims(), Duration::minutes(10))
            .expect("issue");
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(issuer.verify(&tampered).is_err());
    }
}
