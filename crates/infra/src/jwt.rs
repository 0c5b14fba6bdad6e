//! # JWT 発行・検証
//!
//! アクセストークン（HS256 署名の JWT）の発行と検証を提供する。
//!
//! ## 設計方針
//!
//! - **ステートレス認証**: セッションストアを持たず、トークン自体が認証情報
//! - **有効期限 4 時間**: `exp` クレームで強制
//! - **クレーム**: `user_id`, `email`, `account_type`, `exp`

use chrono::{DateTime, Duration, Utc};
use genbaflow_domain::user::{AccountType, Email, UserId};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::InfraError;

/// トークンの有効期間（4 時間）
const TOKEN_TTL_HOURS: i64 = 4;

/// アクセストークンのクレーム
///
/// JWT のペイロードとしてシリアライズされる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// ユーザー ID
    pub user_id:      i64,
    /// メールアドレス
    pub email:        String,
    /// アカウント区分（snake_case 文字列）
    pub account_type: String,
    /// 有効期限（UNIX タイムスタンプ秒）
    pub exp:          i64,
}

/// トークン検証エラー
///
/// 有効期限切れとそれ以外を区別する。
/// API 層がエラーメッセージの出し分けに使用する。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// 有効期限切れ
    #[error("トークンの有効期限が切れています")]
    Expired,
    /// 署名不正・形式不正など
    #[error("トークンが不正です")]
    Invalid,
}

/// トークンの発行と検証を担当するトレイト
pub trait TokenService: Send + Sync {
    /// アクセストークンを発行する
    ///
    /// 有効期限は `now` + 4 時間。
    fn issue(
        &self,
        user_id: UserId,
        email: &Email,
        account_type: AccountType,
        now: DateTime<Utc>,
    ) -> Result<String, InfraError>;

    /// アクセストークンを検証し、クレームを返す
    fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError>;

    /// トークンの有効期間（秒）
    ///
    /// Cookie の Max-Age 設定に使用する。
    fn ttl_seconds(&self) -> i64 {
        TOKEN_TTL_HOURS * 60 * 60
    }
}

/// HS256 署名による TokenService 実装
pub struct Hs256TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation:   Validation,
}

impl Hs256TokenService {
    /// 共有シークレットからサービスを作成する
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation:   Validation::new(Algorithm::HS256),
        }
    }
}

impl TokenService for Hs256TokenService {
    fn issue(
        &self,
        user_id: UserId,
        email: &Email,
        account_type: AccountType,
        now: DateTime<Utc>,
    ) -> Result<String, InfraError> {
        let claims = AccessTokenClaims {
            user_id:      user_id.as_i64(),
            email:        email.as_str().to_string(),
            account_type: account_type.to_string(),
            exp:          (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };

        jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding_key)
            .map_err(|e| InfraError::unexpected(format!("トークンの発行に失敗しました: {e}")))
    }

    fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn service() -> Hs256TokenService {
        Hs256TokenService::new("test-secret-key")
    }

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[rstest]
    fn test_発行したトークンを検証できる(service: Hs256TokenService, now: DateTime<Utc>) {
        let token = service
            .issue(
                UserId::new(42),
                &Email::new("worker@example.com").unwrap(),
                AccountType::ProductionEmployee,
                now,
            )
            .unwrap();

        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "worker@example.com");
        assert_eq!(claims.account_type, "production_employee");
        assert_eq!(claims.exp, (now + Duration::hours(4)).timestamp());
    }

    #[rstest]
    fn test_期限切れトークンはexpiredエラー(service: Hs256TokenService) {
        // 5 時間前に発行されたトークン（有効期限は 1 時間前）
        let issued_at = Utc::now() - Duration::hours(5);
        let token = service
            .issue(
                UserId::new(1),
                &Email::new("worker@example.com").unwrap(),
                AccountType::ProductionEmployee,
                issued_at,
            )
            .unwrap();

        let result = service.verify(&token);

        assert_eq!(result.unwrap_err(), TokenError::Expired);
    }

    #[rstest]
    fn test_別のシークレットで署名されたトークンはinvalidエラー(now: DateTime<Utc>) {
        let issuer = Hs256TokenService::new("secret-a");
        let verifier = Hs256TokenService::new("secret-b");

        let token = issuer
            .issue(
                UserId::new(1),
                &Email::new("worker@example.com").unwrap(),
                AccountType::ProductionEmployee,
                now,
            )
            .unwrap();

        let result = verifier.verify(&token);

        assert_eq!(result.unwrap_err(), TokenError::Invalid);
    }

    #[rstest]
    fn test_形式不正な文字列はinvalidエラー(service: Hs256TokenService) {
        assert_eq!(
            service.verify("not-a-jwt").unwrap_err(),
            TokenError::Invalid
        );
    }

    #[rstest]
    fn test_有効期間は4時間(service: Hs256TokenService) {
        assert_eq!(service.ttl_seconds(), 4 * 60 * 60);
    }
}
