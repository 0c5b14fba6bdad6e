//! # 認証ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/auth/login` - メール/パスワードでログインし JWT を返す
//! - `GET /api/auth/login` - Google OAuth2 認可エンドポイントへリダイレクト
//! - `GET /api/auth/callback` - OAuth2 コールバック。JWT を Cookie に設定して
//!   フロントエンドへリダイレクト

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    middleware::auth::AUTH_COOKIE_NAME,
    usecase::AuthUseCase,
};

/// 認証ハンドラの共有状態
pub struct AuthState {
    pub usecase:      Arc<dyn AuthUseCase>,
    /// OAuth 後のリダイレクト先（フロントエンド）
    pub frontend_url: String,
    /// OAuth の redirect_uri（この API のコールバック URL）
    pub redirect_uri: String,
}

// --- リクエスト/レスポンス型 ---

/// ログインリクエスト
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email:    String,
    pub password: String,
}

/// ログインレスポンス内のユーザー情報
#[derive(Debug, Serialize)]
pub struct LoginUserDto {
    pub user_id:      i64,
    pub email:        String,
    pub first_name:   String,
    pub last_name:    String,
    pub account_type: String,
}

/// ログインレスポンス
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user:  LoginUserDto,
}

/// OAuth コールバックのクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

// --- ハンドラ ---

/// POST /api/auth/login
///
/// メールアドレスとパスワードでログインする。
///
/// ## レスポンス
///
/// - `200 OK`: JWT とユーザー情報
/// - `401 Unauthorized`: 認証失敗（原因は文言で区別しない）
pub async fn login(
    State(state): State<Arc<AuthState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let output = state.usecase.login(&req.email, &req.password).await?;

    Ok(Json(genbaflow_shared::ApiResponse::new(LoginResponse {
        token: output.token,
        user:  LoginUserDto {
            user_id:      output.user.user_id,
            email:        output.user.email,
            first_name:   output.user.first_name,
            last_name:    output.user.last_name,
            account_type: output.user.account_type,
        },
    })))
}

/// GET /api/auth/login
///
/// Google OAuth2 の認可エンドポイントへリダイレクトする。
///
/// ## レスポンス
///
/// - `307 Temporary Redirect`: 認可エンドポイントへ
/// - `503 Service Unavailable`: OAuth 未設定
pub async fn oauth_login(
    State(state): State<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let url = state.usecase.authorization_url(&state.redirect_uri)?;
    Ok(Redirect::temporary(&url))
}

/// GET /api/auth/callback
///
/// 認可コードを受け取り、JWT を `authToken` Cookie に設定して
/// フロントエンドのダッシュボードへリダイレクトする。
///
/// ## レスポンス
///
/// - `307 Temporary Redirect`: `{FRONTEND_URL}/dashboard` へ
/// - `400 Bad Request`: コード欠落・交換失敗・ユーザー情報不完全
/// - `503 Service Unavailable`: OAuth 未設定
pub async fn oauth_callback(
    State(state): State<Arc<AuthState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let Some(code) = query.code else {
        return Err(ApiError::BadRequest("認可コードがありません".to_string()));
    };

    let output = state
        .usecase
        .oauth_callback(&code, &state.redirect_uri)
        .await?;

    let cookie = Cookie::build((AUTH_COOKIE_NAME, output.token))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(4))
        .path("/")
        .build();

    let destination = format!(
        "{}/dashboard",
        state.frontend_url.trim_end_matches('/')
    );

    Ok((jar.add(cookie), Redirect::temporary(&destination)))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
        routing::{get, post},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::usecase::{LoginOutput, SignupInput, auth::AuthenticatedUser};

    // テスト用スタブ
    struct StubAuthUseCase {
        login_succeeds: bool,
        oauth_configured: bool,
    }

    impl StubAuthUseCase {
        fn login_output() -> LoginOutput {
            LoginOutput {
                token: "issued-token".to_string(),
                user:  AuthenticatedUser {
                    user_id:      1,
                    email:        "worker@example.com".to_string(),
                    first_name:   "Taro".to_string(),
                    last_name:    "Yamada".to_string(),
                    account_type: "production_employee".to_string(),
                },
            }
        }
    }

    #[async_trait]
    impl AuthUseCase for StubAuthUseCase {
        async fn signup(&self, _input: SignupInput) -> Result<i64, ApiError> {
            unimplemented!("このテストでは使用しない")
        }

        async fn login(
            &self,
            _email: &str,
            _password: &str,
        ) -> Result<LoginOutput, ApiError> {
            if self.login_succeeds {
                Ok(Self::login_output())
            } else {
                Err(ApiError::Unauthorized(
                    "メールアドレスまたはパスワードが正しくありません".to_string(),
                ))
            }
        }

        fn authorization_url(&self, redirect_uri: &str) -> Result<String, ApiError> {
            if self.oauth_configured {
                Ok(format!(
                    "https://accounts.google.com/o/oauth2/v2/auth?redirect_uri={redirect_uri}"
                ))
            } else {
                Err(ApiError::ServiceUnavailable(
                    "OAuth が設定されていません".to_string(),
                ))
            }
        }

        async fn oauth_callback(
            &self,
            code: &str,
            _redirect_uri: &str,
        ) -> Result<LoginOutput, ApiError> {
            if code == "good-code" {
                Ok(Self::login_output())
            } else {
                Err(ApiError::BadRequest(
                    "トークンの取得に失敗しました".to_string(),
                ))
            }
        }
    }

    fn create_test_app(usecase: StubAuthUseCase) -> Router {
        let state = Arc::new(AuthState {
            usecase:      Arc::new(usecase),
            frontend_url: "https://front.example.com".to_string(),
            redirect_uri: "https://api.example.com/api/auth/callback".to_string(),
        });

        Router::new()
            .route("/api/auth/login", post(login).get(oauth_login))
            .route("/api/auth/callback", get(oauth_callback))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_login_成功でトークンを返す() {
        // Given
        let sut = create_test_app(StubAuthUseCase {
            login_succeeds:   true,
            oauth_configured: true,
        });

        let body = serde_json::json!({
            "email": "worker@example.com",
            "password": "Passw0rd!"
        });

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap();

        // When
        let response = sut.oneshot(request).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["data"]["token"], "issued-token");
        assert_eq!(json["data"]["user"]["email"], "worker@example.com");
    }

    #[tokio::test]
    async fn test_login_認証失敗で401を返す() {
        // Given
        let sut = create_test_app(StubAuthUseCase {
            login_succeeds:   false,
            oauth_configured: true,
        });

        let body = serde_json::json!({
            "email": "worker@example.com",
            "password": "wrong"
        });

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap();

        // When
        let response = sut.oneshot(request).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_oauth_login_認可エンドポイントへリダイレクトする() {
        // Given
        let sut = create_test_app(StubAuthUseCase {
            login_succeeds:   true,
            oauth_configured: true,
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/auth/login")
            .body(Body::empty())
            .unwrap();

        // When
        let response = sut.oneshot(request).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://accounts.google.com/"));
    }

    #[tokio::test]
    async fn test_oauth_login_未設定なら503を返す() {
        // Given
        let sut = create_test_app(StubAuthUseCase {
            login_succeeds:   true,
            oauth_configured: false,
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/auth/login")
            .body(Body::empty())
            .unwrap();

        // When
        let response = sut.oneshot(request).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_callback_成功でcookieを設定しフロントエンドへリダイレクトする() {
        // Given
        let sut = create_test_app(StubAuthUseCase {
            login_succeeds:   true,
            oauth_configured: true,
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/auth/callback?code=good-code")
            .body(Body::empty())
            .unwrap();

        // When
        let response = sut.oneshot(request).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert_eq!(location, "https://front.example.com/dashboard");

        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("authToken=issued-token"));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Secure"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Path=/"));
    }

    #[tokio::test]
    async fn test_callback_コードなしは400を返す() {
        // Given
        let sut = create_test_app(StubAuthUseCase {
            login_succeeds:   true,
            oauth_configured: true,
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/auth/callback")
            .body(Body::empty())
            .unwrap();

        // When
        let response = sut.oneshot(request).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_callback_コード交換失敗は400を返す() {
        // Given
        let sut = create_test_app(StubAuthUseCase {
            login_succeeds:   true,
            oauth_configured: true,
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/auth/callback?code=bad-code")
            .body(Body::empty())
            .unwrap();

        // When
        let response = sut.oneshot(request).await.unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
