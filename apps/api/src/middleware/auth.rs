//! # 認証ミドルウェア
//!
//! JWT を検証し、認証済みユーザーの情報をリクエスト拡張に注入する。
//!
//! トークンは以下の順で探す:
//!
//! 1. `Authorization: Bearer <token>` ヘッダ
//! 2. `authToken` Cookie（OAuth ログインで設定される）
//!
//! ## 使い方
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//!
//! let auth_state = AuthLayerState {
//!     token_service: token_service.clone(),
//! };
//!
//! Router::new()
//!     .route("/api/warehouse/dispatch", post(dispatch_parts))
//!     .layer(from_fn_with_state(auth_state, require_auth))
//! ```

use std::sync::Arc;

use axum::{
   Json,
   body::Body,
   extract::State,
   http::{Request, StatusCode, header},
   middleware::Next,
   response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use genbaflow_infra::{TokenError, TokenService};
use genbaflow_shared::ErrorResponse;

/// OAuth ログインが設定する Cookie 名
pub const AUTH_COOKIE_NAME: &str = "authToken";

/// 認証ミドルウェアの状態
#[derive(Clone)]
pub struct AuthLayerState {
   pub token_service: Arc<dyn TokenService>,
}

/// 認証済みユーザー情報
///
/// ミドルウェアがリクエスト拡張に挿入し、
/// ハンドラは `Extension<CurrentUser>` で取得する。
#[derive(Debug, Clone)]
pub struct CurrentUser {
   pub user_id:      i64,
   pub email:        String,
   pub account_type: String,
}

/// 401 レスポンスを構築する
fn unauthorized_response(detail: impl Into<String>) -> Response {
   (
      StatusCode::UNAUTHORIZED,
      Json(ErrorResponse::unauthorized(detail)),
   )
      .into_response()
}

/// リクエストからトークンを取り出す
///
/// Authorization ヘッダを優先し、なければ Cookie を見る。
fn extract_token(request: &Request<Body>, jar: &CookieJar) -> Option<String> {
   if let Some(value) = request.headers().get(header::AUTHORIZATION) {
      let value = value.to_str().ok()?;
      return value
         .strip_prefix("Bearer ")
         .map(|token| token.to_string());
   }

   jar.get(AUTH_COOKIE_NAME)
      .map(|cookie| cookie.value().to_string())
}

/// 認証ミドルウェア
///
/// トークンを検証し、クレームを [`CurrentUser`] としてリクエスト拡張に挿入する。
/// トークンがない場合・期限切れ・不正な場合は 401 を返す。
pub async fn require_auth(
   State(state): State<AuthLayerState>,
   jar: CookieJar,
   mut request: Request<Body>,
   next: Next,
) -> Response {
   let Some(token) = extract_token(&request, &jar) else {
      return unauthorized_response("トークンがありません");
   };

   let claims = match state.token_service.verify(&token) {
      Ok(claims) => claims,
      Err(TokenError::Expired) => {
         return unauthorized_response("トークンの有効期限が切れています");
      }
      Err(TokenError::Invalid) => {
         return unauthorized_response("トークンが不正です");
      }
   };

   request.extensions_mut().insert(CurrentUser {
      user_id:      claims.user_id,
      email:        claims.email,
      account_type: claims.account_type,
   });

   next.run(request).await
}

#[cfg(test)]
mod tests {
   use axum::{
      Extension,
      Router,
      http::Method,
      middleware::from_fn_with_state,
      routing::get,
   };
   use chrono::{DateTime, Utc};
   use genbaflow_domain::user::{AccountType, Email, UserId};
   use genbaflow_infra::{AccessTokenClaims, InfraError};
   use tower::ServiceExt;

   use super::*;

   /// テスト用スタブ TokenService
   ///
   /// `"valid"` のみを受け入れ、固定のクレームを返す。
   struct StubTokenService;

   impl TokenService for StubTokenService {
      fn issue(
         &self,
         _user_id: UserId,
         _email: &Email,
         _account_type: AccountType,
         _now: DateTime<Utc>,
      ) -> Result<String, InfraError> {
         Ok("valid".to_string())
      }

      fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
         match token {
            "valid" => Ok(AccessTokenClaims {
               user_id:      7,
               email:        "worker@example.com".to_string(),
               account_type: "warehouse_employee".to_string(),
               exp:          4_102_444_800,
            }),
            "expired" => Err(TokenError::Expired),
            _ => Err(TokenError::Invalid),
         }
      }
   }

   /// 注入された CurrentUser をそのまま返すハンドラ
   async fn whoami(Extension(user): Extension<CurrentUser>) -> String {
      format!("{}:{}", user.user_id, user.email)
   }

   fn create_test_app() -> Router {
      let state = AuthLayerState {
         token_service: Arc::new(StubTokenService),
      };

      Router::new()
         .route("/protected", get(whoami))
         .layer(from_fn_with_state(state, require_auth))
   }

   #[tokio::test]
   async fn test_トークンなしは401() {
      let sut = create_test_app();

      let request = Request::builder()
         .method(Method::GET)
         .uri("/protected")
         .body(Body::empty())
         .unwrap();

      let response = sut.oneshot(request).await.unwrap();

      assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
   }

   #[tokio::test]
   async fn test_bearerトークンで認証できる() {
      let sut = create_test_app();

      let request = Request::builder()
         .method(Method::GET)
         .uri("/protected")
         .header("Authorization", "Bearer valid")
         .body(Body::empty())
         .unwrap();

      let response = sut.oneshot(request).await.unwrap();

      assert_eq!(response.status(), StatusCode::OK);

      let body = axum::body::to_bytes(response.into_body(), usize::MAX)
         .await
         .unwrap();
      assert_eq!(&body[..], b"7:worker@example.com");
   }

   #[tokio::test]
   async fn test_cookieトークンで認証できる() {
      let sut = create_test_app();

      let request = Request::builder()
         .method(Method::GET)
         .uri("/protected")
         .header("Cookie", "authToken=valid")
         .body(Body::empty())
         .unwrap();

      let response = sut.oneshot(request).await.unwrap();

      assert_eq!(response.status(), StatusCode::OK);
   }

   #[tokio::test]
   async fn test_期限切れトークンは401() {
      let sut = create_test_app();

      let request = Request::builder()
         .method(Method::GET)
         .uri("/protected")
         .header("Authorization", "Bearer expired")
         .body(Body::empty())
         .unwrap();

      let response = sut.oneshot(request).await.unwrap();

      assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

      let body = axum::body::to_bytes(response.into_body(), usize::MAX)
         .await
         .unwrap();
      let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
      assert_eq!(json["detail"], "トークンの有効期限が切れています");
   }

   #[tokio::test]
   async fn test_不正なトークンは401() {
      let sut = create_test_app();

      let request = Request::builder()
         .method(Method::GET)
         .uri("/protected")
         .header("Authorization", "Bearer garbage")
         .body(Body::empty())
         .unwrap();

      let response = sut.oneshot(request).await.unwrap();

      assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
   }

   #[tokio::test]
   async fn test_bearer以外のスキームは401() {
      let sut = create_test_app();

      let request = Request::builder()
         .method(Method::GET)
         .uri("/protected")
         .header("Authorization", "Basic dXNlcjpwYXNz")
         .body(Body::empty())
         .unwrap();

      let response = sut.oneshot(request).await.unwrap();

      assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
   }
}
