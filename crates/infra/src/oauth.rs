//! # Google OAuth2 クライアント
//!
//! Google の OpenID Connect ディスカバリ文書から各エンドポイントを解決し、
//! 認可コードのアクセストークンへの交換とユーザー情報の取得を行う。
//!
//! ## フロー
//!
//! 1. 起動時に [`GoogleOAuthProvider::discover`] でエンドポイントを解決
//! 2. `/api/auth/login` が [`OAuthProvider::authorization_url`] へリダイレクト
//! 3. コールバックで [`OAuthProvider::exchange_code`] →
//!    [`OAuthProvider::fetch_userinfo`]

use async_trait::async_trait;
use serde::Deserialize;

use crate::InfraError;

/// Google の OpenID Connect ディスカバリ文書 URL（デフォルト）
pub const GOOGLE_DISCOVERY_URL: &str =
   "https://accounts.google.com/.well-known/openid-configuration";

/// OAuth プロバイダから取得したユーザー情報
///
/// email / given_name / family_name のいずれかが欠けている場合、
/// 呼び出し側は 400 を返す（アカウント作成に必須のため）。
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthUserInfo {
   pub email:       Option<String>,
   pub given_name:  Option<String>,
   pub family_name: Option<String>,
}

/// OAuth2 認可コードフローを担当するトレイト
///
/// テストではスタブ実装に差し替える。
#[async_trait]
pub trait OAuthProvider: Send + Sync {
   /// 認可エンドポイントへのリダイレクト URL を構築する
   fn authorization_url(&self, redirect_uri: &str) -> String;

   /// 認可コードをアクセストークンに交換する
   ///
   /// # Errors
   ///
   /// - プロバイダがエラーを返した場合は `InfraError::InvalidInput`
   ///   （原因はクライアントが持ち込んだコードにある）
   /// - 通信自体の失敗は `InfraError::Http`
   async fn exchange_code(&self, code: &str, redirect_uri: &str)
   -> Result<String, InfraError>;

   /// アクセストークンでユーザー情報を取得する
   async fn fetch_userinfo(&self, access_token: &str) -> Result<OAuthUserInfo, InfraError>;
}

/// ディスカバリ文書のうち使用するフィールド
#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
   authorization_endpoint: String,
   token_endpoint:         String,
   userinfo_endpoint:      String,
}

/// トークンエンドポイントのレスポンス
#[derive(Debug, Deserialize)]
struct TokenResponse {
   access_token: String,
}

/// Google OAuth2 の実装
pub struct GoogleOAuthProvider {
   client:                 reqwest::Client,
   client_id:              String,
   client_secret:          String,
   authorization_endpoint: String,
   token_endpoint:         String,
   userinfo_endpoint:      String,
}

impl GoogleOAuthProvider {
   /// ディスカバリ文書を取得してプロバイダを作成する
   ///
   /// アプリケーション起動時に一度だけ呼び出す。
   pub async fn discover(
      client_id: impl Into<String>,
      client_secret: impl Into<String>,
      discovery_url: &str,
   ) -> Result<Self, InfraError> {
      let client = reqwest::Client::new();
      let doc: DiscoveryDocument = client
         .get(discovery_url)
         .send()
         .await?
         .error_for_status()?
         .json()
         .await?;

      Ok(Self {
         client,
         client_id: client_id.into(),
         client_secret: client_secret.into(),
         authorization_endpoint: doc.authorization_endpoint,
         token_endpoint: doc.token_endpoint,
         userinfo_endpoint: doc.userinfo_endpoint,
      })
   }
}

#[async_trait]
impl OAuthProvider for GoogleOAuthProvider {
   fn authorization_url(&self, redirect_uri: &str) -> String {
      let params = [
         ("client_id", self.client_id.as_str()),
         ("redirect_uri", redirect_uri),
         ("scope", "openid email profile"),
         ("response_type", "code"),
         ("access_type", "offline"),
         ("prompt", "consent"),
      ];

      let query = params
         .iter()
         .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
         .collect::<Vec<_>>()
         .join("&");

      format!("{}?{}", self.authorization_endpoint, query)
   }

   async fn exchange_code(
      &self,
      code: &str,
      redirect_uri: &str,
   ) -> Result<String, InfraError> {
      let params = [
         ("code", code),
         ("client_id", self.client_id.as_str()),
         ("client_secret", self.client_secret.as_str()),
         ("redirect_uri", redirect_uri),
         ("grant_type", "authorization_code"),
      ];

      let response = self
         .client
         .post(&self.token_endpoint)
         .form(&params)
         .send()
         .await?;

      if !response.status().is_success() {
         let status = response.status();
         let body = response.text().await.unwrap_or_default();
         tracing::warn!(%status, %body, "トークンの取得に失敗しました");
         return Err(InfraError::invalid_input(
            "トークンの取得に失敗しました".to_string(),
         ));
      }

      let token: TokenResponse = response.json().await?;
      Ok(token.access_token)
   }

   async fn fetch_userinfo(&self, access_token: &str) -> Result<OAuthUserInfo, InfraError> {
      let response = self
         .client
         .get(&self.userinfo_endpoint)
         .bearer_auth(access_token)
         .send()
         .await?;

      if !response.status().is_success() {
         let status = response.status();
         tracing::warn!(%status, "ユーザー情報の取得に失敗しました");
         return Err(InfraError::invalid_input(
            "ユーザー情報の取得に失敗しました".to_string(),
         ));
      }

      Ok(response.json().await?)
   }
}
