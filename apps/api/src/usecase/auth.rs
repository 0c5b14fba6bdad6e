//! # 認証ユースケース
//!
//! サインアップ、パスワードログイン、Google OAuth ログインの
//! ビジネスロジックを実装する。
//!
//! ## タイミング攻撃対策
//!
//! パスワード検証では、ユーザーが存在しない場合・パスワードハッシュを
//! 持たない場合もダミーハッシュで検証を実行し、処理時間を均一化する。

use std::sync::Arc;

use async_trait::async_trait;
use genbaflow_domain::{
   clock::Clock,
   password::PlainPassword,
   user::{AccountType, Email, PersonName, User},
};
use genbaflow_infra::{
   OAuthProvider,
   PasswordHasher,
   TokenService,
   repository::{NewUser, UserRepository},
};

use crate::error::ApiError;

/// ログイン失敗時の共通メッセージ
///
/// ユーザーの存在有無を漏らさないよう、原因によらず同一の文言を返す。
const LOGIN_FAILED: &str = "メールアドレスまたはパスワードが正しくありません";

/// サインアップの入力
#[derive(Debug)]
pub struct SignupInput {
   pub first_name:   String,
   pub last_name:    String,
   pub email:        String,
   pub company:      String,
   pub password:     String,
   pub account_type: Option<String>,
}

/// ログイン結果のユーザー情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
   pub user_id:      i64,
   pub email:        String,
   pub first_name:   String,
   pub last_name:    String,
   pub account_type: String,
}

/// ログイン結果
#[derive(Debug, Clone)]
pub struct LoginOutput {
   pub token: String,
   pub user:  AuthenticatedUser,
}

/// 認証ユースケースのトレイト
#[async_trait]
pub trait AuthUseCase: Send + Sync {
   /// ユーザーを新規作成する
   ///
   /// # 戻り値
   ///
   /// 採番されたユーザー ID。
   async fn signup(&self, input: SignupInput) -> Result<i64, ApiError>;

   /// メールアドレスとパスワードでログインする
   async fn login(&self, email: &str, password: &str) -> Result<LoginOutput, ApiError>;

   /// OAuth 認可エンドポイントへのリダイレクト URL を返す
   ///
   /// # Errors
   ///
   /// OAuth が設定されていない場合は `ServiceUnavailable`。
   fn authorization_url(&self, redirect_uri: &str) -> Result<String, ApiError>;

   /// OAuth コールバックを処理し、ログイン結果を返す
   ///
   /// コードをアクセストークンに交換し、ユーザー情報を取得して
   /// ユーザーを取得または作成する。
   async fn oauth_callback(
      &self,
      code: &str,
      redirect_uri: &str,
   ) -> Result<LoginOutput, ApiError>;
}

/// 認証ユースケースの実装
pub struct AuthUseCaseImpl {
   user_repository: Arc<dyn UserRepository>,
   password_hasher: Arc<dyn PasswordHasher>,
   token_service:   Arc<dyn TokenService>,
   oauth_provider:  Option<Arc<dyn OAuthProvider>>,
   clock:           Arc<dyn Clock>,
}

impl AuthUseCaseImpl {
   /// 新しいユースケースインスタンスを作成
   pub fn new(
      user_repository: Arc<dyn UserRepository>,
      password_hasher: Arc<dyn PasswordHasher>,
      token_service: Arc<dyn TokenService>,
      oauth_provider: Option<Arc<dyn OAuthProvider>>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         user_repository,
         password_hasher,
         token_service,
         oauth_provider,
         clock,
      }
   }

   /// トークンを発行してログイン結果を組み立てる
   fn build_login_output(&self, user: &User) -> Result<LoginOutput, ApiError> {
      let token = self.token_service.issue(
         user.id(),
         user.email(),
         user.account_type(),
         self.clock.now(),
      )?;

      Ok(LoginOutput {
         token,
         user: AuthenticatedUser {
            user_id:      user.id().as_i64(),
            email:        user.email().as_str().to_string(),
            first_name:   user.first_name().as_str().to_string(),
            last_name:    user.last_name().as_str().to_string(),
            account_type: user.account_type().to_string(),
         },
      })
   }
}

#[async_trait]
impl AuthUseCase for AuthUseCaseImpl {
   async fn signup(&self, input: SignupInput) -> Result<i64, ApiError> {
      let email = Email::new(input.email)?;
      let password = PlainPassword::validated(input.password)?;
      let first_name = PersonName::new(input.first_name)?;
      let last_name = PersonName::new(input.last_name)?;

      if input.company.trim().chars().count() < 3 {
         return Err(ApiError::BadRequest(
            "会社名は3文字以上で入力してください".to_string(),
         ));
      }

      let account_type = match input.account_type {
         Some(raw) => raw.parse::<AccountType>()?,
         None => AccountType::default(),
      };

      let password_hash = self.password_hasher.hash(&password)?;

      let new_user = NewUser {
         email,
         password_hash: Some(password_hash),
         account_type,
         first_name,
         last_name,
         company: Some(input.company.trim().to_string()),
      };

      let user_id = self.user_repository.insert(&new_user).await.map_err(|e| {
         // メールアドレス重複は UNIQUE 制約違反として返る
         if e.unique_violation_constraint() == Some("users_email_key") {
            ApiError::Conflict("このメールアドレスは既に登録されています".to_string())
         } else {
            ApiError::from(e)
         }
      })?;

      Ok(user_id.as_i64())
   }

   async fn login(&self, email: &str, password: &str) -> Result<LoginOutput, ApiError> {
      let email = Email::new(email)?;
      let password = PlainPassword::new(password);

      let Some(user) = self.user_repository.find_by_email(&email).await? else {
         // ユーザー不在でも処理時間を均一化する
         self.password_hasher.dummy_verify(&password);
         return Err(ApiError::Unauthorized(LOGIN_FAILED.to_string()));
      };

      let Some(hash) = user.password_hash() else {
         // OAuth 専用アカウント。存在を漏らさないため同じ失敗にする
         self.password_hasher.dummy_verify(&password);
         return Err(ApiError::Unauthorized(LOGIN_FAILED.to_string()));
      };

      let result = self.password_hasher.verify(&password, hash)?;
      if result.is_mismatch() {
         return Err(ApiError::Unauthorized(LOGIN_FAILED.to_string()));
      }

      self.build_login_output(&user)
   }

   fn authorization_url(&self, redirect_uri: &str) -> Result<String, ApiError> {
      let provider = self.oauth_provider.as_ref().ok_or_else(|| {
         ApiError::ServiceUnavailable("OAuth が設定されていません".to_string())
      })?;

      Ok(provider.authorization_url(redirect_uri))
   }

   async fn oauth_callback(
      &self,
      code: &str,
      redirect_uri: &str,
   ) -> Result<LoginOutput, ApiError> {
      let provider = self.oauth_provider.as_ref().ok_or_else(|| {
         ApiError::ServiceUnavailable("OAuth が設定されていません".to_string())
      })?;

      let access_token = provider.exchange_code(code, redirect_uri).await?;
      let userinfo = provider.fetch_userinfo(&access_token).await?;

      let (Some(email), Some(given_name), Some(family_name)) =
         (userinfo.email, userinfo.given_name, userinfo.family_name)
      else {
         return Err(ApiError::BadRequest(
            "ユーザー情報が不完全です".to_string(),
         ));
      };

      let email = Email::new(email)?;
      let first_name = PersonName::new(given_name)?;
      let last_name = PersonName::new(family_name)?;

      let user = self
         .user_repository
         .find_or_create_oauth(&email, &first_name, &last_name)
         .await?;

      self.build_login_output(&user)
   }
}
