//! # UserRepository
//!
//! ユーザー情報の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **一意性は DB が所有**: メールアドレスの重複は UNIQUE 制約で検出し、
//!   ユースケース層が 409 に変換する
//! - **OAuth ユーザー**: `password_hash` が NULL の行はパスワードログイン不可

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use genbaflow_domain::{
   password::PasswordHash,
   user::{AccountType, Email, PersonName, User, UserId},
};
use sqlx::PgPool;

use crate::error::InfraError;

/// ユーザー作成の入力
///
/// `user_id` は DB の連番が採番するため含まない。
#[derive(Debug)]
pub struct NewUser {
   pub email:         Email,
   pub password_hash: Option<PasswordHash>,
   pub account_type:  AccountType,
   pub first_name:    PersonName,
   pub last_name:     PersonName,
   pub company:       Option<String>,
}

/// ユーザーリポジトリトレイト
///
/// ユーザー情報の永続化操作を定義する。
/// インフラ層で具体的な実装を提供し、ユースケース層から利用する。
#[async_trait]
pub trait UserRepository: Send + Sync {
   /// ユーザーを作成する
   ///
   /// # 戻り値
   ///
   /// - `Ok(user_id)`: 採番されたユーザー ID
   /// - `Err(_)`: データベースエラー（メール重複は UNIQUE 制約違反として返る）
   async fn insert(&self, new_user: &NewUser) -> Result<UserId, InfraError>;

   /// メールアドレスでユーザーを検索する
   async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError>;

   /// OAuth ログイン用: ユーザーを取得、存在しなければ作成する
   ///
   /// 新規作成時のアカウント区分は `production_employee`、
   /// パスワードハッシュと会社名は NULL。
   async fn find_or_create_oauth(
      &self,
      email: &Email,
      first_name: &PersonName,
      last_name: &PersonName,
   ) -> Result<User, InfraError>;
}

/// users テーブルの行
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
   user_id:       i64,
   email:         String,
   password_hash: Option<String>,
   account_type:  String,
   first_name:    String,
   last_name:     String,
   company:       Option<String>,
   created_at:    DateTime<Utc>,
   updated_at:    DateTime<Utc>,
}

impl UserRow {
   /// DB の行をドメインエンティティに変換する
   ///
   /// DB 上の値がドメインのバリデーションを通らない場合は
   /// `InfraError::Unexpected`（スキーマとドメインの不整合）。
   fn into_domain(self) -> Result<User, InfraError> {
      Ok(User::from_db(
         UserId::new(self.user_id),
         Email::new(&self.email).map_err(|e| InfraError::unexpected(e.to_string()))?,
         self.password_hash.map(PasswordHash::new),
         self
            .account_type
            .parse::<AccountType>()
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
         PersonName::new(&self.first_name)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
         PersonName::new(&self.last_name)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
         self.company,
         self.created_at,
         self.updated_at,
      ))
   }
}

const SELECT_USER_COLUMNS: &str = r#"
    SELECT
        user_id,
        email,
        password_hash,
        account_type,
        first_name,
        last_name,
        company,
        created_at,
        updated_at
    FROM users
"#;

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
   pool: PgPool,
}

impl PostgresUserRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
   async fn insert(&self, new_user: &NewUser) -> Result<UserId, InfraError> {
      let account_type: &'static str = new_user.account_type.into();

      let (user_id,): (i64,) = sqlx::query_as(
         r#"
            INSERT INTO users (email, password_hash, account_type, first_name, last_name, company)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING user_id
            "#,
      )
      .bind(new_user.email.as_str())
      .bind(new_user.password_hash.as_ref().map(|h| h.as_str()))
      .bind(account_type)
      .bind(new_user.first_name.as_str())
      .bind(new_user.last_name.as_str())
      .bind(new_user.company.as_deref())
      .fetch_one(&self.pool)
      .await?;

      Ok(UserId::new(user_id))
   }

   async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
      let row: Option<UserRow> =
         sqlx::query_as(&format!("{SELECT_USER_COLUMNS} WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

      row.map(UserRow::into_domain).transpose()
   }

   async fn find_or_create_oauth(
      &self,
      email: &Email,
      first_name: &PersonName,
      last_name: &PersonName,
   ) -> Result<User, InfraError> {
      // 既存ユーザーとの競合は ON CONFLICT DO NOTHING で DB に任せ、
      // その後の SELECT でどちらのケースでも行を取得する
      sqlx::query(
         r#"
            INSERT INTO users (email, account_type, first_name, last_name)
            VALUES ($1, 'production_employee', $2, $3)
            ON CONFLICT (email) DO NOTHING
            "#,
      )
      .bind(email.as_str())
      .bind(first_name.as_str())
      .bind(last_name.as_str())
      .execute(&self.pool)
      .await?;

      let row: UserRow = sqlx::query_as(&format!("{SELECT_USER_COLUMNS} WHERE email = $1"))
         .bind(email.as_str())
         .fetch_one(&self.pool)
         .await?;

      row.into_domain()
   }
}
