//! # ユーザー
//!
//! ユーザーエンティティとそれに関連する値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 要件 |
//! |---|------------|------|
//! | [`User`] | ユーザー | パスワード認証または Google OAuth でログインする利用者 |
//! | [`AccountType`] | アカウント区分 | 製造作業者（デフォルト）、倉庫作業者、マネージャー |
//! | [`Email`] | メールアドレス | 全体で一意 |
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: UserId は DB の連番（i64）をラップし、型安全性を確保
//! - **不変性**: エンティティフィールドは不変、取得は getter 経由
//! - **バリデーション**: 値オブジェクトの生成時に検証ロジックを実行
//!
//! OAuth 経由で作成されたユーザーはパスワードハッシュを持たない
//! （`password_hash` が `None`）。

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{DomainError, password::PasswordHash};

/// ユーザー ID（一意識別子）
///
/// データベースの連番（BIGSERIAL）をラップする。
/// Newtype パターンで型安全性を確保。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct UserId(i64);

impl UserId {
    /// 既存の連番からユーザー ID を作成する
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// 内部の i64 値を取得する
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// メールアドレス（値オブジェクト）
///
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `local@domain` の形式で、ドメイン部に `.` を含む
    /// - 最大 255 文字
    ///
    /// # エラー
    ///
    /// バリデーションに失敗した場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        // 基本的な構造検証: local@domain の形式であること
        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 氏名（値オブジェクト）
///
/// ファーストネーム・ラストネームの共通型。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName(String);

impl PersonName {
    /// 氏名を作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない（前後の空白は除去）
    /// - 最大 100 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation("氏名は必須です".to_string()));
        }

        if value.chars().count() > 100 {
            return Err(DomainError::Validation(
                "氏名は100文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PersonName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// アカウント区分
///
/// ユーザーの役割を表現する列挙型。DB には snake_case 文字列で保存する。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccountType {
    /// 製造作業者（サインアップ時のデフォルト）
    ProductionEmployee,
    /// 倉庫作業者
    WarehouseEmployee,
    /// マネージャー
    Manager,
}

impl Default for AccountType {
    fn default() -> Self {
        Self::ProductionEmployee
    }
}

impl std::str::FromStr for AccountType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production_employee" => Ok(Self::ProductionEmployee),
            "warehouse_employee" => Ok(Self::WarehouseEmployee),
            "manager" => Ok(Self::Manager),
            _ => Err(DomainError::Validation(format!(
                "不正なアカウント区分: {}",
                s
            ))),
        }
    }
}

/// ユーザーエンティティ
///
/// システムの利用者を表現する。メール/パスワード認証または
/// Google OAuth 認証でログインする。
///
/// # 不変条件
///
/// - `email` は全体で一意（DB の UNIQUE 制約が強制）
/// - OAuth 経由で作成されたユーザーは `password_hash` が `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: Email,
    password_hash: Option<PasswordHash>,
    account_type: AccountType,
    first_name: PersonName,
    last_name: PersonName,
    company: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// 既存のデータからユーザーを復元する（データベースから取得時）
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: UserId,
        email: Email,
        password_hash: Option<PasswordHash>,
        account_type: AccountType,
        first_name: PersonName,
        last_name: PersonName,
        company: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            password_hash,
            account_type,
            first_name,
            last_name,
            company,
            created_at,
            updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> Option<&PasswordHash> {
        self.password_hash.as_ref()
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn first_name(&self) -> &PersonName {
        &self.first_name
    }

    pub fn last_name(&self) -> &PersonName {
        &self.last_name
    }

    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ビジネスロジックメソッド

    /// パスワードログインが可能か判定する
    ///
    /// OAuth 専用アカウント（ハッシュなし）は false。
    pub fn can_password_login(&self) -> bool {
        self.password_hash.is_some()
    }
}
