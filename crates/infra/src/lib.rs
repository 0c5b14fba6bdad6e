//! # GenbaFlow インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とマイグレーション
//! - **リポジトリ実装**: 永続化操作のトレイトと PostgreSQL 実装
//! - **パスワードハッシュ**: Argon2id によるハッシュ化と検証
//! - **トークン発行**: JWT（HS256）の発行と検証
//! - **OAuth クライアント**: Google OAuth2 のコード交換とユーザー情報取得
//!
//! ## 依存関係
//!
//! ```text
//! api → infra → domain → shared
//! ```
//!
//! インフラ層は `domain` に依存する。
//! ドメイン層はインフラ層に依存しない（依存性逆転の原則）。
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`password`] - Argon2id パスワードハッシュ
//! - [`jwt`] - JWT 発行・検証
//! - [`oauth`] - Google OAuth2 クライアント
//! - [`repository`] - リポジトリ実装

pub mod db;
pub mod error;
pub mod jwt;
pub mod oauth;
pub mod password;
pub mod repository;

pub use error::InfraError;
pub use jwt::{AccessTokenClaims, Hs256TokenService, TokenError, TokenService};
pub use oauth::{GoogleOAuthProvider, OAuthProvider, OAuthUserInfo};
pub use password::{Argon2PasswordHasher, PasswordHasher};
