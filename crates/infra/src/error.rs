//! # インフラ層エラー定義
//!
//! データベースや外部サービスとの通信で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **エラーの変換**: sqlx::Error, reqwest::Error などを `#[from]` でラップ
//! - **ドメインエラーとの分離**: インフラ固有のエラーを明示
//! - **ログ可能性**: Debug によりログ出力時に詳細情報を表示

use thiserror::Error;

/// インフラ層で発生するエラー
///
/// データベースクエリ、外部 API 呼び出しなどで発生するエラー。
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum InfraError {
   /// データベースエラー
   ///
   /// SQL クエリの実行失敗、接続エラー、制約違反など。
   #[error("データベースエラー: {0}")]
   Database(#[from] sqlx::Error),

   /// HTTP クライアントエラー
   ///
   /// 外部サービス（OAuth プロバイダなど）への通信失敗。
   #[error("HTTP クライアントエラー: {0}")]
   Http(#[from] reqwest::Error),

   /// シリアライズ/デシリアライズエラー
   ///
   /// JSON の変換に失敗した場合に使用する。
   #[error("シリアライズエラー: {0}")]
   Serialization(#[from] serde_json::Error),

   /// クライアント入力エラー
   ///
   /// インフラ層で検出されるが、原因はクライアント入力にある
   /// （OAuth コード交換の失敗など）。
   #[error("入力エラー: {0}")]
   InvalidInput(String),

   /// 予期しないエラー
   ///
   /// 上記に分類できない予期しないエラー。
   /// DB 上の値がドメインのバリデーションを通らない場合など。
   #[error("予期しないエラー: {0}")]
   Unexpected(String),
}

impl InfraError {
   /// クライアント入力エラーを生成する
   pub fn invalid_input(msg: impl Into<String>) -> Self {
      Self::InvalidInput(msg.into())
   }

   /// 予期しないエラーを生成する
   pub fn unexpected(msg: impl Into<String>) -> Self {
      Self::Unexpected(msg.into())
   }

   /// 一意制約違反の制約名を返す
   ///
   /// データベースエラーのうち UNIQUE 制約違反の場合のみ `Some`。
   /// ユースケース層が 409 Conflict への変換判定に使用する。
   pub fn unique_violation_constraint(&self) -> Option<&str> {
      match self {
         Self::Database(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            db_err.constraint()
         }
         _ => None,
      }
   }

   /// 外部キー制約違反かどうかを返す
   ///
   /// 参照先（ワークオーダーや部品）が存在しない書き込みの検出に使用する。
   pub fn is_foreign_key_violation(&self) -> bool {
      matches!(
         self,
         Self::Database(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation()
      )
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_invalid_inputのdisplay表現() {
      let err = InfraError::invalid_input("不正な入力");
      assert_eq!(format!("{err}"), "入力エラー: 不正な入力");
   }

   #[test]
   fn test_unexpectedのdisplay表現() {
      let err = InfraError::unexpected("想定外");
      assert_eq!(format!("{err}"), "予期しないエラー: 想定外");
   }

   #[test]
   fn test_sqlxエラーからの変換() {
      let err: InfraError = sqlx::Error::RowNotFound.into();
      assert!(matches!(err, InfraError::Database(_)));
   }

   #[test]
   fn test_row_not_foundは一意制約違反ではない() {
      let err: InfraError = sqlx::Error::RowNotFound.into();
      assert!(err.unique_violation_constraint().is_none());
      assert!(!err.is_foreign_key_violation());
   }
}
