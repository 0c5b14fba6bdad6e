//! # パスワード
//!
//! パスワード関連の値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`PlainPassword`] | 平文パスワード | ログイン・サインアップ時の入力値 |
//! | [`PasswordHash`] | パスワードハッシュ | 永続化用のハッシュ値 |
//! | [`PasswordVerifyResult`] | 検証結果 | パスワード検証の成否 |
//!
//! ## パスワードポリシー
//!
//! サインアップ時は [`PlainPassword::validated`] でポリシーを強制する:
//! 8 文字以上、大文字・小文字・数字・記号を各 1 文字以上。
//! ログイン時は [`PlainPassword::new`] で素通しする（検証はハッシュ照合が行う）。

use crate::DomainError;

/// 記号として認める文字集合
const SPECIAL_CHARS: &str = "!@#$%^&*()_+=-{}[]:;\"'<>,.?/\\|~`";

/// 平文パスワード（入力値）
///
/// ユーザーが入力したパスワードをラップする。
///
/// # セキュリティ
///
/// Debug 出力ではパスワードの値をマスクする。
#[derive(Clone)]
pub struct PlainPassword(String);

impl std::fmt::Debug for PlainPassword {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_tuple("PlainPassword").field(&"[REDACTED]").finish()
   }
}

impl PlainPassword {
   /// パスワードを作成する（ポリシー検証なし、ログイン用）
   pub fn new(value: impl Into<String>) -> Self {
      Self(value.into())
   }

   /// ポリシーを検証してパスワードを作成する（サインアップ用）
   ///
   /// # バリデーション
   ///
   /// - 8 文字以上
   /// - 大文字を 1 文字以上含む
   /// - 小文字を 1 文字以上含む
   /// - 数字を 1 文字以上含む
   /// - 記号を 1 文字以上含む
   ///
   /// # エラー
   ///
   /// 最初に違反したルールの `DomainError::Validation` を返す。
   pub fn validated(value: impl Into<String>) -> Result<Self, DomainError> {
      let value = value.into();

      if value.is_empty() {
         return Err(DomainError::Validation(
            "パスワードは必須です".to_string(),
         ));
      }

      if value.len() < 8 {
         return Err(DomainError::Validation(
            "パスワードは8文字以上である必要があります".to_string(),
         ));
      }

      if !value.chars().any(|c| c.is_ascii_uppercase()) {
         return Err(DomainError::Validation(
            "パスワードには大文字を1文字以上含めてください".to_string(),
         ));
      }

      if !value.chars().any(|c| c.is_ascii_lowercase()) {
         return Err(DomainError::Validation(
            "パスワードには小文字を1文字以上含めてください".to_string(),
         ));
      }

      if !value.chars().any(|c| c.is_ascii_digit()) {
         return Err(DomainError::Validation(
            "パスワードには数字を1文字以上含めてください".to_string(),
         ));
      }

      if !value.chars().any(|c| SPECIAL_CHARS.contains(c)) {
         return Err(DomainError::Validation(
            "パスワードには記号を1文字以上含めてください".to_string(),
         ));
      }

      Ok(Self(value))
   }

   /// 文字列参照を取得する
   pub fn as_str(&self) -> &str {
      &self.0
   }
}

/// パスワードハッシュ（永続化用）
///
/// Argon2id でハッシュ化されたパスワード文字列をラップする。
/// データベースに保存される形式。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
   /// ハッシュ文字列からインスタンスを作成する
   ///
   /// 主にデータベースからの復元時に使用する。
   pub fn new(hash: impl Into<String>) -> Self {
      Self(hash.into())
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

/// パスワード検証結果
///
/// パスワード検証の成否を表す列挙型。
/// bool ではなく専用の型を使うことで、意図が明確になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordVerifyResult {
   /// パスワードが一致した
   Match,
   /// パスワードが一致しなかった
   Mismatch,
}

impl PasswordVerifyResult {
   /// 一致したかどうかを返す
   pub fn is_match(&self) -> bool {
      matches!(self, Self::Match)
   }

   /// 一致しなかったかどうかを返す
   pub fn is_mismatch(&self) -> bool {
      matches!(self, Self::Mismatch)
   }
}

impl From<bool> for PasswordVerifyResult {
   fn from(matched: bool) -> Self {
      if matched { Self::Match } else { Self::Mismatch }
   }
}

#[cfg(test)]
mod tests {
   use rstest::rstest;

   use super::*;

   #[rstest]
   fn test_平文パスワードを作成できる() {
      let password = PlainPassword::new("password123");
      assert_eq!(password.as_str(), "password123");
   }

   #[rstest]
   fn test_平文パスワードのdebug出力はマスクされる() {
      let password = PlainPassword::new("secret");
      let debug = format!("{:?}", password);
      assert!(debug.contains("[REDACTED]"));
      assert!(!debug.contains("secret"));
   }

   #[rstest]
   fn test_ポリシーを満たすパスワードは受け入れる() {
      assert!(PlainPassword::validated("Passw0rd!").is_ok());
   }

   #[rstest]
   #[case("", "空文字列")]
   #[case("Sh0rt!", "8文字未満")]
   #[case("passw0rd!", "大文字なし")]
   #[case("PASSW0RD!", "小文字なし")]
   #[case("Password!", "数字なし")]
   #[case("Passw0rd1", "記号なし")]
   fn test_ポリシー違反のパスワードは拒否する(
      #[case] input: &str,
      #[case] _reason: &str,
   ) {
      assert!(PlainPassword::validated(input).is_err());
   }

   #[rstest]
   fn test_検証結果_一致() {
      let result = PasswordVerifyResult::Match;
      assert!(result.is_match());
      assert!(!result.is_mismatch());
   }

   #[rstest]
   fn test_boolからの変換() {
      assert_eq!(
         PasswordVerifyResult::from(true),
         PasswordVerifyResult::Match
      );
      assert_eq!(
         PasswordVerifyResult::from(false),
         PasswordVerifyResult::Mismatch
      );
   }
}
