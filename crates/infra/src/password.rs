//! # パスワードハッシュ
//!
//! Argon2id によるパスワードのハッシュ化と検証を提供する。
//! サインアップ時はハッシュ化、ログイン時は検証を使用する。

use argon2::{
    Argon2,
    Params,
    PasswordHasher as _,
    PasswordVerifier as _,
    password_hash::{PasswordHash as Argon2PasswordHash, SaltString, rand_core::OsRng},
};
use genbaflow_domain::password::{PasswordHash, PasswordVerifyResult, PlainPassword};

use crate::InfraError;

/// パスワードのハッシュ化と検証を担当するトレイト
pub trait PasswordHasher: Send + Sync {
    /// パスワードをハッシュ化する
    ///
    /// # Errors
    ///
    /// - ハッシュ計算に失敗した場合
    fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError>;

    /// パスワードを検証する
    ///
    /// # Errors
    ///
    /// - 不正なハッシュ形式の場合
    fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError>;

    /// タイミング攻撃対策用のダミー検証を実行する
    ///
    /// ユーザーが存在しない場合もこのメソッドを呼び出し、
    /// 処理時間を均一化してユーザー存在確認攻撃を防ぐ。
    fn dummy_verify(&self, password: &PlainPassword);
}

/// Argon2id によるパスワードハッシュの実装
///
/// OWASP 推奨パラメータ（RFC 9106）を使用:
/// - Memory: 64 MB
/// - Iterations: 1
/// - Parallelism: 1
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        let params = Params::new(
            65536, // memory (KB) = 64 MB
            1,     // iterations
            1,     // parallelism
            None,  // output length (default: 32)
        )
        .expect("Argon2 パラメータが不正です");

        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, InfraError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_str().as_bytes(), &salt)
            .map_err(|e| InfraError::unexpected(format!("ハッシュ計算に失敗しました: {e}")))?;

        Ok(PasswordHash::new(hash.to_string()))
    }

    fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<PasswordVerifyResult, InfraError> {
        let parsed = Argon2PasswordHash::new(hash.as_str())
            .map_err(|e| InfraError::unexpected(format!("不正なハッシュ形式: {e}")))?;

        let matched = self
            .argon2
            .verify_password(password.as_str().as_bytes(), &parsed)
            .is_ok();

        Ok(PasswordVerifyResult::from(matched))
    }

    fn dummy_verify(&self, password: &PlainPassword) {
        const DUMMY_HASH: &str = "$argon2id$v=19$m=65536,t=1,p=1$olntqw+EoVpwH4B1vUAI0A$5yCA1izLODgz8nQOInDGwbuQB/AS0sIQDwpmIilve5M";

        if let Ok(parsed) = Argon2PasswordHash::new(DUMMY_HASH) {
            let _ = self
                .argon2
                .verify_password(password.as_str().as_bytes(), &parsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    // シードデータと同じハッシュ（password123）
    const TEST_HASH: &str = "$argon2id$v=19$m=65536,t=1,p=1$olntqw+EoVpwH4B1vUAI0A$5yCA1izLODgz8nQOInDGwbuQB/AS0sIQDwpmIilve5M";

    #[rstest]
    fn test_正しいパスワードを検証できる() {
        let hasher = Argon2PasswordHasher::new();
        let password = PlainPassword::new("password123");
        let hash = PasswordHash::new(TEST_HASH);

        let result = hasher.verify(&password, &hash).unwrap();

        assert!(result.is_match());
    }

    #[rstest]
    fn test_不正なパスワードを検証できる() {
        let hasher = Argon2PasswordHasher::new();
        let password = PlainPassword::new("wrongpassword");
        let hash = PasswordHash::new(TEST_HASH);

        let result = hasher.verify(&password, &hash).unwrap();

        assert!(result.is_mismatch());
    }

    #[rstest]
    fn test_不正なハッシュ形式はエラー() {
        let hasher = Argon2PasswordHasher::new();
        let password = PlainPassword::new("password123");
        let invalid_hash = PasswordHash::new("not-a-valid-hash");

        let result = hasher.verify(&password, &invalid_hash);

        assert!(result.is_err());
    }

    #[rstest]
    fn test_ハッシュ化した値を同じパスワードで検証できる() {
        let hasher = Argon2PasswordHasher::new();
        let password = PlainPassword::new("Passw0rd!");

        let hash = hasher.hash(&password).unwrap();
        let result = hasher.verify(&password, &hash).unwrap();

        assert!(result.is_match());
    }

    #[rstest]
    fn test_ハッシュ化した値は別のパスワードと一致しない() {
        let hasher = Argon2PasswordHasher::new();
        let password = PlainPassword::new("Passw0rd!");
        let other = PlainPassword::new("Different1!");

        let hash = hasher.hash(&password).unwrap();
        let result = hasher.verify(&other, &hash).unwrap();

        assert!(result.is_mismatch());
    }

    #[rstest]
    fn test_ダミー検証はパニックしない() {
        let hasher = Argon2PasswordHasher::new();
        hasher.dummy_verify(&PlainPassword::new("anything"));
    }
}
