//! # 部品・製品
//!
//! 部品表（BOM）まわりの値オブジェクトとエンティティを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 要件 |
//! |---|------------|------|
//! | [`PartNumber`] | 部品番号 | `ddd-ddddd` 形式（例: `200-00001`） |
//! | [`ProductNumber`] | 製品番号 | `ddd-ddddd` 形式（例: `100-00001`） |
//! | [`StationNumber`] | ステーション番号 | 組立ラインの工程ラベル（"1", "2", …） |
//! | [`UnitNumber`] | ユニット番号 | ワークオーダー内の個体番号（1 始まり） |
//! | [`Quantity`] | 数量 | 正の有限値 |

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// 部品番号・製品番号の共通フォーマット（3桁-5桁）
static ITEM_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{5}$").expect("部品番号の正規表現が不正です"));

/// 部品番号（値オブジェクト）
///
/// `ddd-ddddd` 形式。生成時にバリデーションを実行する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartNumber(String);

impl PartNumber {
    /// 部品番号を作成する
    ///
    /// # エラー
    ///
    /// 形式が `ddd-ddddd` でない場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if !ITEM_NUMBER_RE.is_match(&value) {
            return Err(DomainError::Validation(format!(
                "不正な部品番号形式: {}",
                value
            )));
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

impl std::fmt::Display for PartNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PartNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// 製品番号（値オブジェクト）
///
/// 部品番号と同じ `ddd-ddddd` 形式だが、BOM の親側を指す別の型として区別する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductNumber(String);

impl ProductNumber {
    /// 製品番号を作成する
    ///
    /// # エラー
    ///
    /// 形式が `ddd-ddddd` でない場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if !ITEM_NUMBER_RE.is_match(&value) {
            return Err(DomainError::Validation(format!(
                "不正な製品番号形式: {}",
                value
            )));
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

impl std::fmt::Display for ProductNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProductNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// ステーション番号（値オブジェクト）
///
/// 組立ラインの工程ラベル。数値とは限らないため文字列で保持する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationNumber(String);

impl StationNumber {
    /// ステーション番号を作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない（前後の空白は除去）
    /// - 最大 20 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "ステーション番号は必須です".to_string(),
            ));
        }

        if value.chars().count() > 20 {
            return Err(DomainError::Validation(
                "ステーション番号は20文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StationNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユニット番号（値オブジェクト）
///
/// ワークオーダー内の個体番号。1 から `quantity_to_produce` まで。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitNumber(i32);

impl UnitNumber {
    /// ユニット番号を作成する
    ///
    /// # エラー
    ///
    /// 0 以下の場合は `DomainError::Validation` を返す。
    pub fn new(value: i32) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::Validation(
                "ユニット番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 内部の i32 値を取得する
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for UnitNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 数量（値オブジェクト）
///
/// 部品の所要量・供給量。正の有限値のみ許可する。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Quantity(f64);

impl Quantity {
    /// 数量を作成する
    ///
    /// # エラー
    ///
    /// 0 以下・NaN・無限大の場合は `DomainError::Validation` を返す。
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(DomainError::Validation(format!(
                "数量は正の数値である必要があります: {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// 内部の f64 値を取得する
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

/// 製品エンティティ
///
/// 製品カタログの 1 行。BOM の親。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    product_number: ProductNumber,
    description: String,
}

impl Product {
    /// 既存のデータから製品を復元する（データベースから取得時）
    pub fn from_db(product_number: ProductNumber, description: String) -> Self {
        Self {
            product_number,
            description,
        }
    }

    pub fn product_number(&self) -> &ProductNumber {
        &self.product_number
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    // PartNumber / ProductNumber のテスト

    #[rstest]
    #[case("200-00001")]
    #[case("999-99999")]
    #[case("000-00000")]
    fn test_部品番号は正常な形式を受け入れる(#[case] input: &str) {
        assert!(PartNumber::new(input).is_ok());
    }

    #[rstest]
    #[case("", "空文字列")]
    #[case("20-00001", "3桁未満")]
    #[case("2000-00001", "3桁超過")]
    #[case("200-0001", "5桁未満")]
    #[case("200-000001", "5桁超過")]
    #[case("20a-00001", "数字以外")]
    #[case("200_00001", "区切り文字が不正")]
    #[case(" 200-00001", "先頭に空白")]
    fn test_部品番号は不正な形式を拒否する(#[case] input: &str, #[case] _reason: &str) {
        assert!(PartNumber::new(input).is_err());
    }

    #[test]
    fn test_製品番号も同じ形式で検証される() {
        assert!(ProductNumber::new("100-00001").is_ok());
        assert!(ProductNumber::new("abc").is_err());
    }

    // StationNumber のテスト

    #[test]
    fn test_ステーション番号は正常な値を受け入れる() {
        let station = StationNumber::new("1").unwrap();
        assert_eq!(station.as_str(), "1");
    }

    #[test]
    fn test_ステーション番号は前後の空白を除去する() {
        let station = StationNumber::new(" 2 ").unwrap();
        assert_eq!(station.as_str(), "2");
    }

    #[rstest]
    #[case("", "空文字列")]
    #[case("   ", "空白のみ")]
    #[case("123456789012345678901", "20文字超過")]
    fn test_ステーション番号は不正な値を拒否する(
        #[case] input: &str,
        #[case] _reason: &str,
    ) {
        assert!(StationNumber::new(input).is_err());
    }

    // UnitNumber のテスト

    #[test]
    fn test_ユニット番号は1以上を受け入れる() {
        assert!(UnitNumber::new(1).is_ok());
        assert!(UnitNumber::new(100).is_ok());
    }

    #[test]
    fn test_ユニット番号はゼロ以下を拒否する() {
        assert!(UnitNumber::new(0).is_err());
        assert!(UnitNumber::new(-5).is_err());
    }

    // Quantity のテスト

    #[rstest]
    #[case(1.0)]
    #[case(0.5)]
    #[case(100.0)]
    fn test_数量は正の有限値を受け入れる(#[case] input: f64) {
        assert!(Quantity::new(input).is_ok());
    }

    #[rstest]
    #[case(0.0, "ゼロ")]
    #[case(-1.0, "負数")]
    #[case(f64::NAN, "NaN")]
    #[case(f64::INFINITY, "無限大")]
    fn test_数量は不正な値を拒否する(#[case] input: f64, #[case] _reason: &str) {
        assert!(Quantity::new(input).is_err());
    }
}
