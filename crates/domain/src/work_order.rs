//! # ワークオーダー
//!
//! 作業指示（ワークオーダー）のエンティティと関連する値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 要件 |
//! |---|------------|------|
//! | [`WorkOrder`] | ワークオーダー | 製品を N 台生産する作業指示 |
//! | [`WorkOrderNumber`] | 表示用番号 | `WO` + 7桁ゼロ埋め連番（例: `WO0000001`） |
//! | [`StationStatus`] | ステーション状態 | ユニット×ステーション単位の進捗 |
//!
//! ## 設計方針
//!
//! - データベースの連番（BIGSERIAL）と表示用番号は全単射:
//!   `WorkOrderNumber` が両者の変換を一手に担い、パース失敗は
//!   `DomainError::Validation` として API 境界で 400 になる

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{DomainError, part::ProductNumber};

/// ワークオーダー表示用番号（値オブジェクト）
///
/// データベースの連番をラップし、`WO0000001` 形式の表示と
/// その逆方向のパースを提供する。
///
/// # 不変条件
///
/// - 内部の連番は 1 以上
///
/// # 使用例
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use genbaflow_domain::work_order::WorkOrderNumber;
///
/// let number = WorkOrderNumber::new(42)?;
/// assert_eq!(number.to_string(), "WO0000042");
/// assert_eq!("WO0000042".parse::<WorkOrderNumber>()?, number);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkOrderNumber(i64);

impl WorkOrderNumber {
    /// 表示用番号のプレフィックス
    pub const PREFIX: &'static str = "WO";

    /// 連番から表示用番号を作成する
    ///
    /// # エラー
    ///
    /// 0 以下の場合は `DomainError::Validation` を返す。
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::Validation(
                "ワークオーダー番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 内部の連番を取得する
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for WorkOrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:07}", Self::PREFIX, self.0)
    }
}

impl std::str::FromStr for WorkOrderNumber {
    type Err = DomainError;

    /// `WO0000001` 形式の文字列をパースする
    ///
    /// プレフィックスの後ろはすべて数字でなければならない。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            || DomainError::Validation(format!("不正なワークオーダー番号形式: {}", s));

        let digits = s.strip_prefix(Self::PREFIX).ok_or_else(invalid)?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let value: i64 = digits.parse().map_err(|_| invalid())?;
        Self::new(value)
    }
}

/// ユニット×ステーション単位の進捗状態
///
/// DB には snake_case 文字列で保存する。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StationStatus {
    /// 未着手
    NotStarted,
    /// 作業中
    InProgress,
    /// 完了
    Completed,
    /// 異常（要対応）
    Alert,
    /// 保留
    Hold,
}

impl StationStatus {
    /// 完了状態か判定する
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::str::FromStr for StationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "alert" => Ok(Self::Alert),
            "hold" => Ok(Self::Hold),
            _ => Err(DomainError::Validation(format!(
                "不正なステーション状態: {}",
                s
            ))),
        }
    }
}

/// ワークオーダーエンティティ
///
/// 製品を `quantity_to_produce` 台生産する作業指示を表現する。
/// 部品所要量やユニット別進捗は関連テーブルが持ち、
/// このエンティティはヘッダ情報のみを保持する。
///
/// # 不変条件
///
/// - `quantity_to_produce` は 1 以上
/// - `is_completed` は単調: 一度 true になったら false に戻らない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkOrder {
    number: WorkOrderNumber,
    product_number: ProductNumber,
    quantity_to_produce: i32,
    is_completed: bool,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl WorkOrder {
    /// 既存のデータからワークオーダーを復元する（データベースから取得時）
    pub fn from_db(
        number: WorkOrderNumber,
        product_number: ProductNumber,
        quantity_to_produce: i32,
        is_completed: bool,
        created_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            number,
            product_number,
            quantity_to_produce,
            is_completed,
            created_at,
            completed_at,
        }
    }

    // Getter メソッド

    pub fn number(&self) -> WorkOrderNumber {
        self.number
    }

    pub fn product_number(&self) -> &ProductNumber {
        &self.product_number
    }

    pub fn quantity_to_produce(&self) -> i32 {
        self.quantity_to_produce
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}
