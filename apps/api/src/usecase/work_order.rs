//! # ワークオーダーユースケース
//!
//! ワークオーダーの作成（BOM 展開）、完了ゲート、
//! ユニット×ステーションの進捗更新とコメントを実装する。

use std::sync::Arc;

use async_trait::async_trait;
use genbaflow_domain::{
   part::{ProductNumber, StationNumber, UnitNumber},
   work_order::{StationStatus, WorkOrderNumber},
};
use genbaflow_infra::repository::{
   CompletionOutcome,
   StationStatusRepository,
   UnitStationRow,
   WorkOrderCreation,
   WorkOrderRepository,
   WorkOrderSummary,
};

use crate::error::ApiError;

/// ユニット内の 1 ステーション × 1 部品の明細
#[derive(Debug, Clone, PartialEq)]
pub struct UnitStationDetail {
   pub station_number:    String,
   pub unit_status:       String,
   pub unit_comment:      Option<String>,
   pub station_status:    String,
   pub station_comments:  Option<String>,
   pub part_number:       String,
   pub part_description:  String,
   pub quantity_required: f64,
   pub quantity_supplied: f64,
}

/// 1 ユニットの明細
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDetail {
   pub unit_number: i32,
   pub stations:    Vec<UnitStationDetail>,
}

/// ワークオーダー詳細（ユニット別の進捗と部品所要）
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOrderDetail {
   pub is_completed: bool,
   pub units:        Vec<UnitDetail>,
}

/// ワークオーダー作成の入力
#[derive(Debug)]
pub struct CreateWorkOrderInput {
   pub product_number: String,
   pub quantity:       i32,
}

/// ワークオーダーユースケースのトレイト
#[async_trait]
pub trait WorkOrderUseCase: Send + Sync {
   /// 全ワークオーダーの集計一覧を取得する
   async fn list_summaries(&self) -> Result<Vec<WorkOrderSummary>, ApiError>;

   /// ワークオーダー詳細（ユニット別進捗）を取得する
   async fn get_detail(&self, number: WorkOrderNumber)
   -> Result<WorkOrderDetail, ApiError>;

   /// ワークオーダーを作成し BOM を展開する
   ///
   /// # 戻り値
   ///
   /// 採番された表示用番号。
   async fn create(&self, input: CreateWorkOrderInput)
   -> Result<WorkOrderNumber, ApiError>;

   /// 全ステーション完了を条件にワークオーダーを完了にする
   async fn complete(&self, number: WorkOrderNumber) -> Result<(), ApiError>;

   /// ユニット×ステーションのコメントを更新する
   async fn update_unit_comment(
      &self,
      number: WorkOrderNumber,
      unit: UnitNumber,
      station: StationNumber,
      comment: String,
   ) -> Result<(), ApiError>;

   /// ユニット×ステーションの状態を更新する
   async fn update_unit_status(
      &self,
      number: WorkOrderNumber,
      unit: UnitNumber,
      station: StationNumber,
      status: StationStatus,
   ) -> Result<(), ApiError>;

   /// ステーションのコメントを追加または更新する
   async fn upsert_station_comment(
      &self,
      number: WorkOrderNumber,
      station: StationNumber,
      comment: String,
   ) -> Result<(), ApiError>;
}

/// ワークオーダーユースケースの実装
pub struct WorkOrderUseCaseImpl {
   work_order_repository:     Arc<dyn WorkOrderRepository>,
   station_status_repository: Arc<dyn StationStatusRepository>,
}

impl WorkOrderUseCaseImpl {
   /// 新しいユースケースインスタンスを作成
   pub fn new(
      work_order_repository: Arc<dyn WorkOrderRepository>,
      station_status_repository: Arc<dyn StationStatusRepository>,
   ) -> Self {
      Self {
         work_order_repository,
         station_status_repository,
      }
   }
}

/// 明細行をユニット単位にグルーピングする
///
/// 行はユニット番号順にソートされている前提。
fn group_into_units(rows: Vec<UnitStationRow>) -> Vec<UnitDetail> {
   let mut units: Vec<UnitDetail> = Vec::new();

   for row in rows {
      let detail = UnitStationDetail {
         station_number:    row.station_number,
         unit_status:       row.unit_status,
         unit_comment:      row.unit_comment,
         // 集約行が未作成のステーションは未着手扱い
         station_status:    row
            .station_status
            .unwrap_or_else(|| "not_started".to_string()),
         station_comments:  row.station_comments,
         part_number:       row.part_number,
         part_description:  row.part_description,
         quantity_required: row.quantity_required,
         quantity_supplied: row.quantity_supplied,
      };

      match units.last_mut() {
         Some(unit) if unit.unit_number == row.unit_number => {
            unit.stations.push(detail);
         }
         _ => units.push(UnitDetail {
            unit_number: row.unit_number,
            stations:    vec![detail],
         }),
      }
   }

   units
}

#[async_trait]
impl WorkOrderUseCase for WorkOrderUseCaseImpl {
   async fn list_summaries(&self) -> Result<Vec<WorkOrderSummary>, ApiError> {
      Ok(self.work_order_repository.find_summaries().await?)
   }

   async fn get_detail(
      &self,
      number: WorkOrderNumber,
   ) -> Result<WorkOrderDetail, ApiError> {
      let header = self
         .work_order_repository
         .find_header(number)
         .await?
         .ok_or_else(|| {
            ApiError::NotFound(format!("ワークオーダーが見つかりません: {}", number))
         })?;

      let rows = self.work_order_repository.find_unit_rows(number).await?;

      Ok(WorkOrderDetail {
         is_completed: header.is_completed(),
         units:        group_into_units(rows),
      })
   }

   async fn create(
      &self,
      input: CreateWorkOrderInput,
   ) -> Result<WorkOrderNumber, ApiError> {
      let product_number = ProductNumber::new(input.product_number)?;

      if input.quantity <= 0 {
         return Err(ApiError::BadRequest(
            "生産数は 1 以上である必要があります".to_string(),
         ));
      }

      match self
         .work_order_repository
         .create(&product_number, input.quantity)
         .await?
      {
         WorkOrderCreation::Created(number) => Ok(number),
         WorkOrderCreation::ProductNotFound => Err(ApiError::NotFound(format!(
            "製品が見つかりません: {}",
            product_number
         ))),
         WorkOrderCreation::MissingBom => Err(ApiError::BadRequest(format!(
            "この製品には BOM が定義されていません: {}",
            product_number
         ))),
      }
   }

   async fn complete(&self, number: WorkOrderNumber) -> Result<(), ApiError> {
      match self.work_order_repository.complete(number).await? {
         CompletionOutcome::Completed => Ok(()),
         CompletionOutcome::AlreadyCompleted => Err(ApiError::BadRequest(format!(
            "ワークオーダーは既に完了しています: {}",
            number
         ))),
         CompletionOutcome::NotReady => Err(ApiError::BadRequest(format!(
            "未完了のステーションが残っています: {}",
            number
         ))),
         CompletionOutcome::NotFound => Err(ApiError::NotFound(format!(
            "ワークオーダーが見つかりません: {}",
            number
         ))),
      }
   }

   async fn update_unit_comment(
      &self,
      number: WorkOrderNumber,
      unit: UnitNumber,
      station: StationNumber,
      comment: String,
   ) -> Result<(), ApiError> {
      let updated = self
         .work_order_repository
         .update_unit_comment(number, unit, &station, &comment)
         .await?;

      if !updated {
         return Err(ApiError::NotFound(format!(
            "対象のユニット×ステーションが見つかりません: {} unit={} station={}",
            number, unit, station
         )));
      }

      Ok(())
   }

   async fn update_unit_status(
      &self,
      number: WorkOrderNumber,
      unit: UnitNumber,
      station: StationNumber,
      status: StationStatus,
   ) -> Result<(), ApiError> {
      let updated = self
         .work_order_repository
         .update_unit_status(number, unit, &station, status)
         .await?;

      if !updated {
         return Err(ApiError::NotFound(format!(
            "対象のユニット×ステーションが見つかりません: {} unit={} station={}",
            number, unit, station
         )));
      }

      Ok(())
   }

   async fn upsert_station_comment(
      &self,
      number: WorkOrderNumber,
      station: StationNumber,
      comment: String,
   ) -> Result<(), ApiError> {
      // 外部キー違反を 500 にしないため、存在確認を先に行う
      if !self.work_order_repository.exists(number).await? {
         return Err(ApiError::NotFound(format!(
            "ワークオーダーが見つかりません: {}",
            number
         )));
      }

      self
         .station_status_repository
         .upsert_comment(number, &station, &comment)
         .await?;

      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;

   use super::*;

   fn row(
      unit: i32,
      station: &str,
      part: &str,
      unit_status: &str,
      station_status: Option<&str>,
   ) -> UnitStationRow {
      UnitStationRow {
         unit_number:       unit,
         station_number:    station.to_string(),
         unit_status:       unit_status.to_string(),
         unit_comment:      None,
         station_status:    station_status.map(|s| s.to_string()),
         station_comments:  None,
         part_number:       part.to_string(),
         part_description:  "Car Door".to_string(),
         quantity_required: 4.0,
         quantity_supplied: 2.0,
      }
   }

   #[test]
   fn test_明細行はユニット単位にグルーピングされる() {
      let rows = vec![
         row(1, "1", "200-00001", "completed", Some("in_progress")),
         row(1, "2", "200-00002", "in_progress", Some("in_progress")),
         row(2, "1", "200-00001", "not_started", Some("in_progress")),
      ];

      let units = group_into_units(rows);

      assert_eq!(units.len(), 2);
      assert_eq!(units[0].unit_number, 1);
      assert_eq!(units[0].stations.len(), 2);
      assert_eq!(units[1].unit_number, 2);
      assert_eq!(units[1].stations.len(), 1);
   }

   #[test]
   fn test_同一ユニットの複数部品は同じユニットにまとまる() {
      let rows = vec![
         row(1, "1", "200-00001", "in_progress", Some("in_progress")),
         row(1, "1", "200-00002", "in_progress", Some("in_progress")),
      ];

      let units = group_into_units(rows);

      assert_eq!(units.len(), 1);
      assert_eq!(units[0].stations.len(), 2);
   }

   #[test]
   fn test_ステーション集約行がない場合はnot_started扱い() {
      let rows = vec![row(1, "1", "200-00001", "not_started", None)];

      let units = group_into_units(rows);

      assert_eq!(units[0].stations[0].station_status, "not_started");
   }

   #[test]
   fn test_空の明細は空のユニット一覧になる() {
      assert_eq!(group_into_units(Vec::new()), Vec::new());
   }
}
