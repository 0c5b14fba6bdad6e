//! # 供給ユースケース
//!
//! 倉庫からの部品ディスパッチ、部品リクエスト、不足部品レポートを実装する。

use std::sync::Arc;

use async_trait::async_trait;
use genbaflow_domain::{
   part::{PartNumber, Quantity, StationNumber},
   work_order::WorkOrderNumber,
};
use genbaflow_infra::repository::{ShortageRow, SupplyRepository, WorkOrderRepository};

use crate::error::ApiError;

/// ディスパッチ・リクエスト共通の入力
#[derive(Debug)]
pub struct SupplyInput {
   pub number:   WorkOrderNumber,
   pub station:  StationNumber,
   pub part:     PartNumber,
   pub quantity: Quantity,
}

/// 供給ユースケースのトレイト
#[async_trait]
pub trait SupplyUseCase: Send + Sync {
   /// 倉庫からの部品供給を記録する
   ///
   /// # 戻り値
   ///
   /// 採番された供給ログ ID。
   async fn dispatch(&self, input: SupplyInput) -> Result<i64, ApiError>;

   /// 部品リクエストを登録する
   ///
   /// # 戻り値
   ///
   /// 採番されたリクエスト ID。
   async fn request_part(&self, input: SupplyInput) -> Result<i64, ApiError>;

   /// 不足部品レポートを取得する
   async fn list_shortages(&self) -> Result<Vec<ShortageRow>, ApiError>;
}

/// 供給ユースケースの実装
pub struct SupplyUseCaseImpl {
   supply_repository:     Arc<dyn SupplyRepository>,
   work_order_repository: Arc<dyn WorkOrderRepository>,
}

impl SupplyUseCaseImpl {
   /// 新しいユースケースインスタンスを作成
   pub fn new(
      supply_repository: Arc<dyn SupplyRepository>,
      work_order_repository: Arc<dyn WorkOrderRepository>,
   ) -> Self {
      Self {
         supply_repository,
         work_order_repository,
      }
   }
}

#[async_trait]
impl SupplyUseCase for SupplyUseCaseImpl {
   async fn dispatch(&self, input: SupplyInput) -> Result<i64, ApiError> {
      let supply_id = self
         .supply_repository
         .record_dispatch(input.number, &input.station, &input.part, input.quantity)
         .await?
         .ok_or_else(|| {
            ApiError::NotFound(format!(
               "対象の部品所要が見つかりません: {} station={} part={}",
               input.number, input.station, input.part
            ))
         })?;

      Ok(supply_id)
   }

   async fn request_part(&self, input: SupplyInput) -> Result<i64, ApiError> {
      // 外部キー違反を 500 にしないため、存在確認を先に行う
      if !self.work_order_repository.exists(input.number).await? {
         return Err(ApiError::NotFound(format!(
            "ワークオーダーが見つかりません: {}",
            input.number
         )));
      }

      let request_id = self
         .supply_repository
         .insert_request(input.number, &input.station, &input.part, input.quantity)
         .await
         .map_err(|e| {
            // 部品・ステーションが存在しない場合は外部キー違反として返る
            if e.is_foreign_key_violation() {
               ApiError::NotFound(format!(
                  "部品またはステーションが見つかりません: station={} part={}",
                  input.station, input.part
               ))
            } else {
               ApiError::from(e)
            }
         })?;

      Ok(request_id)
   }

   async fn list_shortages(&self) -> Result<Vec<ShortageRow>, ApiError> {
      Ok(self.supply_repository.find_shortages().await?)
   }
}
