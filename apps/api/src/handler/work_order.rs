//! # ワークオーダーハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/workorders` - 集計一覧
//! - `GET /api/workorders/{work_order_id}` - ユニット別詳細
//! - `POST /api/workorders/create_workorder` - 作成（BOM 展開）
//! - `POST /api/workorders/complete` - 完了ゲート
//! - `PUT /api/workorders/{work_order_id}/units/{unit_number}/stations/{station_number}/comment` -
//!   ユニット×ステーションのコメント更新
//! - `PUT /api/workorders/{work_order_id}/units/{unit_number}/stations/{station_number}/status` -
//!   ユニット×ステーションの状態更新

use std::sync::Arc;

use axum::{
   Json,
   extract::{Path, State},
   http::StatusCode,
   response::IntoResponse,
};
use genbaflow_domain::{
   part::{StationNumber, UnitNumber},
   work_order::{StationStatus, WorkOrderNumber},
};
use genbaflow_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{
   error::ApiError,
   usecase::{CreateWorkOrderInput, WorkOrderUseCase},
};

/// ワークオーダーハンドラの共有状態
pub struct WorkOrderState {
   pub usecase: Arc<dyn WorkOrderUseCase>,
}

// --- リクエスト/レスポンス型 ---

/// 一覧の要素 DTO
#[derive(Debug, Serialize)]
pub struct WorkOrderSummaryDto {
   pub work_order_id:       String,
   pub product_number:      String,
   pub quantity_to_produce: i32,
   pub total_parts_needed:  i64,
   pub parts_supplied:      i64,
   pub parts_missing:       i64,
   pub is_completed:        bool,
}

/// 詳細のステーション DTO
#[derive(Debug, Serialize)]
pub struct UnitStationDto {
   pub station_number:    String,
   pub unit_status:       String,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub unit_comment:      Option<String>,
   pub station_status:    String,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub station_comments:  Option<String>,
   pub part_number:       String,
   pub part_description:  String,
   pub quantity_required: f64,
   pub quantity_supplied: f64,
}

/// 詳細のユニット DTO
#[derive(Debug, Serialize)]
pub struct UnitDto {
   pub unit_number: i32,
   pub stations:    Vec<UnitStationDto>,
}

/// 詳細 DTO
#[derive(Debug, Serialize)]
pub struct WorkOrderDetailDto {
   pub is_completed: bool,
   pub units:        Vec<UnitDto>,
}

/// 作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateWorkOrderRequest {
   pub product_number: String,
   pub quantity:       i32,
}

/// 作成レスポンス
#[derive(Debug, Serialize)]
pub struct CreateWorkOrderResponse {
   pub message:       String,
   pub work_order_id: String,
}

/// 完了リクエスト
#[derive(Debug, Deserialize)]
pub struct CompleteWorkOrderRequest {
   pub work_order_id: String,
}

/// 完了レスポンス
#[derive(Debug, Serialize)]
pub struct CompleteWorkOrderResponse {
   pub message:       String,
   pub work_order_id: String,
}

/// コメント更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
   pub comment: String,
}

/// 状態更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
   pub status: String,
}

/// メッセージのみのレスポンス
#[derive(Debug, Serialize)]
pub struct MessageResponse {
   pub message: String,
}

// --- ハンドラ ---

/// GET /api/workorders
///
/// 全ワークオーダーの集計一覧を返す。
pub async fn list_work_orders(
   State(state): State<Arc<WorkOrderState>>,
) -> Result<impl IntoResponse, ApiError> {
   let summaries = state.usecase.list_summaries().await?;

   let items: Vec<WorkOrderSummaryDto> = summaries
      .into_iter()
      .map(|s| {
         let number = WorkOrderNumber::new(s.work_order_id)
            .map(|n| n.to_string())
            .unwrap_or_else(|_| s.work_order_id.to_string());
         WorkOrderSummaryDto {
            work_order_id:       number,
            product_number:      s.product_number,
            quantity_to_produce: s.quantity_to_produce,
            total_parts_needed:  s.total_parts_needed,
            parts_supplied:      s.parts_supplied,
            parts_missing:       s.parts_missing,
            is_completed:        s.is_completed,
         }
      })
      .collect();

   Ok(Json(ApiResponse::new(items)))
}

/// GET /api/workorders/{work_order_id}
///
/// ユニット別の進捗と部品所要を返す。
///
/// ## レスポンス
///
/// - `200 OK`: 詳細
/// - `400 Bad Request`: 表示用番号の形式不正
/// - `404 Not Found`: ワークオーダーなし
pub async fn get_work_order(
   State(state): State<Arc<WorkOrderState>>,
   Path(work_order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
   let number: WorkOrderNumber = work_order_id.parse()?;

   let detail = state.usecase.get_detail(number).await?;

   let dto = WorkOrderDetailDto {
      is_completed: detail.is_completed,
      units:        detail
         .units
         .into_iter()
         .map(|unit| UnitDto {
            unit_number: unit.unit_number,
            stations:    unit
               .stations
               .into_iter()
               .map(|s| UnitStationDto {
                  station_number:    s.station_number,
                  unit_status:       s.unit_status,
                  unit_comment:      s.unit_comment,
                  station_status:    s.station_status,
                  station_comments:  s.station_comments,
                  part_number:       s.part_number,
                  part_description:  s.part_description,
                  quantity_required: s.quantity_required,
                  quantity_supplied: s.quantity_supplied,
               })
               .collect(),
         })
         .collect(),
   };

   Ok(Json(ApiResponse::new(dto)))
}

/// POST /api/workorders/create_workorder
///
/// ワークオーダーを作成し、BOM を展開する。
///
/// ## レスポンス
///
/// - `201 Created`: 採番された表示用番号
/// - `400 Bad Request`: 製品番号の形式不正・生産数不正・BOM 未定義
/// - `404 Not Found`: 製品なし
pub async fn create_work_order(
   State(state): State<Arc<WorkOrderState>>,
   Json(req): Json<CreateWorkOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let number = state
      .usecase
      .create(CreateWorkOrderInput {
         product_number: req.product_number,
         quantity:       req.quantity,
      })
      .await?;

   let response = ApiResponse::new(CreateWorkOrderResponse {
      message:       "ワークオーダーを作成しました".to_string(),
      work_order_id: number.to_string(),
   });

   Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/workorders/complete
///
/// 全ステーション完了を条件にワークオーダーを完了にする。
///
/// ## レスポンス
///
/// - `200 OK`: 完了
/// - `400 Bad Request`: 未完了のステーションが残っている／既に完了済み
/// - `404 Not Found`: ワークオーダーなし
pub async fn complete_work_order(
   State(state): State<Arc<WorkOrderState>>,
   Json(req): Json<CompleteWorkOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let number: WorkOrderNumber = req.work_order_id.parse()?;

   state.usecase.complete(number).await?;

   Ok(Json(ApiResponse::new(CompleteWorkOrderResponse {
      message:       "ワークオーダーを完了にしました".to_string(),
      work_order_id: number.to_string(),
   })))
}

/// PUT /api/workorders/{work_order_id}/units/{unit_number}/stations/{station_number}/comment
///
/// ユニット×ステーションのコメントを更新する。
pub async fn update_unit_comment(
   State(state): State<Arc<WorkOrderState>>,
   Path((work_order_id, unit_number, station_number)): Path<(String, i32, String)>,
   Json(req): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let number: WorkOrderNumber = work_order_id.parse()?;
   let unit = UnitNumber::new(unit_number)?;
   let station = StationNumber::new(station_number)?;

   state
      .usecase
      .update_unit_comment(number, unit, station, req.comment)
      .await?;

   Ok(Json(ApiResponse::new(MessageResponse {
      message: "コメントを更新しました".to_string(),
   })))
}

/// PUT /api/workorders/{work_order_id}/units/{unit_number}/stations/{station_number}/status
///
/// ユニット×ステーションの状態を更新する。
/// 同一トランザクションでステーション集約も再計算される。
pub async fn update_unit_status(
   State(state): State<Arc<WorkOrderState>>,
   Path((work_order_id, unit_number, station_number)): Path<(String, i32, String)>,
   Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let number: WorkOrderNumber = work_order_id.parse()?;
   let unit = UnitNumber::new(unit_number)?;
   let station = StationNumber::new(station_number)?;
   let status: StationStatus = req.status.parse()?;

   state
      .usecase
      .update_unit_status(number, unit, station, status)
      .await?;

   Ok(Json(ApiResponse::new(MessageResponse {
      message: "状態を更新しました".to_string(),
   })))
}
