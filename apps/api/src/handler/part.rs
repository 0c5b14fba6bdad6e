//! # 部品・製品ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/parts/products` - 製品カタログ一覧
//! - `GET /api/parts/needed_parts` - 不足部品レポート
//! - `POST /api/parts/part_request` - 倉庫への部品リクエスト

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use genbaflow_domain::{
   part::{PartNumber, Quantity, StationNumber},
   work_order::WorkOrderNumber,
};
use genbaflow_infra::repository::ProductRepository;
use genbaflow_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{
   error::ApiError,
   usecase::{SupplyInput, SupplyUseCase},
};

/// 部品・製品ハンドラの共有状態
pub struct PartState {
   pub product_repository: Arc<dyn ProductRepository>,
   pub usecase:            Arc<dyn SupplyUseCase>,
}

// --- リクエスト/レスポンス型 ---

/// 製品 DTO
#[derive(Debug, Serialize)]
pub struct ProductDto {
   pub product_number: String,
   pub description:    String,
}

/// 不足部品 DTO
#[derive(Debug, Serialize)]
pub struct NeededPartDto {
   pub work_order_id:     String,
   pub station_number:    String,
   pub part_number:       String,
   pub description:       String,
   pub quantity_required: f64,
   pub quantity_supplied: f64,
}

/// 部品リクエスト
#[derive(Debug, Deserialize)]
pub struct PartRequestRequest {
   pub work_order_id:  String,
   pub station_number: String,
   pub part_number:    String,
   pub quantity:       f64,
}

/// 部品リクエストレスポンス
#[derive(Debug, Serialize)]
pub struct PartRequestResponse {
   pub message:    String,
   pub request_id: i64,
}

// --- ハンドラ ---

/// GET /api/parts/products
///
/// 全製品を製品番号順に返す。
pub async fn get_products(
   State(state): State<Arc<PartState>>,
) -> Result<impl IntoResponse, ApiError> {
   let products = state.product_repository.find_all().await?;

   let items: Vec<ProductDto> = products
      .into_iter()
      .map(|p| ProductDto {
         product_number: p.product_number().as_str().to_string(),
         description:    p.description().to_string(),
      })
      .collect();

   Ok(Json(ApiResponse::new(items)))
}

/// GET /api/parts/needed_parts
///
/// 供給済み数量が所要量に満たないステーション別所要行を返す。
pub async fn get_needed_parts(
   State(state): State<Arc<PartState>>,
) -> Result<impl IntoResponse, ApiError> {
   let shortages = state.usecase.list_shortages().await?;

   let items: Vec<NeededPartDto> = shortages
      .into_iter()
      .map(|row| {
         let number = WorkOrderNumber::new(row.work_order_id)
            .map(|n| n.to_string())
            .unwrap_or_else(|_| row.work_order_id.to_string());
         NeededPartDto {
            work_order_id:     number,
            station_number:    row.station_number,
            part_number:       row.part_number,
            description:       row.description,
            quantity_required: row.quantity_required,
            quantity_supplied: row.quantity_supplied,
         }
      })
      .collect();

   Ok(Json(ApiResponse::new(items)))
}

/// POST /api/parts/part_request
///
/// 倉庫への部品リクエストを登録する。
///
/// ## レスポンス
///
/// - `201 Created`: 採番されたリクエスト ID
/// - `400 Bad Request`: 表示用番号・部品番号・数量の形式不正
/// - `404 Not Found`: ワークオーダー・部品・ステーションなし
pub async fn create_part_request(
   State(state): State<Arc<PartState>>,
   Json(req): Json<PartRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let input = SupplyInput {
      number:   req.work_order_id.parse()?,
      station:  StationNumber::new(req.station_number)?,
      part:     PartNumber::new(req.part_number)?,
      quantity: Quantity::new(req.quantity)?,
   };

   let request_id = state.usecase.request_part(input).await?;

   let response = ApiResponse::new(PartRequestResponse {
      message: "部品リクエストを登録しました".to_string(),
      request_id,
   });

   Ok((StatusCode::CREATED, Json(response)))
}
