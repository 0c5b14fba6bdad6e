//! # ステーションハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/stations/comment` - ステーションのコメント追加・更新

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use genbaflow_domain::{part::StationNumber, work_order::WorkOrderNumber};
use genbaflow_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, usecase::WorkOrderUseCase};

/// ステーションハンドラの共有状態
pub struct StationState {
   pub usecase: Arc<dyn WorkOrderUseCase>,
}

// --- リクエスト/レスポンス型 ---

/// コメント追加リクエスト
#[derive(Debug, Deserialize)]
pub struct StationCommentRequest {
   pub work_order_id:  String,
   pub station_number: String,
   pub comment:        String,
}

/// コメント追加レスポンス
#[derive(Debug, Serialize)]
pub struct StationCommentResponse {
   pub message: String,
}

// --- ハンドラ ---

/// POST /api/stations/comment
///
/// ステーションのコメントを追加または更新する（upsert）。
///
/// ## レスポンス
///
/// - `201 Created`: 追加・更新成功
/// - `400 Bad Request`: 表示用番号・ステーション番号の形式不正
/// - `404 Not Found`: ワークオーダーなし
pub async fn add_station_comment(
   State(state): State<Arc<StationState>>,
   Json(req): Json<StationCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let number: WorkOrderNumber = req.work_order_id.parse()?;
   let station = StationNumber::new(req.station_number)?;

   state
      .usecase
      .upsert_station_comment(number, station, req.comment)
      .await?;

   let response = ApiResponse::new(StationCommentResponse {
      message: "コメントを追加・更新しました".to_string(),
   });

   Ok((StatusCode::CREATED, Json(response)))
}
