//! # 倉庫ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/warehouse/dispatch` - 部品ディスパッチの記録

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use genbaflow_domain::{
   part::{PartNumber, Quantity, StationNumber},
   work_order::WorkOrderNumber,
};
use genbaflow_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{
   error::ApiError,
   middleware::CurrentUser,
   usecase::{SupplyInput, SupplyUseCase},
};

/// 倉庫ハンドラの共有状態
pub struct WarehouseState {
   pub usecase: Arc<dyn SupplyUseCase>,
}

// --- リクエスト/レスポンス型 ---

/// ディスパッチリクエスト
#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
   pub work_order_id:     String,
   pub station_number:    String,
   pub part_number:       String,
   pub quantity_supplied: f64,
}

/// ディスパッチレスポンス
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
   pub message:   String,
   pub supply_id: i64,
}

// --- ハンドラ ---

/// POST /api/warehouse/dispatch
///
/// 倉庫からステーションへの部品供給を記録する。
/// 供給ログの追記・所要量テーブルへの加算・オープンなリクエストの
/// 消し込みが 1 トランザクションで行われる。
///
/// ## レスポンス
///
/// - `201 Created`: 採番された供給ログ ID
/// - `400 Bad Request`: 表示用番号・部品番号・数量の形式不正
/// - `401 Unauthorized`: トークンなし・不正（ミドルウェアが返す）
/// - `404 Not Found`: 対象の部品所要なし
pub async fn dispatch_parts(
   State(state): State<Arc<WarehouseState>>,
   Extension(current_user): Extension<CurrentUser>,
   Json(req): Json<DispatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let input = SupplyInput {
      number:   req.work_order_id.parse()?,
      station:  StationNumber::new(req.station_number)?,
      part:     PartNumber::new(req.part_number)?,
      quantity: Quantity::new(req.quantity_supplied)?,
   };

   tracing::info!(
      user_id = current_user.user_id,
      user = %current_user.email,
      account_type = %current_user.account_type,
      work_order = %input.number,
      station = %input.station,
      part = %input.part,
      "部品ディスパッチを記録します"
   );

   let supply_id = state.usecase.dispatch(input).await?;

   let response = ApiResponse::new(DispatchResponse {
      message: "部品ディスパッチを記録しました".to_string(),
      supply_id,
   });

   Ok((StatusCode::CREATED, Json(response)))
}

#[cfg(test)]
mod tests {
   use async_trait::async_trait;
   use axum::{
      Router,
      body::Body,
      http::{Method, Request},
      routing::post,
   };
   use genbaflow_infra::repository::ShortageRow;
   use tower::ServiceExt;

   use super::*;

   // テスト用スタブ
   struct StubSupplyUseCase {
      requirement_exists: bool,
   }

   #[async_trait]
   impl SupplyUseCase for StubSupplyUseCase {
      async fn dispatch(&self, input: SupplyInput) -> Result<i64, ApiError> {
         if self.requirement_exists {
            Ok(101)
         } else {
            Err(ApiError::NotFound(format!(
               "対象の部品所要が見つかりません: {}",
               input.number
            )))
         }
      }

      async fn request_part(&self, _input: SupplyInput) -> Result<i64, ApiError> {
         unimplemented!("このテストでは使用しない")
      }

      async fn list_shortages(&self) -> Result<Vec<ShortageRow>, ApiError> {
         unimplemented!("このテストでは使用しない")
      }
   }

   /// 認証ミドルウェアの代わりに CurrentUser を直接注入する
   fn create_test_app(requirement_exists: bool) -> Router {
      let state = Arc::new(WarehouseState {
         usecase: Arc::new(StubSupplyUseCase { requirement_exists }),
      });

      Router::new()
         .route("/api/warehouse/dispatch", post(dispatch_parts))
         .layer(Extension(CurrentUser {
            user_id:      7,
            email:        "warehouse@example.com".to_string(),
            account_type: "warehouse_employee".to_string(),
         }))
         .with_state(state)
   }

   fn dispatch_request(work_order_id: &str, part_number: &str) -> Request<Body> {
      let body = serde_json::json!({
         "work_order_id": work_order_id,
         "station_number": "1",
         "part_number": part_number,
         "quantity_supplied": 10.0
      });

      Request::builder()
         .method(Method::POST)
         .uri("/api/warehouse/dispatch")
         .header("content-type", "application/json")
         .body(Body::from(serde_json::to_string(&body).unwrap()))
         .unwrap()
   }

   #[tokio::test]
   async fn test_ディスパッチ_成功で201と供給idを返す() {
      let sut = create_test_app(true);

      let response = sut
         .oneshot(dispatch_request("WO0000001", "200-00001"))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::CREATED);

      let body = axum::body::to_bytes(response.into_body(), usize::MAX)
         .await
         .unwrap();
      let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
      assert_eq!(json["data"]["supply_id"], 101);
   }

   #[tokio::test]
   async fn test_ディスパッチ_不正な表示用番号は400() {
      let sut = create_test_app(true);

      let response = sut
         .oneshot(dispatch_request("XX123", "200-00001"))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
   }

   #[tokio::test]
   async fn test_ディスパッチ_不正な部品番号は400() {
      let sut = create_test_app(true);

      let response = sut
         .oneshot(dispatch_request("WO0000001", "not-a-part"))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
   }

   #[tokio::test]
   async fn test_ディスパッチ_対象の所要なしは404() {
      let sut = create_test_app(false);

      let response = sut
         .oneshot(dispatch_request("WO0000001", "200-00001"))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::NOT_FOUND);
   }
}
