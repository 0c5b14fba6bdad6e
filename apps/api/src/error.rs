//! # API エラー定義
//!
//! API サーバー固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! エラーレスポンスのボディは RFC 9457 Problem Details
//! （[`genbaflow_shared::ErrorResponse`]）。

use axum::{
   Json,
   http::StatusCode,
   response::{IntoResponse, Response},
};
use genbaflow_domain::DomainError;
use genbaflow_infra::{InfraError, TokenError};
use genbaflow_shared::ErrorResponse;
use thiserror::Error;

/// API サーバーで発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
   /// 不正なリクエスト
   #[error("不正なリクエスト: {0}")]
   BadRequest(String),

   /// 認証失敗
   #[error("認証に失敗しました: {0}")]
   Unauthorized(String),

   /// 権限不足
   #[error("権限がありません: {0}")]
   Forbidden(String),

   /// リソースが見つからない
   #[error("リソースが見つかりません: {0}")]
   NotFound(String),

   /// 競合（一意制約違反など）
   #[error("競合が発生しました: {0}")]
   Conflict(String),

   /// 依存サービスが利用不可（OAuth 未設定など）
   #[error("サービスが利用できません: {0}")]
   ServiceUnavailable(String),

   /// インフラ層エラー
   #[error("インフラエラー: {0}")]
   Infra(InfraError),
}

impl From<DomainError> for ApiError {
   fn from(e: DomainError) -> Self {
      match e {
         DomainError::Validation(msg) => Self::BadRequest(msg),
         DomainError::NotFound { .. } => Self::NotFound(e.to_string()),
         DomainError::Conflict(msg) => Self::Conflict(msg),
         DomainError::Forbidden(msg) => Self::Forbidden(msg),
      }
   }
}

impl From<InfraError> for ApiError {
   fn from(e: InfraError) -> Self {
      match e {
         // 原因がクライアント入力にあるインフラエラー（OAuth コード交換失敗など）
         InfraError::InvalidInput(msg) => Self::BadRequest(msg),
         other => Self::Infra(other),
      }
   }
}

impl From<TokenError> for ApiError {
   fn from(e: TokenError) -> Self {
      Self::Unauthorized(e.to_string())
   }
}

impl IntoResponse for ApiError {
   fn into_response(self) -> Response {
      let body = match &self {
         ApiError::BadRequest(msg) => ErrorResponse::bad_request(msg.clone()),
         ApiError::Unauthorized(msg) => ErrorResponse::unauthorized(msg.clone()),
         ApiError::Forbidden(msg) => {
            ErrorResponse::new("forbidden", "Forbidden", 403, msg.clone())
         }
         ApiError::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
         ApiError::Conflict(msg) => ErrorResponse::conflict(msg.clone()),
         ApiError::ServiceUnavailable(msg) => {
            ErrorResponse::service_unavailable(msg.clone())
         }
         ApiError::Infra(e) => {
            tracing::error!("インフラエラー: {}", e);
            ErrorResponse::internal_error()
         }
      };

      let status =
         StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

      (status, Json(body)).into_response()
   }
}

#[cfg(test)]
mod tests {
   use pretty_assertions::assert_eq;

   use super::*;

   async fn response_parts(error: ApiError) -> (StatusCode, serde_json::Value) {
      let response = error.into_response();
      let status = response.status();
      let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
         .await
         .unwrap();
      (status, serde_json::from_slice(&bytes).unwrap())
   }

   #[tokio::test]
   async fn test_bad_requestは400とproblem_detailsを返す() {
      let (status, json) =
         response_parts(ApiError::BadRequest("不正な形式".to_string())).await;

      assert_eq!(status, StatusCode::BAD_REQUEST);
      assert_eq!(json["status"], 400);
      assert_eq!(json["detail"], "不正な形式");
      assert_eq!(
         json["type"],
         "https://genbaflow.example.com/errors/bad-request"
      );
   }

   #[tokio::test]
   async fn test_not_foundは404を返す() {
      let (status, json) =
         response_parts(ApiError::NotFound("見つかりません".to_string())).await;

      assert_eq!(status, StatusCode::NOT_FOUND);
      assert_eq!(json["detail"], "見つかりません");
   }

   #[tokio::test]
   async fn test_infraエラーは500で内部情報を漏らさない() {
      let infra = InfraError::unexpected("接続文字列 postgres://secret が不正");
      let (status, json) = response_parts(ApiError::Infra(infra)).await;

      assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
      assert_eq!(json["detail"], "内部エラーが発生しました");
   }

   #[test]
   fn test_domainエラーからの変換() {
      let api: ApiError = DomainError::Validation("検証失敗".to_string()).into();
      assert!(matches!(api, ApiError::BadRequest(msg) if msg == "検証失敗"));

      let api: ApiError = DomainError::Conflict("重複".to_string()).into();
      assert!(matches!(api, ApiError::Conflict(_)));
   }

   #[test]
   fn test_infraのinvalid_inputは400に変換される() {
      let api: ApiError = InfraError::invalid_input("コード不正").into();
      assert!(matches!(api, ApiError::BadRequest(_)));
   }

   #[test]
   fn test_tokenエラーは401に変換される() {
      let api: ApiError = TokenError::Expired.into();
      assert!(matches!(api, ApiError::Unauthorized(_)));
   }
}
