//! # ユーザーハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/users/signup` - ユーザー新規作成

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use genbaflow_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    usecase::{AuthUseCase, SignupInput},
};

/// ユーザーハンドラの共有状態
pub struct UserState {
    pub usecase: Arc<dyn AuthUseCase>,
}

// --- リクエスト/レスポンス型 ---

/// サインアップリクエスト
///
/// フィールド名はフロントエンドの命名（camelCase）に合わせる。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name:   String,
    pub last_name:    String,
    pub email:        String,
    pub company:      String,
    pub password:     String,
    pub account_type: Option<String>,
}

/// サインアップレスポンス
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: i64,
}

// --- ハンドラ ---

/// POST /api/users/signup
///
/// ユーザーを新規作成する。
///
/// ## レスポンス
///
/// - `201 Created`: 採番されたユーザー ID
/// - `400 Bad Request`: メール・パスワードポリシー・会社名の検証失敗
/// - `409 Conflict`: メールアドレス重複
pub async fn signup(
    State(state): State<Arc<UserState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = state
        .usecase
        .signup(SignupInput {
            first_name:   req.first_name,
            last_name:    req.last_name,
            email:        req.email,
            company:      req.company,
            password:     req.password,
            account_type: req.account_type,
        })
        .await?;

    let response = ApiResponse::new(SignupResponse {
        message: "ユーザーを作成しました".to_string(),
        user_id,
    });

    Ok((StatusCode::CREATED, Json(response)))
}
