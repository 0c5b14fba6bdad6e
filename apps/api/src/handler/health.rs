//! # ヘルスチェックハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /health` - Liveness Check（プロセスの生存確認）
//! - `GET /health/ready` - Readiness Check（依存サービスの接続確認）

use std::{collections::HashMap, sync::Arc};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use genbaflow_shared::{
    HealthResponse,
    health::{CheckStatus, ReadinessResponse, ReadinessStatus},
};
use sqlx::PgPool;

/// Readiness Check の共有状態
pub struct ReadinessState {
    pub pool: PgPool,
}

/// GET /health
///
/// プロセスが応答可能であることのみを確認する。
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status:  "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health/ready
///
/// データベースへ `SELECT 1` を発行し、接続可能かを確認する。
/// 接続不可の場合は 503 を返す。
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
    let database_ok = sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .is_ok();

    let mut checks = HashMap::new();
    checks.insert(
        "database".to_string(),
        if database_ok {
            CheckStatus::Ok
        } else {
            CheckStatus::Error
        },
    );

    let (status_code, status) = if database_ok {
        (StatusCode::OK, ReadinessStatus::Ready)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, ReadinessStatus::NotReady)
    };

    (status_code, Json(ReadinessResponse { status, checks }))
}
