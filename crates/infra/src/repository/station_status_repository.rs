//! # StationStatusRepository
//!
//! ワークオーダー×ステーション単位の状態行を担当するリポジトリ。
//!
//! コメントの upsert は `ON CONFLICT` で DB に任せる。

use async_trait::async_trait;
use genbaflow_domain::{part::StationNumber, work_order::WorkOrderNumber};
use sqlx::PgPool;

use crate::error::InfraError;

/// ステーション状態リポジトリトレイト
#[async_trait]
pub trait StationStatusRepository: Send + Sync {
   /// ステーションのコメントを追加または更新する
   ///
   /// 行が存在しなければ作成し（状態は `not_started`）、
   /// 存在すれば `notes` と `updated_at` のみ更新する。
   async fn upsert_comment(
      &self,
      number: WorkOrderNumber,
      station: &StationNumber,
      comment: &str,
   ) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の StationStatusRepository
#[derive(Debug, Clone)]
pub struct PostgresStationStatusRepository {
   pool: PgPool,
}

impl PostgresStationStatusRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl StationStatusRepository for PostgresStationStatusRepository {
   async fn upsert_comment(
      &self,
      number: WorkOrderNumber,
      station: &StationNumber,
      comment: &str,
   ) -> Result<(), InfraError> {
      sqlx::query(
         r#"
            INSERT INTO work_order_station_status (work_order_id, station_number, notes, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (work_order_id, station_number)
            DO UPDATE SET
                notes = EXCLUDED.notes,
                updated_at = now()
            "#,
      )
      .bind(number.as_i64())
      .bind(station.as_str())
      .bind(comment)
      .execute(&self.pool)
      .await?;

      Ok(())
   }
}
