//! # SupplyRepository
//!
//! 倉庫からの部品供給（ディスパッチ）と部品リクエスト、
//! 不足部品レポートを担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **供給は 1 トランザクション**: 供給ログの追記と
//!   所要量テーブルの供給済み数量の加算、オープンなリクエストの
//!   消し込みを原子的に実行
//! - **不足の判定は DB**: `quantity_supplied < quantity_needed` の
//!   行をそのまま返す

use async_trait::async_trait;
use genbaflow_domain::{
   part::{PartNumber, Quantity, StationNumber},
   work_order::WorkOrderNumber,
};
use sqlx::PgPool;

use crate::error::InfraError;

/// 不足部品レポートの行
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ShortageRow {
   pub work_order_id:     i64,
   pub station_number:    String,
   pub part_number:       String,
   pub description:       String,
   pub quantity_required: f64,
   pub quantity_supplied: f64,
}

/// 供給リポジトリトレイト
#[async_trait]
pub trait SupplyRepository: Send + Sync {
   /// 部品供給を記録する
   ///
   /// # 戻り値
   ///
   /// - `Ok(Some(supply_id))`: 記録成功
   /// - `Ok(None)`: 対象のステーション別所要行が存在しない
   ///   （そのワークオーダー・ステーションでその部品は不要）
   async fn record_dispatch(
      &self,
      number: WorkOrderNumber,
      station: &StationNumber,
      part: &PartNumber,
      quantity: Quantity,
   ) -> Result<Option<i64>, InfraError>;

   /// 部品リクエストを登録する
   ///
   /// # 戻り値
   ///
   /// 採番されたリクエスト ID。
   async fn insert_request(
      &self,
      number: WorkOrderNumber,
      station: &StationNumber,
      part: &PartNumber,
      quantity: Quantity,
   ) -> Result<i64, InfraError>;

   /// 不足部品レポートを取得する
   ///
   /// 供給済み数量が所要量に満たないステーション別所要行を返す。
   async fn find_shortages(&self) -> Result<Vec<ShortageRow>, InfraError>;
}

/// PostgreSQL 実装の SupplyRepository
#[derive(Debug, Clone)]
pub struct PostgresSupplyRepository {
   pool: PgPool,
}

impl PostgresSupplyRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl SupplyRepository for PostgresSupplyRepository {
   async fn record_dispatch(
      &self,
      number: WorkOrderNumber,
      station: &StationNumber,
      part: &PartNumber,
      quantity: Quantity,
   ) -> Result<Option<i64>, InfraError> {
      let mut tx = self.pool.begin().await?;

      // ステーション別所要行への加算。対象行がなければ供給は記録しない
      let updated = sqlx::query(
         r#"
            UPDATE station_work_order_parts
            SET quantity_supplied = quantity_supplied + $4
            WHERE work_order_id = $1
              AND station_number = $2
              AND part_number = $3
            "#,
      )
      .bind(number.as_i64())
      .bind(station.as_str())
      .bind(part.as_str())
      .bind(quantity.as_f64())
      .execute(&mut *tx)
      .await?;

      if updated.rows_affected() == 0 {
         return Ok(None);
      }

      // ワークオーダー集計行への加算
      sqlx::query(
         r#"
            UPDATE work_order_parts
            SET quantity_supplied = quantity_supplied + $3
            WHERE work_order_id = $1
              AND part_number = $2
            "#,
      )
      .bind(number.as_i64())
      .bind(part.as_str())
      .bind(quantity.as_f64())
      .execute(&mut *tx)
      .await?;

      // 供給ログの追記
      let (supply_id,): (i64,) = sqlx::query_as(
         r#"
            INSERT INTO part_supply_log
                (work_order_id, station_number, part_number, quantity_supplied, supplied_at)
            VALUES ($1, $2, $3, $4, now())
            RETURNING supply_id
            "#,
      )
      .bind(number.as_i64())
      .bind(station.as_str())
      .bind(part.as_str())
      .bind(quantity.as_f64())
      .fetch_one(&mut *tx)
      .await?;

      // オープンなリクエストの消し込み
      sqlx::query(
         r#"
            UPDATE part_requests
            SET status = 'fulfilled'
            WHERE work_order_id = $1
              AND station_number = $2
              AND part_number = $3
              AND status = 'open'
            "#,
      )
      .bind(number.as_i64())
      .bind(station.as_str())
      .bind(part.as_str())
      .execute(&mut *tx)
      .await?;

      tx.commit().await?;

      Ok(Some(supply_id))
   }

   async fn insert_request(
      &self,
      number: WorkOrderNumber,
      station: &StationNumber,
      part: &PartNumber,
      quantity: Quantity,
   ) -> Result<i64, InfraError> {
      let (request_id,): (i64,) = sqlx::query_as(
         r#"
            INSERT INTO part_requests
                (work_order_id, station_number, part_number, quantity_requested)
            VALUES ($1, $2, $3, $4)
            RETURNING request_id
            "#,
      )
      .bind(number.as_i64())
      .bind(station.as_str())
      .bind(part.as_str())
      .bind(quantity.as_f64())
      .fetch_one(&self.pool)
      .await?;

      Ok(request_id)
   }

   async fn find_shortages(&self) -> Result<Vec<ShortageRow>, InfraError> {
      let rows: Vec<ShortageRow> = sqlx::query_as(
         r#"
            SELECT
                swop.work_order_id,
                swop.station_number,
                swop.part_number,
                p.description,
                swop.quantity_needed AS quantity_required,
                swop.quantity_supplied
            FROM station_work_order_parts swop
            JOIN parts p ON p.part_number = swop.part_number
            WHERE swop.quantity_supplied < swop.quantity_needed
            ORDER BY swop.work_order_id, swop.station_number, swop.part_number
            "#,
      )
      .fetch_all(&self.pool)
      .await?;

      Ok(rows)
   }
}
