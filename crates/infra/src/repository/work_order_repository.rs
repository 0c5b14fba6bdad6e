//! # WorkOrderRepository
//!
//! ワークオーダーの永続化と集計クエリを担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **BOM 展開は 1 トランザクション**: ヘッダ挿入 → 部品所要量の展開 →
//!   ユニット×ステーション状態の初期化までを原子的に実行
//! - **完了ゲートは 1 文**: `NOT EXISTS` 付きの UPDATE で
//!   「全ステーション完了」を DB に判定させる
//! - **集約も DB に任せる**: ステーション状態の再計算は
//!   `bool_and` / `bool_or` + `ON CONFLICT` の 1 文で行う

use async_trait::async_trait;
use genbaflow_domain::{
   part::{ProductNumber, StationNumber, UnitNumber},
   work_order::{StationStatus, WorkOrder, WorkOrderNumber},
};
use sqlx::PgPool;

use crate::error::InfraError;

/// ワークオーダー作成の結果
#[derive(Debug, PartialEq, Eq)]
pub enum WorkOrderCreation {
   /// 作成成功（採番された表示用番号）
   Created(WorkOrderNumber),
   /// 製品が存在しない
   ProductNotFound,
   /// 製品は存在するが BOM が定義されていない
   MissingBom,
}

/// 完了操作の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
   /// 完了としてマークした
   Completed,
   /// すでに完了済み
   AlreadyCompleted,
   /// 未完了のステーションが残っている
   NotReady,
   /// ワークオーダーが存在しない
   NotFound,
}

/// ワークオーダー一覧の集計行
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct WorkOrderSummary {
   pub work_order_id:       i64,
   pub product_number:      String,
   pub quantity_to_produce: i32,
   pub is_completed:        bool,
   pub total_parts_needed:  i64,
   pub parts_supplied:      i64,
   pub parts_missing:       i64,
}

/// ユニット×ステーション明細の行
///
/// ユニットごとのグルーピングはユースケース層で行う。
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UnitStationRow {
   pub unit_number:       i32,
   pub station_number:    String,
   pub unit_status:       String,
   pub unit_comment:      Option<String>,
   pub station_status:    Option<String>,
   pub station_comments:  Option<String>,
   pub part_number:       String,
   pub part_description:  String,
   pub quantity_required: f64,
   pub quantity_supplied: f64,
}

/// ワークオーダーリポジトリトレイト
#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
   /// ワークオーダーを作成し、BOM を展開する
   ///
   /// 1 トランザクションで以下を実行する:
   ///
   /// 1. `work_orders` にヘッダを挿入し連番を採番
   /// 2. BOM を部品単位に集計して `work_order_parts` へ展開
   ///    （所要量 = 単位所要量の合計 × 生産数）
   /// 3. BOM をステーション単位で `station_work_order_parts` へ展開
   /// 4. `unit_station_status` を全ユニット × 全ステーションで初期化
   /// 5. `work_order_station_status` を全ステーションで初期化
   async fn create(
      &self,
      product_number: &ProductNumber,
      quantity: i32,
   ) -> Result<WorkOrderCreation, InfraError>;

   /// 全ワークオーダーの集計一覧を取得する
   ///
   /// 部品所要行のうち供給済み（`quantity_supplied > 0`）と
   /// 未供給の行数を数える。
   async fn find_summaries(&self) -> Result<Vec<WorkOrderSummary>, InfraError>;

   /// ワークオーダーのヘッダを取得する
   async fn find_header(
      &self,
      number: WorkOrderNumber,
   ) -> Result<Option<WorkOrder>, InfraError>;

   /// ユニット×ステーション明細を取得する
   ///
   /// ユニット番号 → ステーション番号 → 部品番号の順でソートされる。
   async fn find_unit_rows(
      &self,
      number: WorkOrderNumber,
   ) -> Result<Vec<UnitStationRow>, InfraError>;

   /// ワークオーダーの存在を確認する
   async fn exists(&self, number: WorkOrderNumber) -> Result<bool, InfraError>;

   /// 全ステーション完了を条件にワークオーダーを完了にする
   ///
   /// ゲート条件は単一の UPDATE 文:
   /// 未完了のユニット×ステーション行が 1 つでも残っていれば何も更新しない。
   async fn complete(
      &self,
      number: WorkOrderNumber,
   ) -> Result<CompletionOutcome, InfraError>;

   /// ユニット×ステーションのコメントを更新する
   ///
   /// # 戻り値
   ///
   /// 対象行が存在しない場合は `Ok(false)`。
   async fn update_unit_comment(
      &self,
      number: WorkOrderNumber,
      unit: UnitNumber,
      station: &StationNumber,
      comment: &str,
   ) -> Result<bool, InfraError>;

   /// ユニット×ステーションの状態を更新する
   ///
   /// 同一トランザクションで、そのステーションの
   /// `work_order_station_status` 行を全ユニットの状態から再計算する。
   ///
   /// # 戻り値
   ///
   /// 対象行が存在しない場合は `Ok(false)`。
   async fn update_unit_status(
      &self,
      number: WorkOrderNumber,
      unit: UnitNumber,
      station: &StationNumber,
      status: StationStatus,
   ) -> Result<bool, InfraError>;
}

/// work_orders テーブルの行
#[derive(Debug, sqlx::FromRow)]
struct WorkOrderRow {
   work_order_id:       i64,
   product_number:      String,
   quantity_to_produce: i32,
   is_completed:        bool,
   created_at:          chrono::DateTime<chrono::Utc>,
   completed_at:        Option<chrono::DateTime<chrono::Utc>>,
}

impl WorkOrderRow {
   fn into_domain(self) -> Result<WorkOrder, InfraError> {
      Ok(WorkOrder::from_db(
         WorkOrderNumber::new(self.work_order_id)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
         ProductNumber::new(&self.product_number)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
         self.quantity_to_produce,
         self.is_completed,
         self.created_at,
         self.completed_at,
      ))
   }
}

/// PostgreSQL 実装の WorkOrderRepository
#[derive(Debug, Clone)]
pub struct PostgresWorkOrderRepository {
   pool: PgPool,
}

impl PostgresWorkOrderRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl WorkOrderRepository for PostgresWorkOrderRepository {
   async fn create(
      &self,
      product_number: &ProductNumber,
      quantity: i32,
   ) -> Result<WorkOrderCreation, InfraError> {
      let mut tx = self.pool.begin().await?;

      // 製品の存在確認
      let product: Option<(String,)> =
         sqlx::query_as("SELECT product_number FROM products WHERE product_number = $1")
            .bind(product_number.as_str())
            .fetch_optional(&mut *tx)
            .await?;

      if product.is_none() {
         return Ok(WorkOrderCreation::ProductNotFound);
      }

      // BOM の存在確認（BOM なしの製品はワークオーダーを起こせない）
      let (bom_rows,): (i64,) =
         sqlx::query_as("SELECT COUNT(*) FROM bill_of_materials WHERE product_number = $1")
            .bind(product_number.as_str())
            .fetch_one(&mut *tx)
            .await?;

      if bom_rows == 0 {
         return Ok(WorkOrderCreation::MissingBom);
      }

      // 1. ヘッダ挿入
      let (work_order_id,): (i64,) = sqlx::query_as(
         r#"
            INSERT INTO work_orders (product_number, quantity_to_produce)
            VALUES ($1, $2)
            RETURNING work_order_id
            "#,
      )
      .bind(product_number.as_str())
      .bind(quantity)
      .fetch_one(&mut *tx)
      .await?;

      // 2. 部品単位の集計所要量
      sqlx::query(
         r#"
            INSERT INTO work_order_parts (work_order_id, part_number, quantity_needed)
            SELECT $1, bom.part_number, SUM(bom.quantity_per_unit) * $2
            FROM bill_of_materials bom
            WHERE bom.product_number = $3
            GROUP BY bom.part_number
            "#,
      )
      .bind(work_order_id)
      .bind(f64::from(quantity))
      .bind(product_number.as_str())
      .execute(&mut *tx)
      .await?;

      // 3. ステーション単位の所要量
      sqlx::query(
         r#"
            INSERT INTO station_work_order_parts
                (work_order_id, station_number, part_number, quantity_needed)
            SELECT $1, bom.station_number, bom.part_number, bom.quantity_per_unit * $2
            FROM bill_of_materials bom
            WHERE bom.product_number = $3
            "#,
      )
      .bind(work_order_id)
      .bind(f64::from(quantity))
      .bind(product_number.as_str())
      .execute(&mut *tx)
      .await?;

      // 4. ユニット×ステーション状態の初期化
      sqlx::query(
         r#"
            INSERT INTO unit_station_status (work_order_id, unit_number, station_number)
            SELECT $1, units.unit_number, stations.station_number
            FROM generate_series(1, $2) AS units(unit_number)
            CROSS JOIN (
                SELECT DISTINCT station_number
                FROM bill_of_materials
                WHERE product_number = $3
            ) AS stations
            "#,
      )
      .bind(work_order_id)
      .bind(quantity)
      .bind(product_number.as_str())
      .execute(&mut *tx)
      .await?;

      // 5. ステーション状態の初期化
      sqlx::query(
         r#"
            INSERT INTO work_order_station_status (work_order_id, station_number)
            SELECT $1, station_number
            FROM bill_of_materials
            WHERE product_number = $2
            GROUP BY station_number
            "#,
      )
      .bind(work_order_id)
      .bind(product_number.as_str())
      .execute(&mut *tx)
      .await?;

      tx.commit().await?;

      let number = WorkOrderNumber::new(work_order_id)
         .map_err(|e| InfraError::unexpected(e.to_string()))?;
      Ok(WorkOrderCreation::Created(number))
   }

   async fn find_summaries(&self) -> Result<Vec<WorkOrderSummary>, InfraError> {
      let rows: Vec<WorkOrderSummary> = sqlx::query_as(
         r#"
            SELECT
                wo.work_order_id,
                wo.product_number,
                wo.quantity_to_produce,
                wo.is_completed,
                COUNT(wop.part_number) AS total_parts_needed,
                COUNT(*) FILTER (WHERE wop.quantity_supplied > 0) AS parts_supplied,
                COUNT(*) FILTER (WHERE wop.quantity_supplied = 0) AS parts_missing
            FROM work_orders wo
            JOIN work_order_parts wop ON wo.work_order_id = wop.work_order_id
            GROUP BY
                wo.work_order_id,
                wo.product_number,
                wo.quantity_to_produce,
                wo.is_completed
            ORDER BY wo.work_order_id ASC
            "#,
      )
      .fetch_all(&self.pool)
      .await?;

      Ok(rows)
   }

   async fn find_header(
      &self,
      number: WorkOrderNumber,
   ) -> Result<Option<WorkOrder>, InfraError> {
      let row: Option<WorkOrderRow> = sqlx::query_as(
         r#"
            SELECT
                work_order_id,
                product_number,
                quantity_to_produce,
                is_completed,
                created_at,
                completed_at
            FROM work_orders
            WHERE work_order_id = $1
            "#,
      )
      .bind(number.as_i64())
      .fetch_optional(&self.pool)
      .await?;

      row.map(WorkOrderRow::into_domain).transpose()
   }

   async fn find_unit_rows(
      &self,
      number: WorkOrderNumber,
   ) -> Result<Vec<UnitStationRow>, InfraError> {
      let rows: Vec<UnitStationRow> = sqlx::query_as(
         r#"
            SELECT
                uss.unit_number,
                uss.station_number,
                uss.status AS unit_status,
                uss.comment AS unit_comment,
                woss.status AS station_status,
                woss.notes AS station_comments,
                swop.part_number,
                p.description AS part_description,
                swop.quantity_needed AS quantity_required,
                swop.quantity_supplied
            FROM unit_station_status uss
            JOIN station_work_order_parts swop
                ON swop.work_order_id = uss.work_order_id
                AND swop.station_number = uss.station_number
            JOIN parts p
                ON p.part_number = swop.part_number
            LEFT JOIN work_order_station_status woss
                ON woss.work_order_id = uss.work_order_id
                AND woss.station_number = uss.station_number
            WHERE uss.work_order_id = $1
            ORDER BY uss.unit_number, uss.station_number, swop.part_number
            "#,
      )
      .bind(number.as_i64())
      .fetch_all(&self.pool)
      .await?;

      Ok(rows)
   }

   async fn exists(&self, number: WorkOrderNumber) -> Result<bool, InfraError> {
      let row: Option<(i64,)> =
         sqlx::query_as("SELECT work_order_id FROM work_orders WHERE work_order_id = $1")
            .bind(number.as_i64())
            .fetch_optional(&self.pool)
            .await?;

      Ok(row.is_some())
   }

   async fn complete(
      &self,
      number: WorkOrderNumber,
   ) -> Result<CompletionOutcome, InfraError> {
      // 完了ゲート: 未完了のユニット×ステーション行が残っていれば更新ゼロ件
      let updated: Option<(i64,)> = sqlx::query_as(
         r#"
            UPDATE work_orders
            SET is_completed = TRUE, completed_at = now()
            WHERE work_order_id = $1
              AND is_completed = FALSE
              AND NOT EXISTS (
                  SELECT 1
                  FROM unit_station_status
                  WHERE work_order_id = $1
                    AND status <> 'completed'
              )
            RETURNING work_order_id
            "#,
      )
      .bind(number.as_i64())
      .fetch_optional(&self.pool)
      .await?;

      if updated.is_some() {
         return Ok(CompletionOutcome::Completed);
      }

      // 更新ゼロ件の理由を判別する
      let state: Option<(bool,)> =
         sqlx::query_as("SELECT is_completed FROM work_orders WHERE work_order_id = $1")
            .bind(number.as_i64())
            .fetch_optional(&self.pool)
            .await?;

      match state {
         None => Ok(CompletionOutcome::NotFound),
         Some((true,)) => Ok(CompletionOutcome::AlreadyCompleted),
         Some((false,)) => Ok(CompletionOutcome::NotReady),
      }
   }

   async fn update_unit_comment(
      &self,
      number: WorkOrderNumber,
      unit: UnitNumber,
      station: &StationNumber,
      comment: &str,
   ) -> Result<bool, InfraError> {
      let result = sqlx::query(
         r#"
            UPDATE unit_station_status
            SET comment = $4, updated_at = now()
            WHERE work_order_id = $1
              AND unit_number = $2
              AND station_number = $3
            "#,
      )
      .bind(number.as_i64())
      .bind(unit.as_i32())
      .bind(station.as_str())
      .bind(comment)
      .execute(&self.pool)
      .await?;

      Ok(result.rows_affected() > 0)
   }

   async fn update_unit_status(
      &self,
      number: WorkOrderNumber,
      unit: UnitNumber,
      station: &StationNumber,
      status: StationStatus,
   ) -> Result<bool, InfraError> {
      let status_str: &'static str = status.into();

      let mut tx = self.pool.begin().await?;

      let result = sqlx::query(
         r#"
            UPDATE unit_station_status
            SET status = $4, updated_at = now()
            WHERE work_order_id = $1
              AND unit_number = $2
              AND station_number = $3
            "#,
      )
      .bind(number.as_i64())
      .bind(unit.as_i32())
      .bind(station.as_str())
      .bind(status_str)
      .execute(&mut *tx)
      .await?;

      if result.rows_affected() == 0 {
         return Ok(false);
      }

      // ステーション集約の再計算: alert/hold が 1 件でもあれば最優先、
      // 全完了なら completed、全未着手なら not_started、それ以外は in_progress
      sqlx::query(
         r#"
            INSERT INTO work_order_station_status (work_order_id, station_number, status, updated_at)
            SELECT
                work_order_id,
                station_number,
                CASE
                    WHEN bool_or(status = 'alert') THEN 'alert'
                    WHEN bool_or(status = 'hold') THEN 'hold'
                    WHEN bool_and(status = 'completed') THEN 'completed'
                    WHEN bool_and(status = 'not_started') THEN 'not_started'
                    ELSE 'in_progress'
                END,
                now()
            FROM unit_station_status
            WHERE work_order_id = $1 AND station_number = $2
            GROUP BY work_order_id, station_number
            ON CONFLICT (work_order_id, station_number)
            DO UPDATE SET status = EXCLUDED.status, updated_at = EXCLUDED.updated_at
            "#,
      )
      .bind(number.as_i64())
      .bind(station.as_str())
      .execute(&mut *tx)
      .await?;

      tx.commit().await?;

      Ok(true)
   }
}
