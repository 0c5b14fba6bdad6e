//! # ProductRepository
//!
//! 製品カタログの読み取りを担当するリポジトリ。

use async_trait::async_trait;
use genbaflow_domain::part::{Product, ProductNumber};
use sqlx::PgPool;

use crate::error::InfraError;

/// 製品リポジトリトレイト
#[async_trait]
pub trait ProductRepository: Send + Sync {
   /// 全製品を製品番号順に取得する
   async fn find_all(&self) -> Result<Vec<Product>, InfraError>;
}

/// products テーブルの行
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
   product_number: String,
   description:    String,
}

impl ProductRow {
   fn into_domain(self) -> Result<Product, InfraError> {
      Ok(Product::from_db(
         ProductNumber::new(&self.product_number)
            .map_err(|e| InfraError::unexpected(e.to_string()))?,
         self.description,
      ))
   }
}

/// PostgreSQL 実装の ProductRepository
#[derive(Debug, Clone)]
pub struct PostgresProductRepository {
   pool: PgPool,
}

impl PostgresProductRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
   async fn find_all(&self) -> Result<Vec<Product>, InfraError> {
      let rows: Vec<ProductRow> = sqlx::query_as(
         r#"
            SELECT
                product_number,
                description
            FROM products
            ORDER BY product_number
            "#,
      )
      .fetch_all(&self.pool)
      .await?;

      rows.into_iter().map(ProductRow::into_domain).collect()
   }
}
