//! PostgreSQL implementation of the catalog contracts.
//!
//! Reads `products` and `categories`, and owns the `outbox` change log.

use std::time::Duration;

use async_trait::async_trait;
use catalog_sync_repository::{CategorySource, SearchIndexError};
use catalog_sync_shared::{Category, ChangeAction, ChangeRecord, Product};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use tracing::debug;

use crate::catalog::{CatalogStore, ChangeLog};
use crate::errors::CatalogError;

/// Product columns with NULLs normalized to the row type's empty values.
const PRODUCT_COLUMNS: &str = "id, category_id, \
    COALESCE(name, '') AS name, COALESCE(url, '') AS url, \
    COALESCE(price, 0) AS price, COALESCE(currency, '') AS currency, \
    COALESCE(picture, '') AS picture, COALESCE(vendor, '') AS vendor, \
    COALESCE(country, '') AS country, COALESCE(description, '') AS description, \
    COALESCE(market_description, '') AS market_description, \
    weight, COALESCE(available, false) AS available, params, \
    created_at, COALESCE(updated_at, created_at) AS updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    category_id: i32,
    name: String,
    url: String,
    price: f64,
    currency: String,
    picture: String,
    vendor: String,
    country: String,
    description: String,
    market_description: String,
    weight: Option<f64>,
    available: bool,
    params: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            url: row.url,
            price: row.price,
            currency: row.currency,
            picture: row.picture,
            vendor: row.vendor,
            country: row.country,
            description: row.description,
            market_description: row.market_description,
            weight: row.weight,
            available: row.available,
            params: row.params,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    parent_id: Option<i32>,
    name: String,
}

#[derive(sqlx::FromRow)]
struct ChangeRow {
    id: i64,
    entity_type: String,
    entity_id: i32,
    action: String,
    payload: Option<Value>,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl From<ChangeRow> for ChangeRecord {
    fn from(row: ChangeRow) -> Self {
        ChangeRecord {
            id: row.id,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            action: ChangeAction::from_db(&row.action),
            payload: row.payload,
            created_at: row.created_at,
            processed_at: row.processed_at,
        }
    }
}

/// PostgreSQL-backed catalog, category source and change log.
#[derive(Clone)]
pub struct PostgresCatalog {
    /// PostgreSQL connection pool
    pool: PgPool,
}

impl PostgresCatalog {
    /// Creates a catalog over a pool whose database carries the catalog schema.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for catalog writers that open their own transactions.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Append a change record inside the caller's transaction.
    ///
    /// Catalog writers call this in the same transaction as the mutation, which
    /// is what makes the log authoritative even when the index write fails later.
    pub async fn append_tx(
        tx: &mut Transaction<'_, Postgres>,
        entity_type: &str,
        entity_id: i32,
        action: ChangeAction,
        payload: Option<&Value>,
    ) -> Result<i64, CatalogError> {
        insert_change(&mut **tx, entity_type, entity_id, action, payload).await
    }
}

async fn insert_change<'e, E>(
    executor: E,
    entity_type: &str,
    entity_id: i32,
    action: ChangeAction,
    payload: Option<&Value>,
) -> Result<i64, CatalogError>
where
    E: PgExecutor<'e>,
{
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO outbox (entity_type, entity_id, action, payload) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(entity_type)
    .bind(entity_id)
    .bind(action.as_str())
    .bind(payload)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

#[async_trait]
impl CatalogStore for PostgresCatalog {
    async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError> {
        let query = format!("SELECT {} FROM products ORDER BY id", PRODUCT_COLUMNS);
        let rows: Vec<ProductRow> = sqlx::query_as(&query).fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn fetch_product(&self, id: i32) -> Result<Option<Product>, CatalogError> {
        let query = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let row: Option<ProductRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }
}

#[async_trait]
impl CategorySource for PostgresCatalog {
    async fn fetch_categories(&self) -> Result<Vec<Category>, SearchIndexError> {
        let rows: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, parent_id, name FROM categories ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(CatalogError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| Category::new(row.id, row.parent_id, row.name))
            .collect())
    }
}

#[async_trait]
impl ChangeLog for PostgresCatalog {
    async fn append(
        &self,
        entity_type: &str,
        entity_id: i32,
        action: ChangeAction,
        payload: Option<&Value>,
    ) -> Result<i64, CatalogError> {
        insert_change(&self.pool, entity_type, entity_id, action, payload).await
    }

    async fn fetch_pending(&self, limit: usize) -> Result<Vec<ChangeRecord>, CatalogError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<ChangeRow> = sqlx::query_as(
            "SELECT id, entity_type, entity_id, action, payload, created_at, processed_at \
             FROM outbox \
             WHERE processed_at IS NULL \
             ORDER BY created_at ASC, id ASC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChangeRecord::from).collect())
    }

    async fn mark_processed(&self, ids: &[i64]) -> Result<(), CatalogError> {
        if ids.is_empty() {
            return Ok(());
        }

        let result = sqlx::query(
            "UPDATE outbox SET processed_at = NOW() \
             WHERE id = ANY($1) AND processed_at IS NULL",
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;

        debug!(
            requested = ids.len(),
            updated = result.rows_affected(),
            "Marked change records processed"
        );
        Ok(())
    }

    async fn purge_processed(&self, older_than: Duration) -> Result<u64, CatalogError> {
        let retention = chrono::Duration::from_std(older_than)
            .map_err(|e| CatalogError::invalid_input(format!("Retention out of range: {}", e)))?;
        let cutoff = Utc::now()
            .checked_sub_signed(retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let result = sqlx::query(
            "DELETE FROM outbox WHERE processed_at IS NOT NULL AND processed_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
