//! Postgres-backed store.
//!
//! A [`PostgresSession`] wraps one SQL transaction, begun lazily on first use.
//! The repository traits are synchronous; async SQLx calls are driven through
//! the tokio runtime handle captured when the session opens, so sessions must
//! be used from a blocking context (e.g. `tokio::task::spawn_blocking`).
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (check constraint violation) | `23514` | `Query` |
//! | Database (other) | Any other | `Query` |
//! | PoolClosed / Io / PoolTimedOut | N/A | `Unavailable` |
//! | ColumnDecode / Decode | N/A | `Decode` |

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tokio::runtime::Handle;
use tracing::{debug, instrument};

use restock_core::ProductId;
use restock_products::{Product, ProductType};
use restock_replenishment::{ForecastRecord, RecommendationRecord};
use restock_sales::SalesObservation;

use super::{
    ForecastRepository, ProductRepository, RecommendationRepository, SalesRepository, Session,
    Store, StoreError,
};

const SCHEMA: &str = include_str!("../../migrations/0001_restock.sql");

/// Postgres-backed store handle. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the schema if it does not exist. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

impl Store for PostgresStore {
    fn open(&self) -> Result<Box<dyn Session + '_>, StoreError> {
        let handle = Handle::try_current().map_err(|_| {
            StoreError::Unavailable(
                "PostgresStore requires a tokio runtime; open sessions from spawn_blocking"
                    .to_string(),
            )
        })?;
        Ok(Box::new(PostgresSession {
            pool: self.pool.clone(),
            handle,
            tx: None,
        }))
    }
}

/// One SQL transaction. Dropping without commit rolls back.
pub struct PostgresSession {
    pool: PgPool,
    handle: Handle,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PostgresSession {
    fn transaction(&mut self) -> Result<&mut Transaction<'static, Postgres>, StoreError> {
        if self.tx.is_none() {
            let tx = self
                .handle
                .block_on(self.pool.begin())
                .map_err(|e| map_sqlx_error("begin_transaction", e))?;
            self.tx = Some(tx);
        }
        self.tx
            .as_mut()
            .ok_or_else(|| StoreError::Unavailable("transaction not started".to_string()))
    }

    fn fetch_all<T>(&mut self, operation: &'static str, sql: &'static str) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        let handle = self.handle.clone();
        let tx = self.transaction()?;
        let rows = handle
            .block_on(sqlx::query(sql).fetch_all(&mut **tx))
            .map_err(|e| map_sqlx_error(operation, e))?;
        rows.iter()
            .map(|row| T::from_row(row).map_err(|e| map_sqlx_error(operation, e)))
            .collect()
    }
}

impl SalesRepository for PostgresSession {
    fn all_sales(&mut self) -> Result<Vec<SalesObservation>, StoreError> {
        let rows: Vec<SalesRow> = self.fetch_all(
            "all_sales",
            r#"
            SELECT product_id, date, quantity_sold, price, location, source
            FROM sales
            ORDER BY id ASC
            "#,
        )?;
        rows.into_iter().map(SalesObservation::try_from).collect()
    }

    fn append_sales(&mut self, records: Vec<SalesObservation>) -> Result<usize, StoreError> {
        let handle = self.handle.clone();
        let tx = self.transaction()?;
        let n = records.len();
        for r in records {
            handle
                .block_on(
                    sqlx::query(
                        r#"
                        INSERT INTO sales (product_id, date, quantity_sold, price, location, source)
                        VALUES ($1, $2, $3, $4, $5, $6)
                        "#,
                    )
                    .bind(r.product_id.as_str())
                    .bind(r.date)
                    .bind(r.quantity_sold)
                    .bind(r.price)
                    .bind(&r.location)
                    .bind(&r.source)
                    .execute(&mut **tx),
                )
                .map_err(|e| map_sqlx_error("append_sales", e))?;
        }
        debug!(rows = n, "staged sales rows");
        Ok(n)
    }
}

impl ProductRepository for PostgresSession {
    fn all_products(&mut self) -> Result<Vec<Product>, StoreError> {
        let rows: Vec<ProductRow> = self.fetch_all(
            "all_products",
            r#"
            SELECT product_id, name, category, product_type, shelf_life_days,
                   lead_time_days, supplier
            FROM products
            ORDER BY product_id ASC
            "#,
        )?;
        rows.into_iter().map(Product::try_from).collect()
    }

    fn insert_products(&mut self, products: Vec<Product>) -> Result<usize, StoreError> {
        let handle = self.handle.clone();
        let tx = self.transaction()?;
        let n = products.len();
        for p in products {
            let shelf_life = to_i32("shelf_life_days", p.shelf_life_days)?;
            let lead_time = p
                .lead_time_days
                .map(|d| to_i32("lead_time_days", d))
                .transpose()?;
            handle
                .block_on(
                    sqlx::query(
                        r#"
                        INSERT INTO products (
                            product_id, name, category, product_type,
                            shelf_life_days, lead_time_days, supplier
                        )
                        VALUES ($1, $2, $3, $4, $5, $6, $7)
                        "#,
                    )
                    .bind(p.product_id.as_str())
                    .bind(&p.name)
                    .bind(&p.category)
                    .bind(p.product_type.as_str())
                    .bind(shelf_life)
                    .bind(lead_time)
                    .bind(&p.supplier)
                    .execute(&mut **tx),
                )
                .map_err(|e| map_sqlx_error("insert_products", e))?;
        }
        Ok(n)
    }
}

impl ForecastRepository for PostgresSession {
    fn forecasts_for(&mut self, product_id: &ProductId) -> Result<Vec<ForecastRecord>, StoreError> {
        let handle = self.handle.clone();
        let tx = self.transaction()?;
        let rows = handle
            .block_on(
                sqlx::query(
                    r#"
                    SELECT product_id, forecast_date, predicted_demand, confidence,
                           model_used, created_at
                    FROM forecasts
                    WHERE product_id = $1
                    ORDER BY id ASC
                    "#,
                )
                .bind(product_id.as_str())
                .fetch_all(&mut **tx),
            )
            .map_err(|e| map_sqlx_error("forecasts_for", e))?;

        rows.iter()
            .map(|row| {
                ForecastRow::from_row(row)
                    .map_err(|e| map_sqlx_error("forecasts_for", e))
                    .and_then(ForecastRecord::try_from)
            })
            .collect()
    }

    fn append_forecast(&mut self, record: ForecastRecord) -> Result<(), StoreError> {
        let handle = self.handle.clone();
        let tx = self.transaction()?;
        handle
            .block_on(
                sqlx::query(
                    r#"
                    INSERT INTO forecasts (
                        product_id, forecast_date, predicted_demand, confidence,
                        model_used, created_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(record.product_id.as_str())
                .bind(record.forecast_date)
                .bind(record.predicted_demand)
                .bind(record.confidence)
                .bind(&record.model_used)
                .bind(record.created_at)
                .execute(&mut **tx),
            )
            .map_err(|e| map_sqlx_error("append_forecast", e))?;
        Ok(())
    }
}

impl RecommendationRepository for PostgresSession {
    fn append_recommendation(&mut self, record: RecommendationRecord) -> Result<(), StoreError> {
        let handle = self.handle.clone();
        let tx = self.transaction()?;
        handle
            .block_on(
                sqlx::query(
                    r#"
                    INSERT INTO recommendations (
                        product_id, recommended_qty, confidence, reason,
                        valid_until, created_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(record.product_id.as_str())
                .bind(record.recommended_qty)
                .bind(record.confidence)
                .bind(&record.reason)
                .bind(record.valid_until)
                .bind(record.created_at)
                .execute(&mut **tx),
            )
            .map_err(|e| map_sqlx_error("append_recommendation", e))?;
        Ok(())
    }

    fn all_recommendations(&mut self) -> Result<Vec<RecommendationRecord>, StoreError> {
        let rows: Vec<RecommendationRow> = self.fetch_all(
            "all_recommendations",
            r#"
            SELECT product_id, recommended_qty, confidence, reason, valid_until, created_at
            FROM recommendations
            ORDER BY id ASC
            "#,
        )?;
        rows.into_iter().map(RecommendationRecord::try_from).collect()
    }
}

impl Session for PostgresSession {
    fn commit(&mut self) -> Result<(), StoreError> {
        match self.tx.take() {
            Some(tx) => self
                .handle
                .block_on(tx.commit())
                .map_err(|e| StoreError::Commit(e.to_string())),
            None => Ok(()),
        }
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        match self.tx.take() {
            Some(tx) => self
                .handle
                .block_on(tx.rollback())
                .map_err(|e| map_sqlx_error("rollback", e)),
            None => Ok(()),
        }
    }
}

// Row types

struct SalesRow {
    product_id: String,
    date: Option<NaiveDate>,
    quantity_sold: Option<f64>,
    price: f64,
    location: String,
    source: String,
}

impl<'r> FromRow<'r, PgRow> for SalesRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            product_id: row.try_get("product_id")?,
            date: row.try_get("date")?,
            quantity_sold: row.try_get("quantity_sold")?,
            price: row.try_get("price")?,
            location: row.try_get("location")?,
            source: row.try_get("source")?,
        })
    }
}

impl TryFrom<SalesRow> for SalesObservation {
    type Error = StoreError;

    fn try_from(row: SalesRow) -> Result<Self, Self::Error> {
        Ok(SalesObservation {
            product_id: decode_product_id(&row.product_id)?,
            date: row.date,
            quantity_sold: row.quantity_sold,
            price: row.price,
            location: row.location,
            source: row.source,
        })
    }
}

struct ProductRow {
    product_id: String,
    name: String,
    category: String,
    product_type: String,
    shelf_life_days: i32,
    lead_time_days: Option<i32>,
    supplier: String,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            product_id: row.try_get("product_id")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            product_type: row.try_get("product_type")?,
            shelf_life_days: row.try_get("shelf_life_days")?,
            lead_time_days: row.try_get("lead_time_days")?,
            supplier: row.try_get("supplier")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let product_type: ProductType = row
            .product_type
            .parse()
            .map_err(|_| StoreError::Decode(format!("unknown product_type {:?}", row.product_type)))?;
        Ok(Product {
            product_id: decode_product_id(&row.product_id)?,
            name: row.name,
            category: row.category,
            product_type,
            shelf_life_days: from_i32("shelf_life_days", row.shelf_life_days)?,
            lead_time_days: row
                .lead_time_days
                .map(|d| from_i32("lead_time_days", d))
                .transpose()?,
            supplier: row.supplier,
        })
    }
}

struct ForecastRow {
    product_id: String,
    forecast_date: NaiveDate,
    predicted_demand: f64,
    confidence: f64,
    model_used: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ForecastRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            product_id: row.try_get("product_id")?,
            forecast_date: row.try_get("forecast_date")?,
            predicted_demand: row.try_get("predicted_demand")?,
            confidence: row.try_get("confidence")?,
            model_used: row.try_get("model_used")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<ForecastRow> for ForecastRecord {
    type Error = StoreError;

    fn try_from(row: ForecastRow) -> Result<Self, Self::Error> {
        Ok(ForecastRecord {
            product_id: decode_product_id(&row.product_id)?,
            forecast_date: row.forecast_date,
            predicted_demand: row.predicted_demand,
            confidence: row.confidence,
            model_used: row.model_used,
            created_at: row.created_at,
        })
    }
}

struct RecommendationRow {
    product_id: String,
    recommended_qty: f64,
    confidence: f64,
    reason: String,
    valid_until: NaiveDate,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for RecommendationRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            product_id: row.try_get("product_id")?,
            recommended_qty: row.try_get("recommended_qty")?,
            confidence: row.try_get("confidence")?,
            reason: row.try_get("reason")?,
            valid_until: row.try_get("valid_until")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<RecommendationRow> for RecommendationRecord {
    type Error = StoreError;

    fn try_from(row: RecommendationRow) -> Result<Self, Self::Error> {
        Ok(RecommendationRecord {
            product_id: decode_product_id(&row.product_id)?,
            recommended_qty: row.recommended_qty,
            confidence: row.confidence,
            reason: row.reason,
            valid_until: row.valid_until,
            created_at: row.created_at,
        })
    }
}

fn decode_product_id(raw: &str) -> Result<ProductId, StoreError> {
    ProductId::parse(raw).map_err(|e| StoreError::Decode(e.to_string()))
}

fn to_i32(column: &str, value: u32) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Query(format!("{column} out of range: {value}")))
}

fn from_i32(column: &str, value: i32) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Decode(format!("{column} is negative: {value}")))
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Query(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{operation}: {err}"))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Decode(format!("{operation}: {err}"))
        }
        _ => StoreError::Query(format!("sqlx error in {operation}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_row_decodes_into_domain_product() {
        let row = ProductRow {
            product_id: "SKU_101".to_string(),
            name: "Milk".to_string(),
            category: "Dairy".to_string(),
            product_type: "Perishable".to_string(),
            shelf_life_days: 7,
            lead_time_days: Some(2),
            supplier: "DairyCo".to_string(),
        };
        let p = Product::try_from(row).unwrap();
        assert_eq!(p.product_id.as_str(), "SKU_101");
        assert_eq!(p.product_type, ProductType::Perishable);
        assert_eq!(p.lead_time_days, Some(2));
    }

    #[test]
    fn negative_lead_time_is_a_decode_error() {
        let row = ProductRow {
            product_id: "SKU_101".to_string(),
            name: "Milk".to_string(),
            category: "Dairy".to_string(),
            product_type: "Perishable".to_string(),
            shelf_life_days: 7,
            lead_time_days: Some(-1),
            supplier: "DairyCo".to_string(),
        };
        assert!(matches!(Product::try_from(row), Err(StoreError::Decode(_))));
    }

    #[test]
    fn blank_product_id_is_a_decode_error() {
        let row = SalesRow {
            product_id: "  ".to_string(),
            date: None,
            quantity_sold: Some(1.0),
            price: 0.0,
            location: String::new(),
            source: "csv_upload".to_string(),
        };
        assert!(matches!(
            SalesObservation::try_from(row),
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn pool_closed_maps_to_unavailable() {
        let err = map_sqlx_error("all_sales", sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
