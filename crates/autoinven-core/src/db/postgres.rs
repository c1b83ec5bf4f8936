//! PostgreSQL connection and store queries

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use crate::alerting::AlertSource;
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{AlertCondition, AlertRecord, Bill, DashboardSummary, Predicate};

/// PostgreSQL connection pool
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Create a new PostgreSQL connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct PendingBillRow {
    institution_name: String,
    description: String,
    amount: f64,
}

#[derive(sqlx::FromRow)]
struct LowStockRow {
    name: String,
    category: String,
    quantity: i32,
    vendor: Option<String>,
}

/// Queries over bills, items and deliveries
#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    /// Create a new inventory repository
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool.clone(),
        }
    }

    /// Unpaid bills, oldest first
    pub async fn pending_bills(&self) -> Result<Vec<AlertRecord>> {
        let rows = sqlx::query_as::<_, PendingBillRow>(
            r#"
            SELECT institution_name, description, amount
            FROM bills
            WHERE status = FALSE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| AlertRecord::PendingBill {
                institution_name: r.institution_name,
                description: r.description,
                amount: r.amount,
            })
            .collect())
    }

    /// Items with a quantity strictly below `threshold`
    pub async fn low_stock_items(&self, threshold: i32) -> Result<Vec<AlertRecord>> {
        let rows = sqlx::query_as::<_, LowStockRow>(
            r#"
            SELECT i.name, c.name AS category, i.quantity, v.name AS vendor
            FROM items i
            JOIN categories c ON c.id = i.category_id
            LEFT JOIN vendors v ON v.id = i.vendor_id
            WHERE i.quantity < $1
            ORDER BY i.id
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| AlertRecord::LowStockItem {
                name: r.name,
                category: r.category,
                quantity: r.quantity,
                vendor: r.vendor,
            })
            .collect())
    }

    /// All bills, newest first
    pub async fn list_bills(&self) -> Result<Vec<Bill>> {
        let bills = sqlx::query_as::<_, Bill>(
            r#"
            SELECT id, institution_name, phone_number, email, address,
                   description, payment_details, amount, status, created_at
            FROM bills
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    /// Headline numbers for the dashboard
    pub async fn dashboard_summary(&self, low_stock_threshold: i32) -> Result<DashboardSummary> {
        let summary = sqlx::query_as::<_, DashboardSummary>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM items) AS item_count,
                (SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM items) AS total_quantity,
                (SELECT COUNT(*) FROM bills WHERE status = FALSE) AS pending_bill_count,
                (SELECT COUNT(*) FROM items WHERE quantity < $1) AS low_stock_count,
                (SELECT COUNT(*) FROM deliveries WHERE is_delivered = FALSE) AS pending_delivery_count
            "#,
        )
        .bind(low_stock_threshold)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }
}

#[async_trait]
impl AlertSource for InventoryRepository {
    async fn query(&self, condition: &AlertCondition) -> Result<Vec<AlertRecord>> {
        let records = match condition.predicate {
            Predicate::Unpaid => self.pending_bills().await?,
            Predicate::QuantityBelow { threshold } => self.low_stock_items(threshold).await?,
        };

        debug!(kind = %condition.kind, count = records.len(), "Queried alert records");
        Ok(records)
    }
}
