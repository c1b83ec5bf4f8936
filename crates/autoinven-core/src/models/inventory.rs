//! Store read models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A bill owed to an institution
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bill {
    /// Row ID
    pub id: i64,
    /// Who the bill is owed to
    pub institution_name: String,
    /// Contact phone number
    pub phone_number: Option<String>,
    /// Contact e-mail
    pub email: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// What the bill is for
    pub description: String,
    /// Free-form payment instructions
    pub payment_details: Option<String>,
    /// Amount due
    pub amount: f64,
    /// `true` once paid
    pub status: bool,
    /// When the bill was recorded
    pub created_at: DateTime<Utc>,
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DashboardSummary {
    /// Number of distinct items
    pub item_count: i64,
    /// Sum of all item quantities
    pub total_quantity: i64,
    /// Bills not yet paid
    pub pending_bill_count: i64,
    /// Items below the low-stock threshold
    pub low_stock_count: i64,
    /// Deliveries not yet delivered
    pub pending_delivery_count: i64,
}
