//! Alert data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of alert with its own independent throttle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Bills that have not been paid
    PendingBills,
    /// Items that need restocking
    LowStock,
}

impl AlertKind {
    /// Every kind, in the order checks are run
    pub const ALL: [AlertKind; 2] = [AlertKind::PendingBills, AlertKind::LowStock];

    /// Stable name used in logs and JSON
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::PendingBills => "pending_bills",
            AlertKind::LowStock => "low_stock",
        }
    }

    /// Mail subject line
    pub fn subject(self) -> &'static str {
        match self {
            AlertKind::PendingBills => "💡 Pending Bills Alert",
            AlertKind::LowStock => "🔔 Low Stock Alert | AutoInven",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record filter evaluated by the data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Bills whose status is unpaid
    Unpaid,
    /// Items with `quantity < threshold`
    QuantityBelow {
        /// Exclusive upper bound
        threshold: i32,
    },
}

/// What to look for and how to label it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCondition {
    /// Which throttle this condition consults
    pub kind: AlertKind,
    /// Filter applied to the data source
    pub predicate: Predicate,
}

impl AlertCondition {
    /// Unpaid bills
    pub fn pending_bills() -> Self {
        Self {
            kind: AlertKind::PendingBills,
            predicate: Predicate::Unpaid,
        }
    }

    /// Items with a quantity strictly below `threshold`
    pub fn low_stock(threshold: i32) -> Self {
        Self {
            kind: AlertKind::LowStock,
            predicate: Predicate::QuantityBelow { threshold },
        }
    }
}

/// A record matched by an alert condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertRecord {
    /// An unpaid bill
    PendingBill {
        /// Who the bill is owed to
        institution_name: String,
        /// What the bill is for
        description: String,
        /// Amount due
        amount: f64,
    },
    /// An item that needs restocking
    LowStockItem {
        /// Product name
        name: String,
        /// Category name
        category: String,
        /// Units on hand
        quantity: i32,
        /// Supplying vendor, if any
        vendor: Option<String>,
    },
}

impl AlertRecord {
    /// Display cells for one table row
    pub fn cells(&self) -> Vec<String> {
        match self {
            AlertRecord::PendingBill {
                institution_name,
                description,
                amount,
            } => vec![
                institution_name.clone(),
                description.clone(),
                format!("{amount:.2}"),
            ],
            AlertRecord::LowStockItem {
                name,
                category,
                quantity,
                vendor,
            } => vec![
                name.clone(),
                category.clone(),
                quantity.to_string(),
                vendor.clone().unwrap_or_else(|| "N/A".to_string()),
            ],
        }
    }
}

/// Why a dispatch did not send anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A notification of this kind went out within the cooldown window
    CooldownActive,
    /// The data source returned no records
    NoMatchingRecords,
    /// Another check of this kind was still running
    CheckInProgress,
}

/// Outcome of a single dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchResult {
    /// Notification delivered to the transport
    Sent {
        /// Number of rows in the notification
        record_count: usize,
    },
    /// Nothing was sent
    Skipped {
        /// Why
        reason: SkipReason,
    },
    /// The send was attempted and failed
    Failed {
        /// Transport error message
        error: String,
    },
}

impl DispatchResult {
    /// Whether a notification went out
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchResult::Sent { .. })
    }
}

impl std::fmt::Display for DispatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchResult::Sent { record_count } => write!(f, "sent ({record_count} records)"),
            DispatchResult::Skipped {
                reason: SkipReason::CooldownActive,
            } => f.write_str("skipped (cooldown active)"),
            DispatchResult::Skipped {
                reason: SkipReason::NoMatchingRecords,
            } => f.write_str("skipped (no matching records)"),
            DispatchResult::Skipped {
                reason: SkipReason::CheckInProgress,
            } => f.write_str("skipped (check in progress)"),
            DispatchResult::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Rendered notification, derived fresh for every attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
    /// Destination address
    pub recipient: String,
    /// Subject line
    pub subject: String,
    /// Heading shown above the table
    pub heading: String,
    /// Line introducing the table
    pub intro: String,
    /// Table column headers
    pub columns: Vec<&'static str>,
    /// One row per matched record, in source order
    pub rows: Vec<Vec<String>>,
    /// Line below the table
    pub closing: String,
    /// Complete HTML document
    pub html_body: String,
}

/// Throttle status for one alert kind
#[derive(Debug, Clone, Serialize)]
pub struct AlertStatus {
    /// Alert kind
    pub kind: AlertKind,
    /// Last successful send
    pub last_sent_at: Option<DateTime<Utc>>,
    /// Whether the next check would be skipped
    pub cooling_down: bool,
}

/// Result of checking one alert kind
#[derive(Debug, Clone, Serialize)]
pub struct AlertCheck {
    /// Alert kind
    pub kind: AlertKind,
    /// What happened
    pub result: DispatchResult,
}
