//! # AutoInven
//!
//! Inventory and bill management backend.
//!
//! AutoInven keeps bills, items and deliveries in PostgreSQL and mails a
//! report to the store owner when bills are pending or stock runs low.
//!
//! ## Architecture
//!
//! - **Alerting**: throttled dispatch of pending-bill and low-stock mail
//! - **Storage**: PostgreSQL via sqlx
//! - **API**: REST API whose page views trigger alert checks
//!
//! ## Quick Start
//!
//! ```bash
//! # Apply migrations and run the startup checks
//! autoinven db migrate
//!
//! # Serve the API
//! autoinven serve
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerting;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use crate::config::Config;
pub use crate::error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::alerting::{AlertDispatcher, AlertService, DispatcherSettings};
    pub use crate::config::Config;
    pub use crate::db::Database;
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
}
