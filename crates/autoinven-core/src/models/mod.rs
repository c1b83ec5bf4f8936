//! Data models for AutoInven

mod alert;
mod inventory;

pub use alert::*;
pub use inventory::*;
