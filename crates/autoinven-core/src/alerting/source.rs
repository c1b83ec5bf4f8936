//! Data source consulted by alert checks

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AlertCondition, AlertRecord};

/// Anything that can list the records matching an alert condition
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// Records matching `condition`, in a stable order
    async fn query(&self, condition: &AlertCondition) -> Result<Vec<AlertRecord>>;
}
