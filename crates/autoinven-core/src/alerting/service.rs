//! Application-facing alert service

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::models::{AlertCheck, AlertCondition, AlertKind, AlertStatus, DispatchResult};

use super::clock::{Clock, SystemClock};
use super::dispatcher::{AlertDispatcher, DispatcherSettings};
use super::notifier::{NotificationTransport, SmtpNotifier};
use super::source::AlertSource;

struct Inner {
    dispatcher: AlertDispatcher,
    clock: Arc<dyn Clock>,
    low_stock_threshold: i32,
}

/// Shared handle that trigger points use to run alert checks.
///
/// Cheap to clone; every clone shares the same throttle state.
#[derive(Clone)]
pub struct AlertService {
    inner: Arc<Inner>,
}

impl AlertService {
    /// Create a service around an existing dispatcher
    pub fn new(
        dispatcher: AlertDispatcher,
        clock: Arc<dyn Clock>,
        low_stock_threshold: i32,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                dispatcher,
                clock,
                low_stock_threshold,
            }),
        }
    }

    /// Wire up SMTP delivery against `source` using application config
    pub fn from_config(config: &Config, source: Arc<dyn AlertSource>) -> Result<Self> {
        let transport: Arc<dyn NotificationTransport> =
            Arc::new(SmtpNotifier::from_config(&config.smtp)?);
        let settings = DispatcherSettings::from_config(config);
        let dispatcher = AlertDispatcher::new(source, transport, settings);

        Ok(Self::new(
            dispatcher,
            Arc::new(SystemClock),
            config.alerting.low_stock_threshold,
        ))
    }

    /// Threshold below which an item counts as low on stock
    pub fn low_stock_threshold(&self) -> i32 {
        self.inner.low_stock_threshold
    }

    /// Condition checked for `kind`
    pub fn condition(&self, kind: AlertKind) -> AlertCondition {
        match kind {
            AlertKind::PendingBills => AlertCondition::pending_bills(),
            AlertKind::LowStock => AlertCondition::low_stock(self.inner.low_stock_threshold),
        }
    }

    /// Run the check for `kind` now, waiting for one already in flight.
    ///
    /// Never fails: a data-source error is logged and reported as
    /// [`DispatchResult::Failed`] so the caller can carry on.
    pub async fn check(&self, kind: AlertKind) -> DispatchResult {
        let condition = self.condition(kind);
        let now = self.inner.clock.now();
        fold(kind, self.inner.dispatcher.maybe_dispatch(&condition, now).await)
    }

    /// Run the check for `kind` unless one is already in flight.
    ///
    /// Used by page views, which skip with
    /// [`SkipReason::CheckInProgress`](crate::models::SkipReason::CheckInProgress)
    /// rather than queue behind a slow send.
    pub async fn try_check(&self, kind: AlertKind) -> DispatchResult {
        let condition = self.condition(kind);
        let now = self.inner.clock.now();
        fold(kind, self.inner.dispatcher.try_dispatch(&condition, now).await)
    }

    /// Check every alert kind, pending bills first
    pub async fn check_all(&self) -> Vec<AlertCheck> {
        let mut checks = Vec::with_capacity(AlertKind::ALL.len());
        for kind in AlertKind::ALL {
            let result = self.check(kind).await;
            checks.push(AlertCheck { kind, result });
        }
        checks
    }

    /// Hook the host process calls once after initialization
    pub async fn on_startup(&self) -> Vec<AlertCheck> {
        info!("Running startup alert checks");

        let checks = self.check_all().await;
        for check in &checks {
            match &check.result {
                DispatchResult::Failed { error } => {
                    warn!(kind = %check.kind, error = %error, "Startup alert check failed");
                }
                result => info!(kind = %check.kind, result = %result, "Startup alert check"),
            }
        }
        checks
    }

    /// Throttle status of every alert kind, as of the last completed send
    pub fn status(&self) -> Vec<AlertStatus> {
        let now = self.inner.clock.now();
        let dispatcher = &self.inner.dispatcher;
        AlertKind::ALL
            .into_iter()
            .map(|kind| AlertStatus {
                kind,
                last_sent_at: dispatcher.last_sent_at(kind),
                cooling_down: dispatcher.is_cooling_down(kind, now),
            })
            .collect()
    }
}

fn fold(kind: AlertKind, outcome: Result<DispatchResult>) -> DispatchResult {
    match outcome {
        Ok(result) => result,
        Err(e) => {
            error!(kind = %kind, error = %e, "Alert check failed");
            DispatchResult::Failed {
                error: e.to_string(),
            }
        }
    }
}
