//! Throttled alert dispatch

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::Result;
use crate::models::{AlertCondition, AlertKind, DispatchResult, SkipReason};

use super::notifier::{NotificationError, NotificationTransport};
use super::render;
use super::source::AlertSource;
use super::throttle::ThrottleState;

/// Dispatcher tunables
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    /// Destination for every alert
    pub recipient: String,
    /// Minimum time between two sends of the same kind
    pub cooldown: Duration,
    /// Upper bound on one send attempt
    pub send_timeout: StdDuration,
}

impl DispatcherSettings {
    /// Settings with the default one hour cooldown and 30 second send timeout
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            cooldown: Duration::seconds(3600),
            send_timeout: StdDuration::from_secs(30),
        }
    }

    /// Settings taken from application config
    pub fn from_config(config: &Config) -> Self {
        Self {
            recipient: config.smtp.recipient.clone(),
            cooldown: config.alerting.cooldown(),
            send_timeout: config.alerting.send_timeout(),
        }
    }

    /// Override the cooldown
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Override the send timeout
    #[must_use]
    pub fn with_send_timeout(mut self, timeout: StdDuration) -> Self {
        self.send_timeout = timeout;
        self
    }
}

struct KindSlot {
    state: Mutex<ThrottleState>,
    published: RwLock<ThrottleState>,
}

impl KindSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(ThrottleState::new()),
            published: RwLock::new(ThrottleState::new()),
        }
    }
}

/// Sends alert notifications, at most once per cooldown window per kind.
///
/// Each kind has its own lock, held from the cooldown check through the
/// send, so concurrent callers for one kind never both send inside a window.
/// A copy of the state is published after every send for readers that must
/// not wait on an in-flight check.
pub struct AlertDispatcher {
    source: Arc<dyn AlertSource>,
    transport: Arc<dyn NotificationTransport>,
    settings: DispatcherSettings,
    pending_bills: KindSlot,
    low_stock: KindSlot,
}

impl AlertDispatcher {
    /// Create a dispatcher with empty throttle state
    pub fn new(
        source: Arc<dyn AlertSource>,
        transport: Arc<dyn NotificationTransport>,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            source,
            transport,
            settings,
            pending_bills: KindSlot::new(),
            low_stock: KindSlot::new(),
        }
    }

    /// Current settings
    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    fn slot(&self, kind: AlertKind) -> &KindSlot {
        match kind {
            AlertKind::PendingBills => &self.pending_bills,
            AlertKind::LowStock => &self.low_stock,
        }
    }

    /// Check `condition` and send a notification if it is due.
    ///
    /// Waits for any check of the same kind already in flight. Transport
    /// failures come back as [`DispatchResult::Failed`]; only a data-source
    /// error is returned as `Err`. Neither advances the throttle.
    pub async fn maybe_dispatch(
        &self,
        condition: &AlertCondition,
        now: DateTime<Utc>,
    ) -> Result<DispatchResult> {
        let slot = self.slot(condition.kind);
        let state = slot.state.lock().await;
        self.dispatch_locked(slot, state, condition, now).await
    }

    /// Like [`maybe_dispatch`](Self::maybe_dispatch), but skips with
    /// [`SkipReason::CheckInProgress`] instead of queueing behind a check of
    /// the same kind.
    pub async fn try_dispatch(
        &self,
        condition: &AlertCondition,
        now: DateTime<Utc>,
    ) -> Result<DispatchResult> {
        let slot = self.slot(condition.kind);
        let Ok(state) = slot.state.try_lock() else {
            debug!(kind = %condition.kind, "Alert check already running, skipping");
            return Ok(DispatchResult::Skipped {
                reason: SkipReason::CheckInProgress,
            });
        };
        self.dispatch_locked(slot, state, condition, now).await
    }

    async fn dispatch_locked(
        &self,
        slot: &KindSlot,
        mut state: MutexGuard<'_, ThrottleState>,
        condition: &AlertCondition,
        now: DateTime<Utc>,
    ) -> Result<DispatchResult> {
        let kind = condition.kind;

        if state.is_cooling_down(now, self.settings.cooldown) {
            debug!(
                kind = %kind,
                last_sent_at = ?state.last_sent_at(),
                "Alert sent recently, skipping"
            );
            return Ok(DispatchResult::Skipped {
                reason: SkipReason::CooldownActive,
            });
        }

        let records = self.source.query(condition).await?;
        if records.is_empty() {
            debug!(kind = %kind, "No matching records");
            return Ok(DispatchResult::Skipped {
                reason: SkipReason::NoMatchingRecords,
            });
        }

        let payload = render::render(
            condition,
            &records,
            &self.settings.recipient,
            self.transport.inline_logo(),
        );

        let timeout = self.settings.send_timeout;
        let outcome = match tokio::time::timeout(timeout, self.transport.send(&payload)).await {
            Ok(result) => result,
            Err(_) => Err(NotificationError::Timeout(timeout)),
        };

        match outcome {
            Ok(()) => {
                state.record_sent(now);
                *slot.published.write() = *state;
                info!(kind = %kind, record_count = records.len(), "Alert dispatched");
                Ok(DispatchResult::Sent {
                    record_count: records.len(),
                })
            }
            Err(e) => {
                error!(kind = %kind, error = %e, "Failed to send alert");
                Ok(DispatchResult::Failed {
                    error: e.to_string(),
                })
            }
        }
    }

    /// Last successful send of `kind`
    pub fn last_sent_at(&self, kind: AlertKind) -> Option<DateTime<Utc>> {
        self.slot(kind).published.read().last_sent_at()
    }

    /// Whether a check of `kind` at `now` would be skipped for cooldown
    pub fn is_cooling_down(&self, kind: AlertKind, now: DateTime<Utc>) -> bool {
        self.slot(kind)
            .published
            .read()
            .is_cooling_down(now, self.settings.cooldown)
    }
}
