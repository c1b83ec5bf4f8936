//! Per-kind cooldown bookkeeping

use chrono::{DateTime, Duration, Utc};

/// When an alert kind last went out.
///
/// Starts empty and only moves forward. Lives as long as the dispatcher
/// that owns it; nothing is persisted across restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleState {
    last_sent_at: Option<DateTime<Utc>>,
}

impl ThrottleState {
    /// Fresh state with no recorded send
    pub fn new() -> Self {
        Self::default()
    }

    /// Last successful send
    pub fn last_sent_at(&self) -> Option<DateTime<Utc>> {
        self.last_sent_at
    }

    /// Whether a send at `now` falls inside the cooldown window
    pub fn is_cooling_down(&self, now: DateTime<Utc>, cooldown: Duration) -> bool {
        match self.last_sent_at {
            Some(last) => now - last < cooldown,
            None => false,
        }
    }

    /// Record a successful send at `now`
    pub fn record_sent(&mut self, now: DateTime<Utc>) {
        self.last_sent_at = Some(match self.last_sent_at {
            Some(last) if last > now => last,
            _ => now,
        });
    }
}
