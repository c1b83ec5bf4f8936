//! Alerting system for AutoInven
//!
//! Watches the store for unpaid bills and low stock, and mails a report to
//! the configured recipient at most once per cooldown window per alert kind.

mod clock;
mod dispatcher;
mod notifier;
pub mod render;
mod service;
mod source;
mod throttle;

pub use clock::{Clock, SystemClock};
pub use dispatcher::{AlertDispatcher, DispatcherSettings};
pub use notifier::{NotificationError, NotificationTransport, SmtpNotifier};
pub use service::AlertService;
pub use source::AlertSource;
pub use throttle::ThrottleState;
