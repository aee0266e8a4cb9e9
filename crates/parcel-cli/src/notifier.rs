//! Terminal presentation of tracking changes.

use parcel_core::models::NotificationIntent;
use parcel_core::notify::{Notifier, TracingNotifier};

/// Prints one line per notification to stdout and keeps a log record of it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier {
    log: TracingNotifier,
}

impl Notifier for TerminalNotifier {
    fn present(&self, intent: &NotificationIntent) {
        println!("{}", format_notification(intent));
        self.log.present(intent);
    }
}

pub fn format_notification(intent: &NotificationIntent) -> String {
    format!("[{}] {}", intent.record_id, intent)
}
