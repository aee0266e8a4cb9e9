//! Presentation of tracking-change notifications.

use crate::models::NotificationIntent;

/// Surfaces a notification to the user.
///
/// Presenting is fire-and-forget: implementations must not fail the sync.
pub trait Notifier {
    fn present(&self, intent: &NotificationIntent);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn present(&self, intent: &NotificationIntent) {
        (**self).present(intent);
    }
}

/// Logs each notification at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn present(&self, intent: &NotificationIntent) {
        tracing::info!(
            tracking_id = %intent.record_id,
            status = %intent.status_text,
            "{}",
            intent.title
        );
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::models::TrackingId;

    #[derive(Default)]
    struct Collect(RefCell<Vec<String>>);

    impl Notifier for Collect {
        fn present(&self, intent: &NotificationIntent) {
            self.0.borrow_mut().push(intent.to_string());
        }
    }

    fn intent() -> NotificationIntent {
        NotificationIntent {
            record_id: TrackingId::new(1),
            title: "Books".to_string(),
            status_text: "Out for delivery".to_string(),
        }
    }

    #[test]
    fn references_forward_to_the_notifier() {
        fn present_all(notifier: impl Notifier, intents: &[NotificationIntent]) {
            for intent in intents {
                notifier.present(intent);
            }
        }

        let collect = Collect::default();
        present_all(&collect, &[intent()]);
        assert_eq!(*collect.0.borrow(), vec!["Books: Out for delivery".to_string()]);
    }

    #[test]
    fn tracing_notifier_accepts_intents() {
        TracingNotifier.present(&intent());
    }
}
