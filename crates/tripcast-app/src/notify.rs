//! User-facing notifications (toasts).

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// Sending half of the notification channel. Cheap to clone.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(NotificationKind::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(NotificationKind::Error, message.into());
    }

    fn send(&self, kind: NotificationKind, message: String) {
        tracing::debug!("Notification ({:?}): {}", kind, message);
        if self.tx.send(Notification { kind, message }).is_err() {
            tracing::debug!("Notification dropped, no listener");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[tokio::test]
    async fn test_notifications_arrive_in_order() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.success("Trip updated");
        notifier.error("Could not update trip");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, NotificationKind::Success);
        assert_eq!(first.message, "Trip updated");
        assert_eq!(rx.recv().await.unwrap().kind, NotificationKind::Error);
    }

    #[test]
    fn test_send_without_listener_is_harmless() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.success("nobody hears this");
    }
}
