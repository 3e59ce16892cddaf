use tokio::sync::mpsc;
use tracing::debug;

use super::types::Notification;

/// Sink for operator notifications.
///
/// `notify` must never block or suspend the caller.
pub trait NotificationDispatcher: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Dispatcher that hands notifications to a renderer over an unbounded
/// channel. Sending never waits; if the renderer is gone the notification
/// is dropped.
#[derive(Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationDispatcher for ChannelDispatcher {
    fn notify(&self, notification: Notification) {
        debug!("notify [{}] {}", notification.severity, notification.message);
        if self.tx.send(notification).is_err() {
            debug!("notification renderer closed, dropping notification");
        }
    }
}
