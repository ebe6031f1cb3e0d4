// Transient user-facing notifications (toasts)

use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationVariant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

/// Sending half of the toast queue. Cheap to clone; sends never block.
#[derive(Debug, Clone)]
pub struct Toaster {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Toaster {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn success(&self, title: &str, description: &str) {
        self.push(Notification {
            title: title.to_string(),
            description: description.to_string(),
            variant: NotificationVariant::Default,
        });
    }

    pub fn failure(&self, title: &str, description: &str) {
        self.push(Notification {
            title: title.to_string(),
            description: description.to_string(),
            variant: NotificationVariant::Destructive,
        });
    }

    fn push(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            debug!("Toast dropped, no receiver is listening");
        }
    }
}
