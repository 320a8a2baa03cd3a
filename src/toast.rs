use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// How long a toast stays up unless dismissed.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    expires_at: Instant,
}

/// Process-wide notification queue. Entries expire on a deadline checked
/// by the main loop tick, or immediately via `dismiss`.
#[derive(Clone, Default)]
pub struct ToastQueue {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a toast and return its id. Ids are time-based; collisions are
    /// tolerated (dismissal by a duplicated id removes both).
    pub fn show(&self, kind: ToastKind, message: impl Into<String>, duration: Duration) -> u64 {
        let id = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let toast = Toast {
            id,
            kind,
            message: message.into(),
            expires_at: Instant::now() + duration,
        };
        self.toasts.lock().unwrap().push(toast);
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.show(ToastKind::Success, message, DEFAULT_DURATION)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.show(ToastKind::Error, message, DEFAULT_DURATION)
    }

    /// Remove a toast by id; a no-op if it already expired or was dismissed.
    pub fn dismiss(&self, id: u64) {
        self.toasts.lock().unwrap().retain(|t| t.id != id);
    }

    /// Drop entries past their deadline. Called once per main-loop tick.
    pub fn prune_expired(&self) {
        let now = Instant::now();
        self.toasts.lock().unwrap().retain(|t| t.expires_at > now);
    }

    /// Current entries, oldest first.
    pub fn snapshot(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_in_order_and_prunes_on_deadline() {
        let queue = ToastQueue::new();
        queue.show(ToastKind::Success, "kept", Duration::from_secs(60));
        queue.show(ToastKind::Error, "expired", Duration::ZERO);

        let before = queue.snapshot();
        assert_eq!(before.len(), 2);
        assert_eq!(before[0].message, "kept");

        queue.prune_expired();
        let after = queue.snapshot();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].message, "kept");
        assert_eq!(after[0].kind, ToastKind::Success);
    }

    #[test]
    fn dismiss_removes_and_is_idempotent() {
        let queue = ToastQueue::new();
        let id = queue.show(ToastKind::Error, "oops", Duration::from_secs(60));
        queue.dismiss(id);
        assert!(queue.is_empty());
        // Dismissing again is a no-op, not an error.
        queue.dismiss(id);
        assert!(queue.is_empty());
    }

    #[test]
    fn long_lived_toasts_survive_prune() {
        let queue = ToastQueue::new();
        queue.success("done");
        queue.prune_expired();
        assert_eq!(queue.snapshot().len(), 1);
    }
}
