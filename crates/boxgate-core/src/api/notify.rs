//! User-visible notifications raised by the transport.
//!
//! The transport surfaces one transient message per failed request. How the
//! message reaches the user is up to the front end.

use std::sync::{Mutex, PoisonError};

/// Sink for transient error notifications
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Collects notifications until the front end drains them.
#[derive(Debug, Default)]
pub struct NotificationLog {
    messages: Mutex<Vec<String>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending message, oldest first
    pub fn drain(&self) -> Vec<String> {
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *messages)
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for NotificationLog {
    fn error(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
