use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Fire-and-forget user messages keyed by a stable id
pub trait Notifier: Send + Sync {
    fn error(&self, key: &str, message: &str);
    fn info(&self, key: &str, message: &str);
}

/// Keeps the latest message per key, so repeats of the same key replace each other
#[derive(Default)]
pub struct NotificationCenter {
    active: RwLock<HashMap<String, Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Notification> {
        self.active.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.active.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.read().is_empty()
    }

    pub fn dismiss(&self, key: &str) -> Option<Notification> {
        self.active.write().remove(key)
    }

    fn push(&self, key: &str, level: NotificationLevel, message: &str) {
        self.active.write().insert(
            key.to_string(),
            Notification {
                level,
                message: message.to_string(),
            },
        );
    }
}

impl Notifier for NotificationCenter {
    fn error(&self, key: &str, message: &str) {
        error!("[Notify] {}: {}", key, message);
        self.push(key, NotificationLevel::Error, message);
    }

    fn info(&self, key: &str, message: &str) {
        info!("[Notify] {}: {}", key, message);
        self.push(key, NotificationLevel::Info, message);
    }
}
