//! Notification sink
//!
//! Every human-readable message the rules produce goes through a
//! `NotificationSink`. The log keeps the full history for the workspace and
//! broadcasts each line to registered listeners.

use std::fmt;

/// Receiver of operator-facing messages
pub trait NotificationSink {
    fn message(&mut self, text: &str);

    /// Same channel as `message`
    fn error(&mut self, text: &str) {
        self.message(text);
    }
}

/// Collects messages in memory, handy in tests
impl NotificationSink for Vec<String> {
    fn message(&mut self, text: &str) {
        self.push(text.to_string());
    }
}

pub type Listener = Box<dyn FnMut(&str)>;

/// Persistent message log with broadcast
#[derive(Default)]
pub struct NotificationLog {
    entries: Vec<String>,
    listeners: Vec<Listener>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a log loaded from a workspace
    pub fn with_entries(entries: Vec<String>) -> Self {
        Self {
            entries,
            listeners: Vec::new(),
        }
    }

    pub fn register(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a line without broadcasting it (phase separators)
    pub fn append(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
    }

    /// Replace the history, keeping listeners
    pub fn replace(&mut self, entries: Vec<String>) {
        self.entries = entries;
    }

    fn broadcast(&mut self, text: &str) {
        self.entries.push(text.to_string());
        for listener in &mut self.listeners {
            listener(text);
        }
    }
}

impl NotificationSink for NotificationLog {
    fn message(&mut self, text: &str) {
        tracing::info!(target: "kriegsrat::log", "{}", text);
        self.broadcast(text);
    }

    fn error(&mut self, text: &str) {
        tracing::warn!(target: "kriegsrat::log", "{}", text);
        self.broadcast(text);
    }
}

impl fmt::Debug for NotificationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationLog")
            .field("entries", &self.entries.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_message_is_logged_and_broadcast() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut log = NotificationLog::new();
        log.register(Box::new(move |text| sink.borrow_mut().push(text.to_string())));
        log.message("Rot 1 greift an.");
        log.error("Ungültiger Zustand");

        assert_eq!(log.entries(), &["Rot 1 greift an.", "Ungültiger Zustand"]);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_append_does_not_broadcast() {
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);

        let mut log = NotificationLog::new();
        log.register(Box::new(move |_| *counter.borrow_mut() += 1));
        log.append("== Kampfphase ==");

        assert_eq!(log.len(), 1);
        assert_eq!(*seen.borrow(), 0);
    }
}
