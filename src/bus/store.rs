//! Key-path state store
//!
//! A JSON tree addressed by dot-separated paths. Setting a path notifies
//! subscribers of that path and of every prefix above it, so a listener on
//! `gamestate` sees changes to `gamestate.phase`.

use ahash::AHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::core::error::Result;

pub type Callback = Box<dyn FnMut(&Value)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct StateStore {
    root: Value,
    listeners: AHashMap<String, Vec<(SubscriptionId, Callback)>>,
    next_id: u64,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|segment| !segment.is_empty())
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
            listeners: AHashMap::new(),
            next_id: 0,
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in segments(path) {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Typed read
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        self.get(path)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Write `value` at `path`, creating intermediate objects
    pub fn set(&mut self, path: &str, value: Value) {
        let mut current = &mut self.root;
        for segment in segments(path) {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            current = &mut current[segment];
        }
        *current = value;

        self.notify(path);
    }

    /// Serialize and write
    pub fn set_serialized<T: Serialize>(&mut self, path: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(path, value);
        Ok(())
    }

    pub fn subscribe(&mut self, path: &str, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(path.to_string())
            .or_default()
            .push((id, callback));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for callbacks in self.listeners.values_mut() {
            if let Some(pos) = callbacks.iter().position(|(other, _)| *other == id) {
                callbacks.remove(pos);
                return true;
            }
        }
        false
    }

    /// Notify `path` first, then each prefix up to the root segment
    fn notify(&mut self, path: &str) {
        let parts: Vec<&str> = segments(path).collect();
        for depth in (1..=parts.len()).rev() {
            let prefix = parts[..depth].join(".");
            let Some(callbacks) = self.listeners.get_mut(&prefix) else {
                continue;
            };
            let mut current = &self.root;
            for segment in &parts[..depth] {
                match current.get(*segment) {
                    Some(next) => current = next,
                    None => break,
                }
            }
            for (_, callback) in callbacks.iter_mut() {
                callback(current);
            }
        }
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("root", &self.root)
            .field("subscriptions", &self.listeners.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}
