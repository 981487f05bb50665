//! Undo checkpoints and round history

use serde::{Deserialize, Serialize};

use crate::orchestrator::state::{ActionRecord, GameState};
use crate::units::Roster;

/// Deep copy taken at a checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub roster: Roster,
    pub maneuver_queue: Vec<ActionRecord>,
    pub log: Vec<String>,
}

/// Checkpoint stack; the newest entry mirrors the current state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UndoStack {
    entries: Vec<UndoEntry>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<UndoEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[UndoEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: UndoEntry) {
        self.entries.push(entry);
    }

    /// Drop the newest checkpoint and return the one before it
    ///
    /// With fewer than two entries nothing changes and `None` comes back.
    pub fn pop(&mut self) -> Option<UndoEntry> {
        if self.entries.len() < 2 {
            return None;
        }
        self.entries.pop();
        self.entries.last().cloned()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

/// Read-only record of a finished round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub round: u32,
    pub roster: Roster,
    pub gamestate: GameState,
}
