//! Turn orchestration
//!
//! The phase state machine, the action queue and undo. All state changes of
//! a running game go through [`Orchestrator::apply`].

pub mod commands;
pub mod queue;
pub mod selection;
pub mod state;
pub mod turn;
pub mod undo;

pub use commands::{Command, StepResult};
pub use state::{ActionRecord, GameState, PendingAction, Phase, SubState};
pub use turn::Orchestrator;
pub use undo::{HistoryEntry, UndoEntry, UndoStack};
