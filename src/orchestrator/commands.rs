//! Operator command surface

use serde::{Deserialize, Serialize};

/// Everything an operator can do; the only way to mutate a running game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Click a token, or click empty map with `None`
    SelectUnit(Option<String>),
    OpenAbilityMenu,
    HoverAbility(String),
    HoverOut(String),
    /// Close the menu, choosing the hovered ability if any
    CloseAbilityMenu,
    ChooseAbility(String),
    ConfirmSelection,
    Cancel,
    Continue,
    Undo,
    DeleteSelectedUnit,
    ToggleQuickCondition(String),
    PlaceToken { name: String, x: f32, y: f32 },
    /// Reorder a party's queued actions before execution
    MoveQueuedAction { party: String, from: usize, to: usize },
    Save,
}

/// Result of one execution step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// An action resolved; more may follow
    Performed,
    /// Source vanished or died; the entry was passed over
    Skipped,
    /// An action asked for manual follow-up
    Paused,
    /// An action became invalid and needs a replacement
    Interrupted,
    /// The queue is done
    Finished,
    /// Not executing right now
    Idle,
}
