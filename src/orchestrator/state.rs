//! Turn state: phase, sub-state, queues and the pending selection

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::abilities::{Ability, AbilityKind, Outcome};

/// Turn phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Setup, // Placing units before round 1
    ManeuverPhase,
    ActionPhase,         // Queueing actions
    ActionPhaseDefaults, // Reviewing the order after defaults were filled in
    ActionExecution,
    ActionInterrupted, // Waiting for a replacement action
    ActionPhaseEnd,
}

impl Phase {
    /// Any part of the action phase
    pub fn is_action_phase(&self) -> bool {
        !matches!(self, Phase::Setup | Phase::ManeuverPhase)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Setup => "Setup",
            Phase::ManeuverPhase => "Manöverphase",
            Phase::ActionPhase => "Kampfphase",
            Phase::ActionPhaseDefaults => "Kampfphase [Defaults]",
            Phase::ActionExecution => "Kampfphase [Ausführung]",
            Phase::ActionInterrupted => "Kampfphase [unterbrochen]",
            Phase::ActionPhaseEnd => "Kampfphase [Ende]",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubState {
    #[default]
    Free,
    Select,
    Pause,
    Replace,
}

/// An ability waiting for its targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub ability: Ability,
    pub kind: AbilityKind,
    pub source: String,
    pub targets: Vec<String>,
    pub min: usize,
    pub max: usize,
    pub prompt: String,
}

impl PendingAction {
    pub fn is_full(&self) -> bool {
        self.targets.len() >= self.max
    }
}

/// A maneuver that was performed or an action that is queued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub ability: Ability,
    pub source: String,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub log: Vec<String>,
    #[serde(default)]
    pub short_log: Vec<String>,
    /// Filled in for an unused slot rather than chosen
    #[serde(default)]
    pub is_default: bool,
}

impl ActionRecord {
    pub fn new(ability: Ability, source: impl Into<String>, targets: Vec<String>) -> Self {
        Self {
            ability,
            source: source.into(),
            targets,
            log: Vec::new(),
            short_log: Vec::new(),
            is_default: false,
        }
    }

    pub fn from_pending(pending: PendingAction) -> Self {
        Self::new(pending.ability, pending.source, pending.targets)
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn record(&mut self, outcome: &Outcome) {
        self.log = outcome.log.clone();
        self.short_log = outcome.short_log.clone();
    }
}

/// The orchestrator's state, published to the store after every command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub round: u32,
    pub phase: Phase,
    pub sub_state: SubState,
    pub maneuver_queue: Vec<ActionRecord>,
    pub action_map: BTreeMap<String, Vec<ActionRecord>>,
    pub action_queue: Vec<ActionRecord>,
    pub action_index: usize,
    pub active_entity: Option<String>,
    pub selected_token: Option<String>,
    pub pending_action: Option<PendingAction>,
    pub display_text: String,
    /// Names offered by the open ability menu
    pub menu: Vec<String>,
    pub hovered: Option<String>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the sub-state invariants
    pub fn is_consistent(&self) -> bool {
        let select_ok = self.sub_state != SubState::Select
            || self
                .pending_action
                .as_ref()
                .is_some_and(|pending| pending.targets.len() <= pending.max);
        let replace_ok =
            self.sub_state != SubState::Replace || self.phase == Phase::ActionInterrupted;
        select_ok && replace_ok
    }

    /// Queued entries for `source` across all parties
    pub fn queued_actions(&self, source: &str) -> usize {
        self.action_map
            .values()
            .flatten()
            .filter(|record| record.source == source)
            .count()
    }

    pub fn performed_maneuvers(&self, source: &str) -> usize {
        self.maneuver_queue
            .iter()
            .filter(|record| record.source == source)
            .count()
    }

    pub fn clear_display(&mut self) {
        self.display_text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::Action;

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::ManeuverPhase.to_string(), "Manöverphase");
        assert_eq!(Phase::ActionInterrupted.to_string(), "Kampfphase [unterbrochen]");
        assert!(Phase::ActionPhaseEnd.is_action_phase());
        assert!(!Phase::Setup.is_action_phase());
    }

    #[test]
    fn test_replace_requires_interrupted_phase() {
        let mut state = GameState::new();
        state.sub_state = SubState::Replace;
        assert!(!state.is_consistent());
        state.phase = Phase::ActionInterrupted;
        assert!(state.is_consistent());
    }

    #[test]
    fn test_select_requires_pending_action() {
        let mut state = GameState::new();
        state.sub_state = SubState::Select;
        assert!(!state.is_consistent());
        state.pending_action = Some(PendingAction {
            ability: Ability::Action(Action::Attack),
            kind: AbilityKind::Action,
            source: "Rot 1".into(),
            targets: vec!["Blau 1".into()],
            min: 1,
            max: 1,
            prompt: String::new(),
        });
        assert!(state.is_consistent());
    }

    #[test]
    fn test_gamestate_roundtrips_through_json() {
        let mut state = GameState::new();
        state.round = 2;
        state.phase = Phase::ActionPhaseDefaults;
        state.action_map.insert(
            "Rot".into(),
            vec![ActionRecord::new(Ability::Action(Action::Hold), "Rot 1", Vec::new()).as_default()],
        );
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
