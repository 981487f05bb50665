//! Operator interaction: unit selection, the ability menu and target picking

use crate::abilities::{Ability, AbilityKind, Rule};
use crate::bus::notify::NotificationSink;
use crate::combat::conditions::Duration;
use crate::core::error::{KriegsratError, Result};
use crate::core::types::UnitKind;
use crate::orchestrator::state::{ActionRecord, PendingAction, Phase, SubState};
use crate::orchestrator::turn::Orchestrator;
use crate::units::Troop;

impl Orchestrator {
    /// Click on a token, or on empty map with `None`
    pub fn select_unit(&mut self, name: Option<String>) -> Result<()> {
        let Some(name) = name else {
            self.state.selected_token = None;
            if self.state.sub_state == SubState::Free {
                self.state.active_entity = None;
            }
            return Ok(());
        };
        if self.battlefield.token(&name).is_none() {
            self.log.error(&format!("Einheit nicht gefunden: {}!", name));
            return Err(KriegsratError::UnitNotFound(name));
        }

        self.state.selected_token = Some(name.clone());
        match self.state.sub_state {
            SubState::Free => self.state.active_entity = Some(name),
            SubState::Select => self.add_target(&name),
            SubState::Pause | SubState::Replace => {}
        }
        Ok(())
    }

    fn add_target(&mut self, name: &str) {
        let alive = self.battlefield.troop(name).is_some_and(Troop::is_alive);
        let Some(pending) = self.state.pending_action.as_mut() else {
            tracing::error!("target selection without a pending ability");
            debug_assert!(false, "Select sub-state without a pending ability");
            return;
        };
        if !alive || pending.targets.iter().any(|target| target == name) {
            return;
        }
        pending.targets.push(name.to_string());
        let full = pending.is_full();

        if full {
            self.end_selection();
        } else {
            self.log.message(&format!("{} zu den Zielen hinzugefügt.", name));
        }
    }

    /// Abilities the active unit may pick right now
    pub fn available_abilities(&self) -> Vec<Ability> {
        if matches!(self.state.sub_state, SubState::Select | SubState::Pause) {
            return Vec::new();
        }
        let Some(name) = self.state.active_entity.as_deref() else {
            return Vec::new();
        };

        let kinds: &[AbilityKind] = match (self.battlefield.unit_kind(name), self.state.phase) {
            (Some(UnitKind::Leader), Phase::ManeuverPhase) if self.free_maneuvers(name) > 0 => {
                &[AbilityKind::LeaderAction]
            }
            (Some(UnitKind::Troop), Phase::ManeuverPhase) => {
                if self.free_maneuvers(name) > 0 {
                    &[AbilityKind::Maneuver, AbilityKind::FreeAction]
                } else {
                    &[AbilityKind::FreeAction]
                }
            }
            (Some(UnitKind::Troop), Phase::ActionPhase | Phase::ActionPhaseDefaults) => {
                if self.free_actions(name) > 0 {
                    &[AbilityKind::Action, AbilityKind::FreeAction]
                } else {
                    &[AbilityKind::FreeAction]
                }
            }
            (Some(UnitKind::Troop), Phase::ActionInterrupted) => {
                &[AbilityKind::Action, AbilityKind::FreeAction]
            }
            _ => &[],
        };
        self.registry.menu(&self.battlefield, name, kinds)
    }

    pub fn open_ability_menu(&mut self) {
        self.state.hovered = None;
        self.state.menu = self
            .available_abilities()
            .iter()
            .map(|ability| ability.name().to_string())
            .collect();
    }

    /// Closing the menu picks the hovered entry
    pub fn close_ability_menu(&mut self) -> Result<()> {
        self.state.menu.clear();
        match self.state.hovered.take() {
            Some(name) => self.choose_ability(&name),
            None => Ok(()),
        }
    }

    pub fn choose_ability(&mut self, name: &str) -> Result<()> {
        let ability = match self.registry.get(name) {
            Ok(ability) => ability,
            Err(err) => {
                self.log.error(&err.to_string());
                return Err(err);
            }
        };
        let Some(source) = self.state.active_entity.clone() else {
            self.log.error("Keine Einheit ausgewählt.");
            return Ok(());
        };
        if !self.available_abilities().contains(&ability) {
            self.log
                .error(&format!("{} kann {} gerade nicht ausführen.", source, ability));
            return Ok(());
        }

        self.state.menu.clear();
        let selection = ability.selection(&self.battlefield, &source);
        let pending = PendingAction {
            ability,
            kind: ability.kind(),
            source,
            targets: Vec::new(),
            min: selection.min,
            max: selection.max,
            prompt: selection.prompt,
        };
        if selection.needs_selection {
            self.state.display_text = pending.prompt.clone();
            self.state.pending_action = Some(pending);
            self.state.sub_state = SubState::Select;
        } else {
            self.finish(pending);
        }
        Ok(())
    }

    /// Operator confirms the picked targets
    pub fn confirm_selection(&mut self) {
        let Some(pending) = self
            .state
            .pending_action
            .as_ref()
            .filter(|_| self.state.sub_state == SubState::Select)
        else {
            self.log.error("Es ist keine Zielauswahl aktiv.");
            return;
        };
        if pending.targets.len() < pending.min {
            let text = if pending.min == 1 {
                "Es muss mindestens 1 Ziel ausgewählt werden.".to_string()
            } else {
                format!("Es müssen mindestens {} Ziele ausgewählt werden.", pending.min)
            };
            self.log.error(&text);
            return;
        }
        self.end_selection();
    }

    /// Abort target selection
    pub fn cancel(&mut self) {
        if self.state.sub_state != SubState::Select {
            return;
        }
        self.state.pending_action = None;
        if self.state.phase == Phase::ActionInterrupted {
            self.state.sub_state = SubState::Replace;
            self.state.display_text = self.replacement_prompt();
        } else {
            self.state.sub_state = SubState::Free;
            self.state.clear_display();
        }
    }

    fn replacement_prompt(&self) -> String {
        format!(
            "Wähle eine neue Aktion für {} aus.",
            self.state.active_entity.as_deref().unwrap_or("?")
        )
    }

    fn end_selection(&mut self) {
        match self.state.pending_action.take() {
            Some(pending) => self.finish(pending),
            None => {
                tracing::error!("selection ended without a pending ability");
                self.state.sub_state = SubState::Free;
            }
        }
    }

    /// Hand a fully targeted ability to the phase that owns it
    fn finish(&mut self, pending: PendingAction) {
        match pending.kind {
            AbilityKind::FreeAction => self.perform_free_action(pending),
            AbilityKind::Maneuver | AbilityKind::LeaderAction => self.perform_maneuver(pending),
            AbilityKind::Action => self.queue_action(pending),
        }
    }

    /// Free actions resolve at once and use no allowance
    fn perform_free_action(&mut self, pending: PendingAction) {
        let outcome = self.resolve(pending.ability, &pending.source, &pending.targets);
        if self.state.phase == Phase::ActionInterrupted {
            self.state.sub_state = SubState::Replace;
            self.state.display_text = self.replacement_prompt();
        } else {
            self.state.sub_state = SubState::Free;
            self.state.display_text = outcome.display.unwrap_or_default();
        }
    }

    fn perform_maneuver(&mut self, pending: PendingAction) {
        let ability = pending.ability;
        if !ability.check_targeted(&self.battlefield, &pending.source, &pending.targets) {
            self.log.error(&format!(
                "{} kann {} nicht auf diese Ziele anwenden.",
                pending.source, ability
            ));
            self.state.sub_state = SubState::Free;
            self.state.clear_display();
            return;
        }

        let outcome = self.resolve(ability, &pending.source, &pending.targets);
        self.record_maneuver(ActionRecord::from_pending(pending), &outcome);
        self.push_undo();
        self.state.sub_state = if outcome.pause {
            SubState::Pause
        } else {
            SubState::Free
        };
        self.state.display_text = outcome.display.unwrap_or_default();
    }

    fn queue_action(&mut self, pending: PendingAction) {
        let record = ActionRecord::from_pending(pending);
        match self.state.phase {
            Phase::ActionInterrupted => {
                let index = self.state.action_index;
                match self.state.action_queue.get_mut(index) {
                    Some(slot) => *slot = record,
                    None => self.state.action_queue.push(record),
                }
                self.state.phase = Phase::ActionExecution;
                self.state.sub_state = SubState::Free;
                self.state.clear_display();
                self.advance();
            }
            Phase::ActionPhase | Phase::ActionPhaseDefaults => {
                let party = self
                    .battlefield
                    .party_of(&record.source)
                    .unwrap_or_default()
                    .to_string();
                self.state.action_map.entry(party).or_default().push(record);
                self.state.sub_state = SubState::Free;
                self.state.clear_display();
            }
            phase => {
                tracing::error!(%phase, "action chosen outside the action phase");
                self.state.sub_state = SubState::Free;
            }
        }
    }

    pub fn delete_selected_unit(&mut self) -> Result<()> {
        if self.state.sub_state != SubState::Free {
            return Ok(());
        }
        let Some(name) = self.state.selected_token.take() else {
            return Ok(());
        };
        self.battlefield.remove_unit(&name)?;
        if self.state.active_entity.as_deref() == Some(name.as_str()) {
            self.state.active_entity = None;
        }
        self.log.message(&format!("{} wurde entfernt.", name));
        Ok(())
    }

    /// Toggle an indefinite catalog condition on the selected troop
    pub fn toggle_quick_condition(&mut self, key: &str) -> Result<()> {
        let Some(label) = self.battlefield.conditions.name(key).map(str::to_string) else {
            self.log.error(&format!("Unbekannter Zustand: {}", key));
            return Ok(());
        };
        let Some(name) = self.state.selected_token.clone() else {
            return Ok(());
        };
        let troop = self
            .battlefield
            .troops
            .iter_mut()
            .find(|troop| troop.name == name)
            .ok_or(KriegsratError::UnitNotFound(name))?;
        if troop.has_condition(key) {
            troop.remove_condition(key, &mut self.log);
        } else {
            troop.add_condition(key, &label, Duration::Indefinite, &mut self.log);
        }
        Ok(())
    }

    pub fn place_token(&mut self, name: &str, x: f32, y: f32) -> Result<()> {
        if let Err(err) = self.battlefield.place_token(name, x, y) {
            self.log.error(&err.to_string());
            return Err(err);
        }
        Ok(())
    }

    /// Reorder a party's queue before execution starts
    pub fn move_queued_action(&mut self, party: &str, from: usize, to: usize) -> Result<()> {
        if !matches!(
            self.state.phase,
            Phase::ActionPhase | Phase::ActionPhaseDefaults
        ) {
            return Err(KriegsratError::InvalidCommand(format!(
                "actions cannot be reordered in {}",
                self.state.phase
            )));
        }
        let list = self
            .state
            .action_map
            .get_mut(party)
            .ok_or_else(|| KriegsratError::InvalidCommand(format!("unknown party {}", party)))?;
        if from >= list.len() || to >= list.len() {
            return Err(KriegsratError::InvalidCommand(format!(
                "position out of range for {}",
                party
            )));
        }
        let record = list.remove(from);
        list.insert(to, record);
        Ok(())
    }
}
