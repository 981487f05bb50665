//! The turn orchestrator
//!
//! Owns the game state and the roster. Operator commands are the only entry
//! point and each one runs to completion before the next is accepted.
//!
//! Round: Setup → ManeuverPhase → ActionPhase → ActionPhaseDefaults →
//! ActionExecution ⇄ ActionInterrupted → ActionPhaseEnd → ManeuverPhase

use std::collections::BTreeMap;

use crate::abilities::{default_action, Ability, AbilityRegistry, Maneuver, Outcome, Rule};
use crate::bus::notify::{NotificationLog, NotificationSink};
use crate::bus::store::StateStore;
use crate::combat::conditions::ConditionCatalog;
use crate::combat::context::CombatContext;
use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::core::types::{Stat, UnitKind};
use crate::dice::{DiceRoller, SeededDice};
use crate::orchestrator::commands::{Command, StepResult};
use crate::orchestrator::queue::{merge_lists, neighborhood_sort};
use crate::orchestrator::state::{ActionRecord, GameState, Phase, SubState};
use crate::orchestrator::undo::{HistoryEntry, UndoEntry, UndoStack};
use crate::persistence::{PersistenceGateway, Workspace};
use crate::units::{Arbiter, Battlefield, Leader, Roster, Troop};

/// Log line that opens the action phase
pub const ACTION_PHASE_BANNER: &str = "\n== Kampfphase ==\n";

pub struct Orchestrator {
    pub(crate) config: GameConfig,
    pub(crate) state: GameState,
    pub(crate) battlefield: Battlefield,
    pub(crate) registry: AbilityRegistry,
    pub(crate) undo: UndoStack,
    pub(crate) history: Vec<HistoryEntry>,
    pub(crate) log: NotificationLog,
    pub(crate) store: StateStore,
    dice: Box<dyn DiceRoller>,
    gateway: Option<Box<dyn PersistenceGateway>>,
}

impl Orchestrator {
    /// Fresh game in Setup; dice come from the configured seed
    pub fn new(config: GameConfig, battlefield: Battlefield) -> Result<Self> {
        config.validate()?;
        let dice: Box<dyn DiceRoller> = match config.seed {
            Some(seed) => Box::new(SeededDice::new(seed)),
            None => Box::new(SeededDice::from_entropy()),
        };
        let mut orchestrator = Self {
            registry: AbilityRegistry::new()?,
            config,
            state: GameState::new(),
            battlefield,
            undo: UndoStack::new(),
            history: Vec::new(),
            log: NotificationLog::new(),
            store: StateStore::new(),
            dice,
            gateway: None,
        };
        orchestrator.store.set_serialized("config", &orchestrator.config)?;
        orchestrator.publish();
        Ok(orchestrator)
    }

    pub fn with_dice(mut self, dice: Box<dyn DiceRoller>) -> Self {
        self.dice = dice;
        self
    }

    pub fn with_gateway(mut self, gateway: Box<dyn PersistenceGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Resume a saved session
    pub fn from_workspace(workspace: Workspace) -> Result<Self> {
        let Workspace {
            config,
            gamestate,
            troops,
            leaders,
            tokens,
            conditions,
            weapons,
            history,
            undo_stack,
            log,
        } = workspace;
        let catalog = ConditionCatalog::with_custom(conditions)?;
        let roster = Roster {
            troops,
            leaders,
            tokens,
        };
        let battlefield = Battlefield::from_roster(roster, catalog, weapons);

        let mut orchestrator = Self::new(config, battlefield)?;
        orchestrator.state = gamestate;
        orchestrator.history = history;
        orchestrator.undo = undo_stack;
        orchestrator.log.replace(log);
        orchestrator.publish();
        Ok(orchestrator)
    }

    pub fn workspace(&self) -> Workspace {
        Workspace {
            config: self.config.clone(),
            gamestate: self.state.clone(),
            troops: self.battlefield.troops.clone(),
            leaders: self.battlefield.leaders.clone(),
            tokens: self.battlefield.tokens.clone(),
            conditions: self.battlefield.conditions.custom().to_vec(),
            weapons: self.battlefield.armory.clone(),
            history: self.history.clone(),
            undo_stack: self.undo.clone(),
            log: self.log.entries().to_vec(),
        }
    }

    /// Save through the gateway; a no-op without one
    pub fn save(&mut self) -> Result<()> {
        let workspace = self.workspace();
        match self.gateway.as_mut() {
            Some(gateway) => gateway.save(&workspace),
            None => Ok(()),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    pub fn battlefield_mut(&mut self) -> &mut Battlefield {
        &mut self.battlefield
    }

    pub fn log(&self) -> &NotificationLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut NotificationLog {
        &mut self.log
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn round_history(&self, round: u32) -> Option<&HistoryEntry> {
        self.history.iter().find(|entry| entry.round == round)
    }

    /// Dispatch one operator command
    pub fn apply(&mut self, command: Command) -> Result<()> {
        tracing::debug!(?command, phase = %self.state.phase, "command");
        let result = match command {
            Command::SelectUnit(name) => self.select_unit(name),
            Command::OpenAbilityMenu => {
                self.open_ability_menu();
                Ok(())
            }
            Command::HoverAbility(name) => {
                self.state.hovered = Some(name);
                Ok(())
            }
            Command::HoverOut(name) => {
                if self.state.hovered.as_deref() == Some(name.as_str()) {
                    self.state.hovered = None;
                }
                Ok(())
            }
            Command::CloseAbilityMenu => self.close_ability_menu(),
            Command::ChooseAbility(name) => self.choose_ability(&name),
            Command::ConfirmSelection => {
                self.confirm_selection();
                Ok(())
            }
            Command::Cancel => {
                self.cancel();
                Ok(())
            }
            Command::Continue => {
                self.continue_turn();
                Ok(())
            }
            Command::Undo => {
                self.undo();
                Ok(())
            }
            Command::DeleteSelectedUnit => self.delete_selected_unit(),
            Command::ToggleQuickCondition(key) => self.toggle_quick_condition(&key),
            Command::PlaceToken { name, x, y } => self.place_token(&name, x, y),
            Command::MoveQueuedAction { party, from, to } => {
                self.move_queued_action(&party, from, to)
            }
            Command::Save => self.save(),
        };

        if !self.state.is_consistent() {
            tracing::error!(phase = %self.state.phase, sub_state = ?self.state.sub_state, "inconsistent game state");
            debug_assert!(false, "inconsistent game state after command");
        }
        self.publish();
        result
    }

    /// Write state and roster into the store
    pub fn publish(&mut self) {
        let results = [
            self.store.set_serialized("gamestate", &self.state),
            self.store.set_serialized("troops", &self.battlefield.troops),
            self.store.set_serialized("leaders", &self.battlefield.leaders),
            self.store.set_serialized("tokens", &self.battlefield.tokens),
        ];
        for err in results.into_iter().filter_map(Result::err) {
            tracing::error!(%err, "failed to publish state");
        }
    }

    pub fn add_troop(&mut self, troop: Troop) -> Result<()> {
        self.battlefield.add_troop(troop)?;
        self.publish();
        Ok(())
    }

    pub fn add_leader(&mut self, leader: Leader) -> Result<()> {
        self.battlefield.add_leader(leader)?;
        self.publish();
        Ok(())
    }

    /// Resolve an ability and echo its log to the sink
    pub(crate) fn resolve(&mut self, ability: Ability, source: &str, targets: &[String]) -> Outcome {
        let mut arb = Arbiter::new(self.dice.as_mut(), &mut self.log);
        let outcome = ability.perform(&mut self.battlefield, source, targets, &mut arb);
        for line in outcome.log.iter().filter(|line| !line.is_empty()) {
            arb.say(line);
        }
        outcome
    }

    /// Maneuvers `name` may still perform this round
    pub fn free_maneuvers(&self, name: &str) -> usize {
        let allowance = match self.battlefield.unit_kind(name) {
            Some(UnitKind::Troop) => self
                .battlefield
                .troop(name)
                .filter(|troop| troop.is_alive())
                .and_then(|_| {
                    self.battlefield
                        .stat(name, Stat::ManeuverCount, &CombatContext::default())
                })
                .unwrap_or(0),
            Some(UnitKind::Leader) => self
                .battlefield
                .leader(name)
                .map_or(0, Leader::maneuver_allowance),
            None => 0,
        };
        (allowance.max(0) as usize).saturating_sub(self.state.performed_maneuvers(name))
    }

    /// Action slots `name` has not filled yet
    pub fn free_actions(&self, name: &str) -> usize {
        let allowance = self
            .battlefield
            .troop(name)
            .filter(|troop| troop.is_alive())
            .and_then(|_| {
                self.battlefield
                    .stat(name, Stat::ActionCount, &CombatContext::default())
            })
            .unwrap_or(0);
        (allowance.max(0) as usize).saturating_sub(self.state.queued_actions(name))
    }

    pub(crate) fn push_undo(&mut self) {
        self.undo.push(UndoEntry {
            roster: self.battlefield.snapshot(),
            maneuver_queue: self.state.maneuver_queue.clone(),
            log: self.log.entries().to_vec(),
        });
    }

    /// Restore the checkpoint before the newest one
    ///
    /// Returns false and changes nothing when fewer than two remain.
    pub fn pop_undo(&mut self) -> bool {
        let Some(entry) = self.undo.pop() else {
            return false;
        };
        self.battlefield.restore(entry.roster);
        self.state.maneuver_queue = entry.maneuver_queue;
        self.log.replace(entry.log);
        true
    }

    /// Operator "continue"
    pub fn continue_turn(&mut self) {
        match (self.state.sub_state, self.state.phase) {
            (SubState::Select, _) => self.confirm_selection(),
            (SubState::Pause, _) => self.end_pause(),
            (SubState::Replace, _) => self.log.message(
                "Das Spiel kann nicht fortgesetzt werden, bis eine neue Aktion für die unterbrochene Einheit ausgewählt wurde.",
            ),
            (SubState::Free, Phase::Setup) => self.start_game(),
            (SubState::Free, Phase::ManeuverPhase) => self.end_of_maneuver_phase(),
            (SubState::Free, Phase::ActionPhase) => self.fill_in_default_actions(),
            (SubState::Free, Phase::ActionPhaseDefaults) => {
                self.begin_action_execution();
            }
            (SubState::Free, Phase::ActionExecution) => {
                self.advance();
            }
            (SubState::Free, Phase::ActionPhaseEnd) => self.end_of_round(),
            (SubState::Free, Phase::ActionInterrupted) => self.log.error(&format!(
                "Fehler: Ungültiger Zustand: {:?}, {}",
                self.state.sub_state, self.state.phase
            )),
        }
    }

    fn start_game(&mut self) {
        self.state.round = 1;
        self.state.phase = Phase::ManeuverPhase;
        self.state.sub_state = SubState::Free;
        self.state.maneuver_queue.clear();
        self.push_undo();
        tracing::info!(round = 1, "game started");
    }

    fn end_pause(&mut self) {
        self.state.sub_state = SubState::Free;
        self.state.clear_display();
        if self.state.phase == Phase::ActionExecution {
            self.advance();
        }
    }

    /// Record a resolved maneuver or leader order
    pub(crate) fn record_maneuver(&mut self, mut record: ActionRecord, outcome: &Outcome) {
        record.record(outcome);
        self.state.maneuver_queue.push(record);
    }

    /// Default leftover allowances, then open the action phase
    ///
    /// Leaders repeat their standing order, troops rest.
    pub fn end_of_maneuver_phase(&mut self) {
        self.push_undo();

        let orders: Vec<(String, Ability, Vec<String>)> = self
            .battlefield
            .leaders
            .iter()
            .filter(|leader| self.free_maneuvers(&leader.name) > 0)
            .filter_map(|leader| {
                leader
                    .action
                    .map(|order| (leader.name.clone(), Ability::Leader(order), leader.targets.clone()))
            })
            .collect();
        for (leader, ability, targets) in orders {
            let targets: Vec<String> = targets
                .into_iter()
                .filter(|target| {
                    ability.check_targeted(&self.battlefield, &leader, std::slice::from_ref(target))
                })
                .collect();
            if targets.is_empty() {
                continue;
            }
            let outcome = self.resolve(ability, &leader, &targets);
            self.record_maneuver(ActionRecord::new(ability, &leader, targets), &outcome);
        }

        let rest = Ability::Maneuver(Maneuver::Rest);
        let idle: Vec<String> = self
            .battlefield
            .living_troops()
            .map(|troop| troop.name.clone())
            .collect();
        for name in idle {
            for _ in 0..self.free_maneuvers(&name) {
                let outcome = self.resolve(rest, &name, &[]);
                self.record_maneuver(ActionRecord::new(rest, &name, Vec::new()), &outcome);
            }
        }

        {
            let mut arb = Arbiter::new(self.dice.as_mut(), &mut self.log);
            self.battlefield.end_of_maneuver(&mut arb);
        }
        self.log.append(ACTION_PHASE_BANNER);

        self.state.phase = Phase::ActionPhase;
        self.state.sub_state = SubState::Free;
        self.state.clear_display();
        self.state.action_map = self
            .config
            .parties
            .iter()
            .map(|party| (party.clone(), Vec::new()))
            .collect();
        tracing::info!(round = self.state.round, "action phase");
    }

    /// Fill unused action slots and order them like last round
    pub fn fill_in_default_actions(&mut self) {
        let mut defaults: BTreeMap<String, Vec<ActionRecord>> = BTreeMap::new();
        let troops: Vec<(String, String)> = self
            .battlefield
            .living_troops()
            .map(|troop| (troop.name.clone(), troop.party.clone()))
            .collect();
        for (name, party) in troops {
            for _ in 0..self.free_actions(&name) {
                let (ability, targets) = default_action(&self.battlefield, &name);
                defaults
                    .entry(party.clone())
                    .or_default()
                    .push(ActionRecord::new(ability, &name, targets).as_default());
            }
        }

        let previous = self
            .round_history(self.state.round.saturating_sub(1))
            .map(|entry| entry.gamestate.action_map.clone());
        let mut parties = self.config.parties.clone();
        for party in self.state.action_map.keys().chain(defaults.keys()) {
            if !parties.contains(party) {
                parties.push(party.clone());
            }
        }

        for party in parties {
            let mut merged = self.state.action_map.remove(&party).unwrap_or_default();
            merged.extend(defaults.remove(&party).unwrap_or_default());
            if let Some(last) = previous.as_ref().and_then(|map| map.get(&party)) {
                let reference: Vec<&str> = last.iter().map(|record| record.source.as_str()).collect();
                // units new this round lead, the rest keep last round's order
                merged = neighborhood_sort(merged, &reference, |record| record.source.as_str());
            }
            self.state.action_map.insert(party, merged);
        }

        self.state.phase = Phase::ActionPhaseDefaults;
        self.state.sub_state = SubState::Free;
        self.state.display_text = "Prüfe die Reihenfolge der Aktionen und bestätige.".to_string();
    }

    /// Freeze the action map into the execution queue and start it
    pub fn begin_action_execution(&mut self) -> StepResult {
        self.state.action_queue = merge_lists(
            &self.state.action_map,
            &self.config.parties,
            self.config.action_block_size,
        );
        self.state.action_index = 0;
        self.state.phase = Phase::ActionExecution;
        self.state.sub_state = SubState::Free;
        self.state.clear_display();
        tracing::info!(actions = self.state.action_queue.len(), "executing actions");
        self.advance()
    }

    /// One queue entry
    pub fn step(&mut self) -> StepResult {
        if self.state.phase != Phase::ActionExecution || self.state.sub_state != SubState::Free {
            return StepResult::Idle;
        }
        let index = self.state.action_index;
        let Some(record) = self.state.action_queue.get(index).cloned() else {
            self.finish_execution();
            return StepResult::Finished;
        };

        let present = self.battlefield.token(&record.source).is_some()
            && self.battlefield.troop(&record.source).is_some_and(Troop::is_alive);
        if !present {
            tracing::debug!(source = %record.source, index, "skipping action of a missing unit");
            self.state.action_index += 1;
            return StepResult::Skipped;
        }

        self.state.active_entity = Some(record.source.clone());
        let ability = record.ability;
        let valid = ability.check(&self.battlefield, &record.source)
            && ability.check_targeted(&self.battlefield, &record.source, &record.targets);
        if !valid {
            self.state.display_text = format!(
                "{} kann die Aktion {} nicht ausführen. Wähle eine andere Aktion.",
                record.source,
                ability.name()
            );
            self.state.sub_state = SubState::Replace;
            self.state.phase = Phase::ActionInterrupted;
            tracing::info!(source = %record.source, ability = ability.name(), "action interrupted");
            return StepResult::Interrupted;
        }

        let outcome = self.resolve(ability, &record.source, &record.targets);
        if let Some(slot) = self.state.action_queue.get_mut(index) {
            slot.record(&outcome);
        }
        self.state.action_index += 1;

        if outcome.pause {
            self.state.sub_state = SubState::Pause;
            self.state.display_text = outcome.display.unwrap_or_default();
            return StepResult::Paused;
        }
        self.state.clear_display();
        if self.state.action_index >= self.state.action_queue.len() {
            self.finish_execution();
            return StepResult::Finished;
        }
        StepResult::Performed
    }

    /// Step past skipped entries
    pub fn advance(&mut self) -> StepResult {
        loop {
            let result = self.step();
            if result != StepResult::Skipped {
                return result;
            }
        }
    }

    /// Execute until a pause, an interruption or the end of the queue
    pub fn run_queue(&mut self) -> StepResult {
        loop {
            let result = self.advance();
            if result != StepResult::Performed {
                return result;
            }
        }
    }

    fn finish_execution(&mut self) {
        self.state.phase = Phase::ActionPhaseEnd;
        self.state.sub_state = SubState::Free;
        self.state.display_text = "Alle Aktionen ausgeführt.".to_string();
    }

    /// Round upkeep, history snapshot, fresh undo baseline and autosave
    pub fn end_of_round(&mut self) {
        {
            let mut arb = Arbiter::new(self.dice.as_mut(), &mut self.log);
            self.battlefield.end_of_round(&mut arb);
        }

        let round = self.state.round;
        let entry = HistoryEntry {
            round,
            roster: self.battlefield.snapshot(),
            gamestate: self.state.clone(),
        };
        match self.history.iter_mut().find(|existing| existing.round == round) {
            Some(existing) => *existing = entry,
            None => self.history.push(entry),
        }

        self.state.round += 1;
        self.state.phase = Phase::ManeuverPhase;
        self.state.sub_state = SubState::Free;
        self.state.clear_display();
        self.state.pending_action = None;
        self.state.maneuver_queue.clear();
        self.state.action_map.clear();
        self.state.action_queue.clear();
        self.state.action_index = 0;

        self.undo.reset();
        self.push_undo();

        if let Err(err) = self.save() {
            tracing::warn!(%err, "autosave failed");
            self.log.error(&format!("Speichern fehlgeschlagen: {}", err));
        }
        tracing::info!(round = self.state.round, "new round");
    }

    /// Operator undo; what it reverts depends on the phase
    pub fn undo(&mut self) {
        if self.state.sub_state != SubState::Free || self.state.phase == Phase::Setup {
            self.log.message("Rückgängig ist gerade nicht möglich.");
            return;
        }
        match self.state.phase {
            Phase::ManeuverPhase => {
                if !self.pop_undo() {
                    self.log.message("Nichts zum Rückgängigmachen.");
                }
            }
            Phase::ActionPhase => {
                if self.pop_undo() {
                    self.state.phase = Phase::ManeuverPhase;
                    self.state.action_map.clear();
                    self.state.clear_display();
                } else {
                    self.log.message("Nichts zum Rückgängigmachen.");
                }
            }
            Phase::ActionPhaseDefaults => {
                for list in self.state.action_map.values_mut() {
                    list.retain(|record| !record.is_default);
                }
                self.state.phase = Phase::ActionPhase;
                self.state.clear_display();
            }
            _ => self
                .log
                .message("Rückgängig ist in dieser Phase nicht möglich."),
        }
    }
}
