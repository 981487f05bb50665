//! Leaders: commanders that lend bonuses to the troops they direct
//!
//! A leader's standing order decides which of its bonus values reach its
//! targets. Leaders take damage but never die.

use serde::{Deserialize, Serialize};

use crate::combat::modifiers::Modifiers;
use crate::core::types::Stat;
use crate::dice::DiceRoller;

/// Orders a leader can give during the maneuver phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaderAction {
    TakeCommand,
    InspireAt,
    InspirePa,
    InspireFk,
    InspireMo,
    SpurManeuver,
    SpurAction,
    Rally,
    Insult,
    Skirmish,
}

impl LeaderAction {
    pub fn all() -> &'static [LeaderAction] {
        &[
            LeaderAction::TakeCommand,
            LeaderAction::InspireAt,
            LeaderAction::InspirePa,
            LeaderAction::InspireFk,
            LeaderAction::InspireMo,
            LeaderAction::SpurManeuver,
            LeaderAction::SpurAction,
            LeaderAction::Rally,
            LeaderAction::Insult,
            LeaderAction::Skirmish,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            LeaderAction::TakeCommand => "Kommando übernehmen",
            LeaderAction::InspireAt => "Inspirieren (AT)",
            LeaderAction::InspirePa => "Inspirieren (PA)",
            LeaderAction::InspireFk => "Inspirieren (FK)",
            LeaderAction::InspireMo => "Inspirieren (MO)",
            LeaderAction::SpurManeuver => "Anspornen (Manöver)",
            LeaderAction::SpurAction => "Anspornen (Aktion)",
            LeaderAction::Rally => "Sammeln",
            LeaderAction::Insult => "Beleidigen",
            LeaderAction::Skirmish => "Scharmützel",
        }
    }

    /// Stat an inspiration order boosts
    pub fn inspired_stat(&self) -> Option<Stat> {
        match self {
            LeaderAction::InspireAt => Some(Stat::At),
            LeaderAction::InspirePa => Some(Stat::Pa),
            LeaderAction::InspireFk => Some(Stat::Fk),
            LeaderAction::InspireMo => Some(Stat::Mo),
            _ => None,
        }
    }

    /// Orders that put the targets under the leader's command
    pub fn grants_bonus(&self) -> bool {
        matches!(
            self,
            LeaderAction::TakeCommand
                | LeaderAction::InspireAt
                | LeaderAction::InspirePa
                | LeaderAction::InspireFk
                | LeaderAction::InspireMo
                | LeaderAction::SpurManeuver
                | LeaderAction::SpurAction
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leader {
    pub name: String,
    pub party: String,
    /// Full bonus values; what reaches a troop depends on `action`
    pub bonuses: Modifiers,
    #[serde(default)]
    pub ini_bonus: i32,
    pub at: i32,
    pub tp: i32,
    pub rs: i32,
    pub max_health: i32,
    pub ini_base: i32,
    pub gs: i32,
    /// How many troops one order can reach
    pub command_capacity: u32,
    pub command: i32,
    pub intuition: i32,
    pub charisma: i32,
    pub constitution: i32,
    #[serde(default)]
    pub properties: Vec<String>,

    pub health: i32,
    #[serde(default)]
    pub initiative: i32,
    /// Standing order, repeated when the leader does nothing else
    #[serde(default)]
    pub action: Option<LeaderAction>,
    #[serde(default)]
    pub targets: Vec<String>,
}

impl Leader {
    pub fn new(name: impl Into<String>, party: impl Into<String>) -> Self {
        let max_health = 25;
        Self {
            name: name.into(),
            party: party.into(),
            bonuses: Modifiers::from_pairs(&[(Stat::At, 2), (Stat::Pa, 2), (Stat::Fk, 2), (Stat::Mo, 2)]),
            ini_bonus: 0,
            at: 12,
            tp: 2,
            rs: 2,
            max_health,
            ini_base: 10,
            gs: 6,
            command_capacity: 3,
            command: 8,
            intuition: 12,
            charisma: 12,
            constitution: 12,
            properties: Vec::new(),
            health: max_health,
            initiative: 0,
            action: None,
            targets: Vec::new(),
        }
    }

    pub fn with_bonuses(mut self, bonuses: Modifiers) -> Self {
        self.bonuses = bonuses;
        self
    }

    pub fn with_command(mut self, capacity: u32, skill: i32) -> Self {
        self.command_capacity = capacity;
        self.command = skill;
        self
    }

    pub fn with_attributes(mut self, intuition: i32, charisma: i32, constitution: i32) -> Self {
        self.intuition = intuition;
        self.charisma = charisma;
        self.constitution = constitution;
        self
    }

    pub fn with_combat(mut self, at: i32, tp: i32, rs: i32) -> Self {
        self.at = at;
        self.tp = tp;
        self.rs = rs;
        self
    }

    pub fn is_alive(&self) -> bool {
        true
    }

    /// Leaders give one order per round
    pub fn maneuver_allowance(&self) -> i32 {
        1
    }

    pub fn grants_unlimited_actions(&self) -> bool {
        self.action == Some(LeaderAction::TakeCommand)
    }

    /// Bonus a commanded troop receives on `stat`
    pub fn bonus(&self, stat: Stat) -> i32 {
        if matches!(stat, Stat::Ek | Stat::Rs) {
            return 0;
        }
        let Some(action) = self.action else {
            return 0;
        };
        match action {
            LeaderAction::TakeCommand => self.bonuses.get(stat),
            _ if action.inspired_stat() == Some(stat) => (self.bonuses.get(stat) + 1) / 2,
            LeaderAction::SpurManeuver if stat == Stat::ManeuverCount => 1,
            LeaderAction::SpurAction if stat == Stat::ActionCount => 1,
            _ => 0,
        }
    }

    pub fn attack_roll(&self, modifier: i32, dice: &mut dyn DiceRoller) -> bool {
        dice.check(self.at + self.bonuses.at - modifier)
    }

    pub fn damage_roll(&self, dice: &mut dyn DiceRoller) -> i32 {
        dice.roll(3, 1) + self.tp + self.bonuses.tp
    }

    /// Half armor, rounded up, soaks each hit
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let applied = (amount - (self.rs + 1) / 2).max(0);
        self.health -= applied;
        applied
    }

    /// Command talent check (IN/CH/KO); `penalty` lowers the skill
    pub fn command_check(&self, penalty: i32, dice: &mut dyn DiceRoller) -> bool {
        dice.talent_check(
            self.command - penalty,
            [self.intuition, self.charisma, self.constitution],
        )
    }

    pub fn roll_initiative(&mut self, dice: &mut dyn DiceRoller) -> i32 {
        self.initiative = self.ini_base + self.ini_bonus + dice.roll(6, 1);
        self.initiative
    }

    pub fn remove_target(&mut self, name: &str) {
        self.targets.retain(|target| target != name);
    }
}
