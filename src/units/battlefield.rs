//! The roster of units on the map
//!
//! Units refer to each other by name only. Whenever a unit dies or is
//! removed, `clear_references_to` sweeps every reference to it.

use serde::{Deserialize, Serialize};

use crate::combat::conditions::{ConditionCatalog, Duration};
use crate::combat::context::CombatContext;
use crate::combat::weapons::Weapon;
use crate::core::error::{KriegsratError, Result};
use crate::core::types::{Stat, UnitKind};
use crate::units::arbiter::Arbiter;
use crate::units::leader::Leader;
use crate::units::troop::{StatEnv, Troop};

/// Map marker for a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub name: String,
    pub kind: UnitKind,
    pub x: f32,
    pub y: f32,
}

impl Token {
    pub fn new(name: impl Into<String>, kind: UnitKind) -> Self {
        Self {
            name: name.into(),
            kind,
            x: 0.0,
            y: 0.0,
        }
    }
}

/// Everything that gets deep-copied for undo and history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub troops: Vec<Troop>,
    pub leaders: Vec<Leader>,
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, Default)]
pub struct Battlefield {
    pub troops: Vec<Troop>,
    pub leaders: Vec<Leader>,
    pub tokens: Vec<Token>,
    pub conditions: ConditionCatalog,
    /// Weapon templates for equipping troops
    pub armory: Vec<Weapon>,
}

impl Battlefield {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_roster(roster: Roster, conditions: ConditionCatalog, armory: Vec<Weapon>) -> Self {
        Self {
            troops: roster.troops,
            leaders: roster.leaders,
            tokens: roster.tokens,
            conditions,
            armory,
        }
    }

    pub fn snapshot(&self) -> Roster {
        Roster {
            troops: self.troops.clone(),
            leaders: self.leaders.clone(),
            tokens: self.tokens.clone(),
        }
    }

    pub fn restore(&mut self, roster: Roster) {
        self.troops = roster.troops;
        self.leaders = roster.leaders;
        self.tokens = roster.tokens;
    }

    fn name_taken(&self, name: &str) -> bool {
        self.unit_kind(name).is_some()
    }

    /// Add a troop and its token at the origin
    pub fn add_troop(&mut self, troop: Troop) -> Result<()> {
        if self.name_taken(&troop.name) {
            return Err(KriegsratError::DuplicateUnit(troop.name));
        }
        self.tokens.push(Token::new(&troop.name, UnitKind::Troop));
        self.troops.push(troop);
        Ok(())
    }

    pub fn add_leader(&mut self, leader: Leader) -> Result<()> {
        if self.name_taken(&leader.name) {
            return Err(KriegsratError::DuplicateUnit(leader.name));
        }
        self.tokens.push(Token::new(&leader.name, UnitKind::Leader));
        self.leaders.push(leader);
        Ok(())
    }

    pub fn troop(&self, name: &str) -> Option<&Troop> {
        self.troops.iter().find(|t| t.name == name)
    }

    pub fn troop_mut(&mut self, name: &str) -> Option<&mut Troop> {
        self.troops.iter_mut().find(|t| t.name == name)
    }

    pub fn leader(&self, name: &str) -> Option<&Leader> {
        self.leaders.iter().find(|l| l.name == name)
    }

    pub fn leader_mut(&mut self, name: &str) -> Option<&mut Leader> {
        self.leaders.iter_mut().find(|l| l.name == name)
    }

    pub fn token(&self, name: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| t.name == name)
    }

    pub fn unit_kind(&self, name: &str) -> Option<UnitKind> {
        if self.troop(name).is_some() {
            Some(UnitKind::Troop)
        } else if self.leader(name).is_some() {
            Some(UnitKind::Leader)
        } else {
            None
        }
    }

    pub fn place_token(&mut self, name: &str, x: f32, y: f32) -> Result<()> {
        let token = self
            .tokens
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| KriegsratError::UnitNotFound(name.to_string()))?;
        token.x = x;
        token.y = y;
        Ok(())
    }

    /// Stat environment for a troop: catalog plus its commanding leader
    pub fn env_for(&self, troop: &Troop) -> StatEnv<'_> {
        let leader = troop.leader.as_deref().and_then(|name| self.leader(name));
        StatEnv::new(&self.conditions).with_leader(leader)
    }

    pub fn stat(&self, name: &str, stat: Stat, ctx: &CombatContext) -> Option<i32> {
        let troop = self.troop(name)?;
        Some(troop.get(stat, &self.env_for(troop), ctx))
    }

    /// Run `f` on a troop with its stat environment
    pub fn with_troop<R>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Troop, &StatEnv) -> R,
    ) -> Option<R> {
        let Battlefield {
            troops,
            leaders,
            conditions,
            ..
        } = self;
        let troop = troops.iter_mut().find(|t| t.name == name)?;
        let leader_name = troop.leader.clone();
        let leader = match leader_name.as_deref() {
            Some(leader_name) => leaders.iter().find(|l| l.name == leader_name),
            None => None,
        };
        let env = StatEnv::new(conditions).with_leader(leader);
        Some(f(troop, &env))
    }

    /// Roll on behalf of a troop
    pub fn roll(
        &mut self,
        name: &str,
        stat: Stat,
        modifier: i32,
        ctx: &CombatContext,
        arb: &mut Arbiter,
    ) -> bool {
        self.with_troop(name, |troop, env| troop.roll(stat, modifier, env, ctx, arb.dice))
            .unwrap_or(false)
    }

    pub fn damage_roll(&mut self, name: &str, arb: &mut Arbiter) -> i32 {
        self.with_troop(name, |troop, env| troop.damage_roll(env, arb.dice))
            .unwrap_or(0)
    }

    /// Damage a troop and handle its death
    ///
    /// Returns the applied damage, or `None` when no such troop exists.
    pub fn deal_damage(
        &mut self,
        name: &str,
        amount: i32,
        ctx: &CombatContext,
        arb: &mut Arbiter,
    ) -> Option<i32> {
        let (applied, alive) = self.with_troop(name, |troop, env| {
            let applied = troop.take_damage(amount, env, ctx, arb);
            (applied, troop.is_alive())
        })?;
        if !alive {
            arb.say(format!("{} wurde aufgerieben.", name));
            tracing::info!(unit = name, "troop destroyed");
            self.clear_references_to(name);
        }
        Some(applied)
    }

    /// Add a catalog condition by key; unknown keys use the key as name
    pub fn add_condition(
        &mut self,
        name: &str,
        key: &str,
        duration: Duration,
        arb: &mut Arbiter,
    ) -> bool {
        let label = self.conditions.name(key).unwrap_or(key).to_string();
        self.troop_mut(name)
            .is_some_and(|troop| troop.add_condition(key, &label, duration, arb.sink))
    }

    pub fn clear_references_to(&mut self, name: &str) {
        for troop in &mut self.troops {
            troop.clear_reference(name);
        }
        for leader in &mut self.leaders {
            leader.remove_target(name);
        }
    }

    /// Delete a unit and its token
    pub fn remove_unit(&mut self, name: &str) -> Result<UnitKind> {
        let kind = self
            .unit_kind(name)
            .ok_or_else(|| KriegsratError::UnitNotFound(name.to_string()))?;
        match kind {
            UnitKind::Troop => self.troops.retain(|t| t.name != name),
            UnitKind::Leader => self.leaders.retain(|l| l.name != name),
        }
        self.tokens.retain(|t| t.name != name);
        self.clear_references_to(name);
        Ok(kind)
    }

    /// Equip a troop with a copy of an armory weapon
    pub fn arm_troop(&mut self, troop: &str, weapon: &str) -> Result<()> {
        let template = self
            .armory
            .iter()
            .find(|w| w.name == weapon)
            .cloned()
            .ok_or_else(|| KriegsratError::UnknownWeapon(weapon.to_string()))?;
        let troop = self
            .troop_mut(troop)
            .ok_or_else(|| KriegsratError::UnitNotFound(troop.to_string()))?;
        troop.weapons.push(template);
        Ok(())
    }

    pub fn end_of_maneuver(&mut self, arb: &mut Arbiter) {
        let names: Vec<String> = self.living_troops().map(|t| t.name.clone()).collect();
        for name in names {
            self.with_troop(&name, |troop, env| troop.handle_end_of_maneuver(env, arb));
        }
    }

    /// Round upkeep for every living troop, damage-over-time first
    pub fn end_of_round(&mut self, arb: &mut Arbiter) {
        let names: Vec<String> = self.living_troops().map(|t| t.name.clone()).collect();
        for name in names {
            let burn = self
                .troop(&name)
                .map(|troop| self.conditions.damage_bonus(troop.condition_keys(), arb.dice))
                .unwrap_or(0);
            if burn > 0 {
                let ctx = CombatContext {
                    true_damage: true,
                    ..CombatContext::default()
                };
                if let Some(applied) = self.deal_damage(&name, burn, &ctx, arb) {
                    arb.say(format!("{} erleidet {} Schaden durch Zustände.", name, applied));
                }
            }
            self.with_troop(&name, |troop, env| {
                if troop.is_alive() {
                    troop.handle_end_of_round(env, arb);
                }
            });
        }
    }

    pub fn living_troops(&self) -> impl Iterator<Item = &Troop> {
        self.troops.iter().filter(|t| t.is_alive())
    }

    pub fn troops_of<'a>(&'a self, party: &'a str) -> impl Iterator<Item = &'a Troop> {
        self.troops.iter().filter(move |t| t.party == party)
    }

    /// Party of any unit
    pub fn party_of(&self, name: &str) -> Option<&str> {
        self.troop(name)
            .map(|t| t.party.as_str())
            .or_else(|| self.leader(name).map(|l| l.party.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;

    fn field() -> Battlefield {
        let mut bf = Battlefield::new();
        bf.add_troop(Troop::new("Rot 1", "Rot")).unwrap();
        bf.add_troop(Troop::new("Blau 1", "Blau").with_health(10)).unwrap();
        bf.add_leader(Leader::new("Hauptmann", "Rot")).unwrap();
        bf
    }

    #[test]
    fn test_names_are_unique_across_kinds() {
        let mut bf = field();
        assert!(bf.add_troop(Troop::new("Hauptmann", "Rot")).is_err());
        assert!(bf.add_leader(Leader::new("Rot 1", "Rot")).is_err());
        assert_eq!(bf.tokens.len(), 3);
    }

    #[test]
    fn test_arming_from_armory() {
        let mut bf = field();
        bf.armory.push(crate::combat::weapons::Weapon::new(
            "Pike",
            crate::combat::damage::DamageExpr::parse("1W6+4").unwrap(),
        ));

        bf.arm_troop("Rot 1", "Pike").unwrap();
        assert!(bf.troop("Rot 1").unwrap().weapons.iter().any(|w| w.name == "Pike"));
        assert!(matches!(
            bf.arm_troop("Rot 1", "Katapult"),
            Err(KriegsratError::UnknownWeapon(name)) if name == "Katapult"
        ));
        assert!(matches!(
            bf.arm_troop("Niemand", "Pike"),
            Err(KriegsratError::UnitNotFound(_))
        ));
    }

    #[test]
    fn test_death_clears_references() {
        let mut bf = field();
        bf.troop_mut("Rot 1").unwrap().melee_target = Some("Blau 1".into());
        bf.leader_mut("Hauptmann").unwrap().targets = vec!["Blau 1".into()];

        let mut dice = ScriptedDice::repeating(1);
        let mut sink: Vec<String> = Vec::new();
        let mut arb = Arbiter::new(&mut dice, &mut sink);
        let ctx = CombatContext {
            true_damage: true,
            ..CombatContext::melee()
        };
        assert_eq!(bf.deal_damage("Blau 1", 12, &ctx, &mut arb), Some(12));

        assert!(!bf.troop("Blau 1").unwrap().is_alive());
        assert_eq!(bf.troop("Rot 1").unwrap().melee_target, None);
        assert!(bf.leader("Hauptmann").unwrap().targets.is_empty());
        assert!(sink.iter().any(|line| line.contains("aufgerieben")));
    }

    #[test]
    fn test_commanding_leader_feeds_stats() {
        let mut bf = field();
        bf.leader_mut("Hauptmann").unwrap().action =
            Some(crate::units::leader::LeaderAction::TakeCommand);
        let base = bf.stat("Rot 1", Stat::At, &CombatContext::melee()).unwrap();
        bf.troop_mut("Rot 1").unwrap().leader = Some("Hauptmann".into());
        let led = bf.stat("Rot 1", Stat::At, &CombatContext::melee()).unwrap();
        assert_eq!(led, base + 2);
        assert_eq!(
            bf.stat("Rot 1", Stat::EkAction, &CombatContext::melee()),
            Some(i32::MAX)
        );
    }

    #[test]
    fn test_remove_unit_drops_token() {
        let mut bf = field();
        bf.troop_mut("Blau 1").unwrap().melee_target = Some("Rot 1".into());
        assert_eq!(bf.remove_unit("Rot 1").unwrap(), UnitKind::Troop);
        assert!(bf.token("Rot 1").is_none());
        assert_eq!(bf.troop("Blau 1").unwrap().melee_target, None);
        assert!(bf.remove_unit("Rot 1").is_err());
    }

    #[test]
    fn test_burning_deals_damage_at_round_end() {
        let mut bf = field();
        let mut dice = ScriptedDice::repeating(4);
        let mut sink: Vec<String> = Vec::new();
        let mut arb = Arbiter::new(&mut dice, &mut sink);
        bf.add_condition("Rot 1", "b", Duration::Rounds(2), &mut arb);
        bf.end_of_round(&mut arb);
        assert_eq!(bf.troop("Rot 1").unwrap().health, 26);
        assert!(bf.troop("Rot 1").unwrap().has_condition("b"));
    }

    #[test]
    fn test_snapshot_restores_by_value() {
        let mut bf = field();
        let before = bf.snapshot();
        bf.troop_mut("Rot 1").unwrap().health = 1;
        bf.restore(before.clone());
        assert_eq!(bf.snapshot(), before);
    }
}
