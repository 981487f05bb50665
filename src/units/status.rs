//! Troop status bookkeeping: conditions, immunities, probes, round upkeep

use crate::bus::notify::NotificationSink;
use crate::combat::conditions::{keys, Duration, StatusEffect};
use crate::combat::constants::{
    CRITICAL_HEALTH_PERCENT, LOW_HEALTH_PERCENT, MORALE_STREAK_INTERVAL, RECOVERY_THRESHOLD,
};
use crate::combat::context::CombatContext;
use crate::core::types::Stat;
use crate::units::arbiter::Arbiter;
use crate::units::troop::{StatEnv, Troop};

/// Result of a morale probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoraleOutcome {
    Passed,
    /// Morale dropped to half
    Halved,
    /// A morale-immunity charge absorbed the rout
    ImmunityConsumed,
    Fled,
}

impl Troop {
    pub fn has_condition(&self, key: &str) -> bool {
        self.conditions.iter().any(|c| c.key == key)
    }

    pub fn condition(&self, key: &str) -> Option<&StatusEffect> {
        self.conditions.iter().find(|c| c.key == key)
    }

    pub fn has_immunity(&self, key: &str) -> bool {
        self.immunities.iter().any(|i| i.key == key)
    }

    /// Structural reasons `key` cannot stick to this troop
    fn blocks(&self, key: &str) -> bool {
        match key {
            keys::SHOCK => self.has_condition(keys::PIKE_WALL),
            keys::UNDER_FIRE => self.has_shield() || self.has_condition(keys::COVER),
            _ => false,
        }
    }

    /// Add or extend a condition; true if it was added or extended
    ///
    /// Mutually exclusive keys are removed first. An existing condition is
    /// only replaced by a longer one.
    pub fn add_condition(
        &mut self,
        key: &str,
        name: &str,
        duration: Duration,
        sink: &mut dyn NotificationSink,
    ) -> bool {
        if self.has_immunity(key) {
            sink.message(&format!("{} ist gegen {} immun.", self.name, name));
            return false;
        }
        if self.blocks(key) {
            sink.message(&format!("{} kann nicht {} werden.", self.name, name));
            return false;
        }

        for other in keys::exclusive_with(key) {
            if *other != key {
                self.remove_condition(other, sink);
            }
        }

        let unit = self.name.clone();
        match self.conditions.iter_mut().find(|c| c.key == key) {
            None => {
                self.conditions.push(StatusEffect::new(key, name, duration));
                sink.message(&format!(
                    "{} hat den Zustand {} {} lang erhalten.",
                    unit, name, duration
                ));
                true
            }
            Some(existing) if duration.extends(&existing.duration) => {
                match (existing.duration, duration) {
                    (Duration::Rounds(old), Duration::Rounds(new)) => sink.message(&format!(
                        "{} hat den Zustand {} nun noch weitere {} Runden lang.",
                        unit,
                        name,
                        new - old
                    )),
                    _ => sink.message(&format!(
                        "{} hat den Zustand {} nun unbegrenzt lang.",
                        unit, name
                    )),
                }
                existing.duration = duration;
                true
            }
            Some(_) => false,
        }
    }

    pub fn remove_condition(&mut self, key: &str, sink: &mut dyn NotificationSink) -> bool {
        let Some(pos) = self.conditions.iter().position(|c| c.key == key) else {
            return false;
        };
        let removed = self.conditions.remove(pos);
        sink.message(&format!("{} hat den Zustand {} verloren.", self.name, removed.name));
        true
    }

    pub fn add_immunity(
        &mut self,
        key: &str,
        name: &str,
        duration: Duration,
        sink: &mut dyn NotificationSink,
    ) -> bool {
        let unit = self.name.clone();
        match self.immunities.iter_mut().find(|i| i.key == key) {
            None => {
                self.immunities.push(StatusEffect::new(key, name, duration));
                sink.message(&format!(
                    "{} ist nun gegen {} {} lang immun.",
                    unit, name, duration
                ));
                true
            }
            Some(existing) if duration.extends(&existing.duration) => {
                existing.duration = duration;
                sink.message(&format!("{} ist nun {} lang gegen {} immun.", unit, duration, name));
                true
            }
            Some(_) => false,
        }
    }

    pub fn remove_immunity(&mut self, key: &str, sink: &mut dyn NotificationSink) -> bool {
        let Some(pos) = self.immunities.iter().position(|i| i.key == key) else {
            return false;
        };
        let removed = self.immunities.remove(pos);
        sink.message(&format!(
            "{} ist nun nicht mehr gegen {} immun.",
            self.name, removed.name
        ));
        true
    }

    /// Toggle the two low-health tiers against current health
    pub fn update_health_conditions(&mut self, sink: &mut dyn NotificationSink) {
        if !self.is_alive() {
            return;
        }
        let percent = self.health * 100;
        if percent < self.max_health * CRITICAL_HEALTH_PERCENT {
            self.add_condition(keys::CRITICAL_HEALTH, "Geringe LE", Duration::Indefinite, sink);
        } else if percent < self.max_health * LOW_HEALTH_PERCENT {
            self.add_condition(keys::LOW_HEALTH, "Niedrige LE", Duration::Indefinite, sink);
        } else {
            self.remove_condition(keys::LOW_HEALTH, sink);
            self.remove_condition(keys::CRITICAL_HEALTH, sink);
        }
    }

    pub fn heal(&mut self, amount: i32, sink: &mut dyn NotificationSink) {
        self.health = (self.health + amount).min(self.max_health);
        self.update_health_conditions(sink);
    }

    /// Spend recovery points first, the rest becomes exhaustion
    pub fn exhaust(&mut self, amount: i32) {
        let absorbed = amount.min(self.recovery);
        self.recovery -= absorbed;
        self.exhaustion += amount - absorbed;
    }

    /// Pay off exhaustion first, the rest becomes recovery
    pub fn heal_exhaustion(&mut self, amount: i32) {
        let absorbed = amount.min(self.exhaustion);
        self.exhaustion -= absorbed;
        self.recovery += amount - absorbed;
    }

    /// d20 against current morale
    ///
    /// A miss halves morale; a miss by more than double either burns a
    /// morale-immunity charge or sends the troop fleeing.
    pub fn morale_probe(&mut self, env: &StatEnv, arb: &mut Arbiter) -> MoraleOutcome {
        let roll = arb.dice.roll(20, 1);
        let morale = self.get(Stat::Mo, env, &CombatContext::default());

        let outcome = if roll <= morale {
            MoraleOutcome::Passed
        } else if roll > morale * 2 {
            if self.morale_immunity > 0 {
                self.morale_immunity -= 1;
                MoraleOutcome::ImmunityConsumed
            } else {
                self.add_condition(keys::FLEEING, "Fliehend", Duration::Indefinite, arb.sink);
                MoraleOutcome::Fled
            }
        } else {
            self.morale = (morale / 2).max(1);
            MoraleOutcome::Halved
        };

        tracing::debug!(troop = %self.name, roll, morale, ?outcome, "morale probe");
        match outcome {
            MoraleOutcome::Passed => arb.say(format!("{} besteht die Moralprobe.", self.name)),
            MoraleOutcome::Halved => arb.say(format!(
                "{} verliert an Moral (MO {}).",
                self.name, self.morale
            )),
            MoraleOutcome::ImmunityConsumed => arb.say(format!(
                "{} wankt, hält aber stand ({} Moralreserve übrig).",
                self.name, self.morale_immunity
            )),
            MoraleOutcome::Fled => {}
        }
        outcome
    }

    /// Stamina check once exhaustion reaches AU; failure climbs the ladder
    pub fn stamina_probe(&mut self, env: &StatEnv, arb: &mut Arbiter) -> bool {
        let stamina = self.get(Stat::Au, env, &CombatContext::default());
        let overshoot = (self.exhaustion - stamina).max(0);
        if self.roll(Stat::Au, overshoot, env, &CombatContext::default(), arb.dice) {
            return true;
        }

        self.exhaustion = 0;
        if self.has_condition(keys::SEVERELY_EXHAUSTED) {
            self.health /= 2;
            arb.say(format!("{} bricht vor Erschöpfung ein (LE {}).", self.name, self.health));
        } else if self.has_condition(keys::EXHAUSTED) {
            self.add_condition(keys::SEVERELY_EXHAUSTED, "Schwer Erschöpft", Duration::Indefinite, arb.sink);
        } else if self.has_condition(keys::WINDED) {
            self.add_condition(keys::EXHAUSTED, "Erschöpft", Duration::Indefinite, arb.sink);
        } else {
            self.add_condition(keys::WINDED, "Außer Atem", Duration::Indefinite, arb.sink);
        }
        false
    }

    /// Recovery check; success steps one tier down the exhaustion ladder
    pub fn regeneration_probe(&mut self, env: &StatEnv, arb: &mut Arbiter) -> bool {
        let modifier = RECOVERY_THRESHOLD - self.recovery;
        if !self.roll(Stat::Au, modifier, env, &CombatContext::default(), arb.dice) {
            return false;
        }

        self.recovery = 0;
        if self.has_condition(keys::SEVERELY_EXHAUSTED) {
            self.add_condition(keys::EXHAUSTED, "Erschöpft", Duration::Indefinite, arb.sink);
        } else if self.has_condition(keys::EXHAUSTED) {
            self.add_condition(keys::WINDED, "Außer Atem", Duration::Indefinite, arb.sink);
        } else {
            self.remove_condition(keys::WINDED, arb.sink);
        }
        true
    }

    /// Upkeep between maneuver and action phase
    pub fn handle_end_of_maneuver(&mut self, env: &StatEnv, arb: &mut Arbiter) {
        if self.recovery >= RECOVERY_THRESHOLD {
            self.regeneration_probe(env, arb);
        }
    }

    /// Upkeep at the end of a round
    pub fn handle_end_of_round(&mut self, env: &StatEnv, arb: &mut Arbiter) {
        self.parry_count = 0;

        if self.in_melee {
            self.melee_streak += 1;
        } else {
            self.melee_streak = 0;
        }
        if self.rapid_fire {
            self.rapid_fire_streak += 1;
        } else {
            self.rapid_fire_streak = 0;
        }

        if self.melee_streak > 0 && self.melee_streak % MORALE_STREAK_INTERVAL == 0 {
            self.morale_probe(env, arb);
        }
        if self.exhaustion > 0
            && self.exhaustion >= self.get(Stat::Au, env, &CombatContext::default())
        {
            self.stamina_probe(env, arb);
        }
        if self.recovery >= RECOVERY_THRESHOLD {
            self.regeneration_probe(env, arb);
        }

        self.reload = self.reload.saturating_sub(1);

        let expired: Vec<String> = self
            .conditions
            .iter_mut()
            .filter_map(|c| c.duration.tick().then(|| c.key.clone()))
            .collect();
        for key in expired {
            self.remove_condition(&key, arb.sink);
        }

        let expired: Vec<String> = self
            .immunities
            .iter_mut()
            .filter_map(|i| i.duration.tick().then(|| i.key.clone()))
            .collect();
        for key in expired {
            self.remove_immunity(&key, arb.sink);
        }

        self.mods.relax();

        self.in_melee = false;
        self.in_range = false;
        self.rapid_fire = false;
        self.moved = false;
        self.leader = None;
    }
}
