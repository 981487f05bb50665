//! Leader orders, given in the maneuver phase
//!
//! Every order costs a command check. The more troops an order reaches, the
//! harder the check. An order that fails is still remembered and repeated
//! next round.

use crate::abilities::combat::{is_ally, is_enemy};
use crate::abilities::{Outcome, Rule, Selection};
use crate::combat::conditions::{keys, Duration};
use crate::combat::constants::{COUNTER_PENALTY, INSULT_PENALTY, RALLY_IMMUNITY_ROUNDS};
use crate::combat::context::CombatContext;
use crate::core::types::Stat;
use crate::units::{Arbiter, Battlefield, Leader, LeaderAction, Troop};

impl LeaderAction {
    fn targets_enemies(&self) -> bool {
        matches!(self, LeaderAction::Insult | LeaderAction::Skirmish)
    }

    fn max_targets(&self, leader: &Leader) -> usize {
        match self {
            LeaderAction::TakeCommand | LeaderAction::Insult | LeaderAction::Skirmish => 1,
            _ => leader.command_capacity.max(1) as usize,
        }
    }
}

/// Record the order and detach troops that followed the previous one
fn issue_order(bf: &mut Battlefield, leader: &str, order: LeaderAction, targets: &[String]) {
    let previous = bf
        .leader_mut(leader)
        .map(|l| {
            l.action = Some(order);
            std::mem::replace(&mut l.targets, targets.to_vec())
        })
        .unwrap_or_default();
    for name in previous {
        if let Some(troop) = bf.troop_mut(&name) {
            if troop.leader.as_deref() == Some(leader) {
                troop.leader = None;
            }
        }
    }
}

/// Put `targets` under the leader's command
pub fn apply_command(bf: &mut Battlefield, leader: &str, targets: &[String]) {
    for name in targets {
        if let Some(troop) = bf.troop_mut(name) {
            troop.leader = Some(leader.to_string());
        }
    }
}

fn rally(bf: &mut Battlefield, name: &str, arb: &mut Arbiter) -> bool {
    let Some(troop) = bf.troop_mut(name) else {
        return false;
    };
    let rallied = troop.remove_condition(keys::FLEEING, arb.sink);
    troop.add_immunity(keys::FLEEING, "Fliehend", Duration::rounds(RALLY_IMMUNITY_ROUNDS), arb.sink);
    troop.morale = troop.morale.max(troop.mo_base);
    rallied
}

fn insult(bf: &mut Battlefield, target: &str, arb: &mut Arbiter) {
    bf.add_condition(target, keys::DISTRACTED, Duration::rounds(1), arb);
    bf.with_troop(target, |troop, env| {
        troop.mods.mo -= INSULT_PENALTY;
        troop.morale_probe(env, arb);
    });
}

/// Leader duels a troop; the troop answers if it can
fn skirmish(bf: &mut Battlefield, leader: &Leader, target: &str, arb: &mut Arbiter, out: &mut Outcome) {
    let ctx = CombatContext::melee();
    if !leader.attack_roll(0, arb.dice) {
        out.line(format!("{} verfehlt {}.", leader.name, target));
    } else if bf.roll(target, Stat::Pa, 0, &ctx, arb) {
        out.line(format!("{} wehrt {} ab.", target, leader.name));
    } else {
        let damage = leader.damage_roll(arb.dice);
        if let Some(applied) = bf.deal_damage(target, damage, &ctx, arb) {
            out.line(format!("{} trifft {} für {} Schaden.", leader.name, target, applied));
        }
    }

    let answers = bf
        .troop(target)
        .is_some_and(|t| t.is_alive() && !t.has_condition(keys::FLEEING) && !t.has_ranged_weapon());
    if answers && bf.roll(target, Stat::At, COUNTER_PENALTY, &ctx, arb) {
        let damage = bf.damage_roll(target, arb);
        if let Some(l) = bf.leader_mut(&leader.name) {
            let applied = l.take_damage(damage);
            out.line(format!("{} trifft {} für {} Schaden.", target, leader.name, applied));
        }
    }
}

impl Rule for LeaderAction {
    fn name(&self) -> &'static str {
        LeaderAction::name(self)
    }

    fn check(&self, bf: &Battlefield, source: &str) -> bool {
        let Some(leader) = bf.leader(source) else {
            return false;
        };
        let party = leader.party.as_str();
        match self {
            LeaderAction::Rally => bf
                .troops_of(party)
                .any(|t| t.is_alive() && t.has_condition(keys::FLEEING)),
            LeaderAction::Insult | LeaderAction::Skirmish => {
                bf.living_troops().any(|t| t.party != party)
            }
            _ => bf.troops_of(party).any(Troop::is_alive),
        }
    }

    fn selection(&self, bf: &Battlefield, source: &str) -> Selection {
        let Some(leader) = bf.leader(source) else {
            return Selection::none();
        };
        let max = self.max_targets(leader);
        let prompt = match self {
            LeaderAction::TakeCommand => format!("Wähle die Einheit, die {} befehligt.", source),
            LeaderAction::Insult => format!("Wähle die Einheit, die {} beleidigt.", source),
            LeaderAction::Skirmish => format!("Wähle den Gegner für {}.", source),
            _ => format!(
                "Wähle bis zu {} Einheiten für {}: {}.",
                max,
                source,
                LeaderAction::name(self)
            ),
        };
        Selection::targets(1, max, prompt)
    }

    fn check_targeted(&self, bf: &Battlefield, source: &str, targets: &[String]) -> bool {
        let Some(leader) = bf.leader(source) else {
            return false;
        };
        if !self.selection(bf, source).accepts(targets.len()) {
            return false;
        }
        if self.targets_enemies() {
            targets.iter().all(|t| is_enemy(bf, source, t))
        } else {
            targets.iter().all(|t| is_ally(bf, &leader.party, t))
        }
    }

    fn perform(
        &self,
        bf: &mut Battlefield,
        source: &str,
        targets: &[String],
        arb: &mut Arbiter,
    ) -> Outcome {
        let Some(leader) = bf.leader(source).cloned() else {
            return Outcome::missing(source);
        };
        let mut out = Outcome::new();
        let order = LeaderAction::name(self);
        issue_order(bf, source, *self, targets);

        let penalty = targets.len().saturating_sub(1) as i32;
        let success = match self {
            LeaderAction::Insult => arb.dice.check(leader.charisma),
            LeaderAction::Skirmish => true,
            _ => leader.command_check(penalty, arb.dice),
        };
        tracing::debug!(leader = source, order, success, "leader order");

        if !success {
            out.line(format!("{} scheitert bei {}.", source, order));
            out.short(format!("{}: misslungen", order));
            return out;
        }

        match self {
            LeaderAction::Rally => {
                let rallied = targets.iter().filter(|name| rally(bf, name, arb)).count();
                out.line(format!("{} sammelt {} fliehende Einheiten.", source, rallied));
            }
            LeaderAction::Insult => {
                for target in targets {
                    insult(bf, target, arb);
                    out.line(format!("{} verhöhnt {}.", source, target));
                }
            }
            LeaderAction::Skirmish => {
                for target in targets {
                    skirmish(bf, &leader, target, arb, &mut out);
                }
            }
            _ => {
                apply_command(bf, source, targets);
                out.line(format!("{}: {} für {}.", source, order, targets.join(", ")));
            }
        }
        out.short(format!("{} → {}", order, targets.join(", ")));
        out
    }
}
