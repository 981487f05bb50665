//! Actions: attacks and fire, queued in the action phase
//!
//! Stronger actions are gated on effective EK. A commanding leader lifts
//! the gate entirely.

use serde::{Deserialize, Serialize};

use crate::abilities::combat::{
    counter_attack, ek_allows, engage, flank, hit_summary, is_enemy, ready, strike,
};
use crate::abilities::{Outcome, Rule, Selection};
use crate::combat::conditions::{keys, Duration};
use crate::combat::constants::{
    BARRAGE_PENALTY, BARRAGE_ROUNDS, CHARGE_BONUS, CHARGE_EXHAUSTION, RAPID_FIRE_PENALTY,
    SHOCK_ROUNDS,
};
use crate::combat::context::CombatContext;
use crate::core::types::Stat;
use crate::units::{Arbiter, Battlefield, Troop};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Attack,
    Volley,
    RapidFire,
    Barrage,
    Flank,
    Charge,
    Sally,
    Hold,
}

impl Action {
    pub fn all() -> &'static [Action] {
        &[
            Action::Attack,
            Action::Volley,
            Action::RapidFire,
            Action::Barrage,
            Action::Flank,
            Action::Charge,
            Action::Sally,
            Action::Hold,
        ]
    }
}

/// Ranged weapon loaded and no one in the face
fn can_shoot(troop: &Troop) -> bool {
    troop.has_ranged_weapon() && troop.reload == 0 && troop.melee_target.is_none()
}

fn start_reload(bf: &mut Battlefield, source: &str, target: &str) {
    if let Some(troop) = bf.troop_mut(source) {
        troop.reload = troop.equipped().map_or(0, |weapon| weapon.reload_turns);
        troop.range_target = Some(target.to_string());
    }
}

impl Rule for Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Attack => "Angriff",
            Action::Volley => "Fernkampf",
            Action::RapidFire => "Schnellfeuer",
            Action::Barrage => "Sperrfeuer",
            Action::Flank => "Flankieren",
            Action::Charge => "Sturmangriff",
            Action::Sally => "Ausfall",
            Action::Hold => "Abwarten",
        }
    }

    fn check(&self, bf: &Battlefield, source: &str) -> bool {
        if *self == Action::Hold {
            return bf.troop(source).is_some_and(Troop::is_alive);
        }
        let Some(troop) = ready(bf, source) else {
            return false;
        };

        match self {
            Action::Attack => !troop.has_ranged_weapon() && ek_allows(bf, source, 1),
            Action::Volley => can_shoot(troop) && ek_allows(bf, source, 1),
            Action::RapidFire => {
                can_shoot(troop)
                    && troop.equipped().is_some_and(|weapon| weapon.reload_turns == 0)
                    && ek_allows(bf, source, 3)
            }
            Action::Barrage => can_shoot(troop) && ek_allows(bf, source, 2),
            Action::Flank => !troop.has_ranged_weapon() && ek_allows(bf, source, 4),
            Action::Charge => {
                !troop.has_ranged_weapon()
                    && troop.melee_target.is_none()
                    && ek_allows(bf, source, 3)
            }
            Action::Sally => {
                let sheltered = troop.has_condition(keys::COVER)
                    || matches!(troop.stance(), Some(keys::SHIELD_WALL | keys::PIKE_WALL));
                !troop.has_ranged_weapon() && sheltered && ek_allows(bf, source, 3)
            }
            Action::Hold => true,
        }
    }

    fn selection(&self, _bf: &Battlefield, source: &str) -> Selection {
        match self {
            Action::Hold => Selection::none(),
            Action::Barrage => Selection::targets(
                1,
                3,
                format!("Wähle bis zu drei Ziele für das Sperrfeuer von {}.", source),
            ),
            Action::Volley | Action::RapidFire => {
                Selection::targets(1, 1, format!("Wähle das Ziel, auf das {} schießt.", source))
            }
            Action::Flank => Selection::targets(
                1,
                1,
                format!("Wähle die Einheit, der {} in die Flanke fällt.", source),
            ),
            _ => Selection::targets(1, 1, format!("Wähle das Ziel, das {} angreift.", source)),
        }
    }

    fn check_targeted(&self, bf: &Battlefield, source: &str, targets: &[String]) -> bool {
        if !self.check(bf, source) || !self.selection(bf, source).accepts(targets.len()) {
            return false;
        }
        if *self == Action::Hold {
            return true;
        }
        if !targets.iter().all(|target| is_enemy(bf, source, target)) {
            return false;
        }
        match self {
            // The target must already be busy with someone else
            Action::Flank => targets.iter().all(|target| {
                bf.troop(target).is_some_and(|t| {
                    t.melee_target.as_deref().is_some_and(|other| other != source)
                })
            }),
            _ => true,
        }
    }

    fn perform(
        &self,
        bf: &mut Battlefield,
        source: &str,
        targets: &[String],
        arb: &mut Arbiter,
    ) -> Outcome {
        if bf.troop(source).is_none() {
            return Outcome::missing(source);
        }
        let mut out = Outcome::new();
        let first = targets.first().map(String::as_str);

        match (self, first) {
            (Action::Hold, _) => {
                out.line(format!("{} wartet ab.", source));
                out.short(self.name());
            }
            (Action::Attack, Some(target)) => {
                engage(bf, source, target);
                let dealt = strike(bf, source, target, CombatContext::melee(), 0, arb, &mut out);
                counter_attack(bf, target, source, arb, &mut out);
                out.short(format!("{} → {}: {}", self.name(), target, hit_summary(dealt)));
            }
            (Action::Volley, Some(target)) => {
                let dealt = strike(bf, source, target, CombatContext::ranged(), 0, arb, &mut out);
                start_reload(bf, source, target);
                out.short(format!("{} → {}: {}", self.name(), target, hit_summary(dealt)));
            }
            (Action::RapidFire, Some(target)) => {
                let ctx = CombatContext {
                    rapid_fire: true,
                    ..CombatContext::ranged()
                };
                let mut total = None;
                for _ in 0..2 {
                    if !bf.troop(target).is_some_and(Troop::is_alive) {
                        break;
                    }
                    if let Some(dealt) = strike(bf, source, target, ctx, RAPID_FIRE_PENALTY, arb, &mut out) {
                        total = Some(total.unwrap_or(0) + dealt);
                    }
                }
                start_reload(bf, source, target);
                out.short(format!("{} → {}: {}", self.name(), target, hit_summary(total)));
            }
            (Action::Barrage, Some(target)) => {
                let mut pinned = Vec::new();
                for name in targets {
                    if bf.roll(source, Stat::Fk, BARRAGE_PENALTY, &CombatContext::ranged(), arb)
                        && bf.add_condition(name, keys::UNDER_FIRE, Duration::rounds(BARRAGE_ROUNDS), arb)
                    {
                        pinned.push(name.as_str());
                    }
                }
                start_reload(bf, source, target);
                out.line(format!(
                    "{} legt Sperrfeuer auf {}.",
                    source,
                    targets.join(", ")
                ));
                out.short(format!("{}: {} unter Beschuss", self.name(), pinned.len()));
            }
            (Action::Flank, Some(target)) => {
                let dealt = flank(bf, source, target, arb, &mut out);
                out.short(format!("{} → {}: {}", self.name(), target, hit_summary(dealt)));
            }
            (Action::Charge, Some(target)) => {
                let mounted = bf.troop(source).is_some_and(Troop::is_mounted);
                if let Some(troop) = bf.troop_mut(source) {
                    troop.exhaust(CHARGE_EXHAUSTION);
                    troop.moved = true;
                }
                engage(bf, source, target);
                let ctx = CombatContext {
                    lance: mounted,
                    ..CombatContext::melee()
                };
                out.line(format!("{} stürmt auf {} ein.", source, target));
                let dealt = strike(bf, source, target, ctx, -CHARGE_BONUS, arb, &mut out);
                if dealt.is_some() && bf.troop(target).is_some_and(Troop::is_alive) {
                    bf.add_condition(target, keys::SHOCK, Duration::rounds(SHOCK_ROUNDS), arb);
                }
                out.short(format!("{} → {}: {}", self.name(), target, hit_summary(dealt)));
                out.pause_with(format!("Setze {} an {} heran und bestätige.", source, target));
            }
            (Action::Sally, Some(target)) => {
                if let Some(troop) = bf.troop_mut(source) {
                    troop.remove_condition(keys::COVER, arb.sink);
                }
                bf.add_condition(source, keys::SALLY, Duration::rounds(1), arb);
                engage(bf, source, target);
                out.line(format!("{} bricht zum Ausfall gegen {} hervor.", source, target));
                let dealt = strike(bf, source, target, CombatContext::melee(), 0, arb, &mut out);
                counter_attack(bf, target, source, arb, &mut out);
                out.short(format!("{} → {}: {}", self.name(), target, hit_summary(dealt)));
            }
            (_, None) => {
                out.line(format!("{}: kein Ziel für {}.", source, self.name()));
            }
        }
        out
    }
}
