//! Maneuvers: movement and formation, chosen in the maneuver phase

use serde::{Deserialize, Serialize};

use crate::abilities::combat::{counter_attack, disengage, ek_allows, ready};
use crate::abilities::{Outcome, Rule};
use crate::combat::conditions::{keys, Duration};
use crate::combat::constants::{MARCH_EXHAUSTION, REST_RECOVERY};
use crate::combat::context::CombatContext;
use crate::core::types::Stat;
use crate::units::{Arbiter, Battlefield};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Maneuver {
    March,
    Rest,
    ShieldWall,
    PikeWall,
    Skirmish,
    SeekCover,
    Retreat,
}

impl Maneuver {
    pub fn all() -> &'static [Maneuver] {
        &[
            Maneuver::March,
            Maneuver::Rest,
            Maneuver::ShieldWall,
            Maneuver::PikeWall,
            Maneuver::Skirmish,
            Maneuver::SeekCover,
            Maneuver::Retreat,
        ]
    }

    fn form_up(bf: &mut Battlefield, source: &str, key: &str, arb: &mut Arbiter) -> bool {
        bf.add_condition(source, key, Duration::Indefinite, arb)
    }
}

impl Rule for Maneuver {
    fn name(&self) -> &'static str {
        match self {
            Maneuver::March => "Laufen",
            Maneuver::Rest => "Ausruhen",
            Maneuver::ShieldWall => "Schildwall",
            Maneuver::PikeWall => "Pikenwall",
            Maneuver::Skirmish => "Plänkeln",
            Maneuver::SeekCover => "Deckung suchen",
            Maneuver::Retreat => "Rückzug",
        }
    }

    fn check(&self, bf: &Battlefield, source: &str) -> bool {
        let Some(troop) = bf.troop(source).filter(|t| t.is_alive()) else {
            return false;
        };
        let fleeing = troop.has_condition(keys::FLEEING);
        let engaged = troop.melee_target.is_some();

        match self {
            // Fleeing troops run even out of melee
            Maneuver::March => !engaged || fleeing,
            Maneuver::Rest => !engaged,
            _ if ready(bf, source).is_none() => false,
            Maneuver::ShieldWall => {
                troop.has_shield() && troop.stance() != Some(keys::SHIELD_WALL)
            }
            Maneuver::PikeWall => {
                !troop.is_mounted()
                    && troop.stance() != Some(keys::PIKE_WALL)
                    && ek_allows(bf, source, 3)
            }
            Maneuver::Skirmish => {
                !troop.big
                    && !engaged
                    && troop.stance() != Some(keys::SKIRMISH)
                    && ek_allows(bf, source, 2)
            }
            Maneuver::SeekCover => !engaged && !troop.has_condition(keys::COVER),
            Maneuver::Retreat => engaged,
        }
    }

    fn perform(
        &self,
        bf: &mut Battlefield,
        source: &str,
        _targets: &[String],
        arb: &mut Arbiter,
    ) -> Outcome {
        if bf.troop(source).is_none() {
            return Outcome::missing(source);
        }
        let mut out = Outcome::new();
        out.short(self.name());

        match self {
            Maneuver::March => {
                let speed = bf
                    .stat(source, Stat::Gs, &CombatContext::default())
                    .unwrap_or(0);
                if let Some(troop) = bf.troop_mut(source) {
                    troop.moved = true;
                    troop.exhaust(MARCH_EXHAUSTION);
                }
                out.line(format!("{} marschiert (GS {}).", source, speed));
                out.pause_with(format!(
                    "Bewege {} um bis zu {} Felder und bestätige.",
                    source, speed
                ));
            }
            Maneuver::Rest => {
                if let Some(troop) = bf.troop_mut(source) {
                    troop.heal_exhaustion(REST_RECOVERY);
                }
                out.line(format!("{} ruht sich aus.", source));
            }
            Maneuver::ShieldWall => {
                if Self::form_up(bf, source, keys::SHIELD_WALL, arb) {
                    out.line(format!("{} bildet einen Schildwall.", source));
                }
            }
            Maneuver::PikeWall => {
                if Self::form_up(bf, source, keys::PIKE_WALL, arb) {
                    out.line(format!("{} bildet einen Pikenwall.", source));
                }
            }
            Maneuver::Skirmish => {
                if Self::form_up(bf, source, keys::SKIRMISH, arb) {
                    out.line(format!("{} schwärmt zum Plänkeln aus.", source));
                }
            }
            Maneuver::SeekCover => {
                bf.add_condition(source, keys::COVER, Duration::rounds(1), arb);
                if let Some(troop) = bf.troop_mut(source) {
                    troop.moved = true;
                }
                out.line(format!("{} sucht Deckung.", source));
                out.pause_with(format!("Platziere {} in Deckung und bestätige.", source));
            }
            Maneuver::Retreat => {
                let enemy = bf.troop(source).and_then(|t| t.melee_target.clone());
                if let Some(enemy) = enemy {
                    let locked = bf
                        .troop(&enemy)
                        .is_some_and(|t| t.melee_target.as_deref() == Some(source));
                    if locked {
                        counter_attack(bf, &enemy, source, arb, &mut out);
                    }
                }
                disengage(bf, source);
                if let Some(troop) = bf.troop_mut(source).filter(|t| t.is_alive()) {
                    troop.moved = true;
                    troop.exhaust(MARCH_EXHAUSTION);
                    out.line(format!("{} zieht sich zurück.", source));
                    out.pause_with(format!("Ziehe {} zurück und bestätige.", source));
                }
            }
        }
        out
    }
}
