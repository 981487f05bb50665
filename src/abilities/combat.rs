//! Shared combat procedures used by several abilities

use crate::abilities::Outcome;
use crate::combat::conditions::{keys, Duration};
use crate::combat::constants::{COUNTER_PENALTY, FLANK_ADVANTAGE};
use crate::combat::context::CombatContext;
use crate::core::types::Stat;
use crate::units::{Arbiter, Battlefield, Troop};

/// Living troop that is not fleeing
pub(crate) fn ready<'a>(bf: &'a Battlefield, name: &str) -> Option<&'a Troop> {
    bf.troop(name)
        .filter(|troop| troop.is_alive() && !troop.has_condition(keys::FLEEING))
}

/// Whether the effective EK (or a commanding leader) allows this tier
pub(crate) fn ek_allows(bf: &Battlefield, name: &str, tier: i32) -> bool {
    bf.stat(name, Stat::EkAction, &CombatContext::melee())
        .is_some_and(|ek| ek >= tier)
}

/// Living troop of another party
pub(crate) fn is_enemy(bf: &Battlefield, source: &str, target: &str) -> bool {
    let Some(troop) = bf.troop(target) else {
        return false;
    };
    troop.is_alive() && bf.party_of(source).is_some_and(|party| party != troop.party)
}

/// Living troop of the same party
pub(crate) fn is_ally(bf: &Battlefield, party: &str, target: &str) -> bool {
    bf.troop(target)
        .is_some_and(|troop| troop.is_alive() && troop.party == party)
}

/// Lock two troops into melee with each other
///
/// The defender keeps an existing opponent.
pub fn engage(bf: &mut Battlefield, attacker: &str, defender: &str) {
    if let Some(troop) = bf.troop_mut(attacker) {
        troop.melee_target = Some(defender.to_string());
    }
    if let Some(troop) = bf.troop_mut(defender) {
        troop.melee_target.get_or_insert_with(|| attacker.to_string());
    }
}

/// Release `name` from melee, along with an opponent locked onto it
pub fn disengage(bf: &mut Battlefield, name: &str) {
    let opponent = bf.troop_mut(name).and_then(|troop| troop.melee_target.take());
    if let Some(opponent) = opponent {
        if let Some(troop) = bf.troop_mut(&opponent) {
            if troop.melee_target.as_deref() == Some(name) {
                troop.melee_target = None;
            }
        }
    }
}

/// One attack: AT (or FK) against PA, then damage
///
/// Returns the damage that got through, `None` on a miss or a parry.
pub fn strike(
    bf: &mut Battlefield,
    attacker: &str,
    defender: &str,
    base: CombatContext,
    modifier: i32,
    arb: &mut Arbiter,
    out: &mut Outcome,
) -> Option<i32> {
    let mut ctx = base;
    if let Some(troop) = bf.troop(attacker) {
        ctx.attacker_big |= troop.big;
        ctx.attacker_sally |= troop.has_condition(keys::SALLY);
    }

    let stat = if ctx.ranged { Stat::Fk } else { Stat::At };
    if !bf.roll(attacker, stat, modifier, &ctx, arb) {
        out.line(format!("{} verfehlt {}.", attacker, defender));
        return None;
    }
    if bf.roll(defender, Stat::Pa, 0, &ctx, arb) {
        out.line(format!("{} wehrt den Angriff von {} ab.", defender, attacker));
        return None;
    }

    let damage = bf.damage_roll(attacker, arb);
    let applied = bf.deal_damage(defender, damage, &ctx, arb)?;
    out.line(format!(
        "{} trifft {} und verursacht {} Schaden.",
        attacker, defender, applied
    ));
    Some(applied)
}

/// The defender strikes back if it still can
pub fn counter_attack(
    bf: &mut Battlefield,
    defender: &str,
    attacker: &str,
    arb: &mut Arbiter,
    out: &mut Outcome,
) -> Option<i32> {
    let able = ready(bf, defender).is_some_and(|troop| !troop.has_ranged_weapon());
    let target_alive = bf.troop(attacker).is_some_and(Troop::is_alive);
    if !able || !target_alive {
        return None;
    }
    out.line(format!("{} schlägt zurück.", defender));
    strike(bf, defender, attacker, CombatContext::melee(), COUNTER_PENALTY, arb, out)
}

/// Attack from the flank: the target is distracted and cannot answer
pub fn flank(
    bf: &mut Battlefield,
    attacker: &str,
    defender: &str,
    arb: &mut Arbiter,
    out: &mut Outcome,
) -> Option<i32> {
    out.line(format!("{} fällt {} in die Flanke.", attacker, defender));
    bf.add_condition(defender, keys::DISTRACTED, Duration::rounds(1), arb);
    if let Some(troop) = bf.troop_mut(attacker) {
        troop.melee_target = Some(defender.to_string());
    }
    let ctx = CombatContext {
        flank: true,
        ..CombatContext::melee()
    };
    strike(bf, attacker, defender, ctx, -FLANK_ADVANTAGE, arb, out)
}

/// Short log fragment for a strike result
pub(crate) fn hit_summary(result: Option<i32>) -> String {
    match result {
        Some(damage) => format!("{} Schaden", damage),
        None => "kein Treffer".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::weapons::Weapon;
    use crate::combat::damage::DamageExpr;
    use crate::dice::ScriptedDice;

    fn field() -> Battlefield {
        let axe = Weapon::new("Axt", "1W6+2".parse::<DamageExpr>().unwrap());
        let mut bf = Battlefield::new();
        bf.add_troop(Troop::new("Rot 1", "Rot").with_weapons(vec![axe])).unwrap();
        bf.add_troop(Troop::new("Blau 1", "Blau").with_armor(2)).unwrap();
        bf
    }

    #[test]
    fn test_strike_hits_through_failed_parry() {
        let mut bf = field();
        // AT 1 hits, PA 20 fails, W6 rolls 4
        let mut dice = ScriptedDice::new([1, 20, 4]);
        let mut sink: Vec<String> = Vec::new();
        let mut arb = Arbiter::new(&mut dice, &mut sink);
        let mut out = Outcome::new();

        let dealt = strike(&mut bf, "Rot 1", "Blau 1", CombatContext::melee(), 0, &mut arb, &mut out);
        // 4 + 2 + TP 3 - RS 2
        assert_eq!(dealt, Some(7));
        assert_eq!(bf.troop("Blau 1").unwrap().health, 23);
        assert!(bf.troop("Rot 1").unwrap().in_melee);
        assert!(bf.troop("Blau 1").unwrap().in_melee);
    }

    #[test]
    fn test_parry_stops_damage() {
        let mut bf = field();
        let mut dice = ScriptedDice::new([1, 1]);
        let mut sink: Vec<String> = Vec::new();
        let mut arb = Arbiter::new(&mut dice, &mut sink);
        let mut out = Outcome::new();

        assert_eq!(
            strike(&mut bf, "Rot 1", "Blau 1", CombatContext::melee(), 0, &mut arb, &mut out),
            None
        );
        assert_eq!(bf.troop("Blau 1").unwrap().health, 30);
        assert!(out.log[0].contains("wehrt"));
    }

    #[test]
    fn test_fleeing_defender_does_not_counter() {
        let mut bf = field();
        let mut dice = ScriptedDice::repeating(1);
        let mut sink: Vec<String> = Vec::new();
        let mut arb = Arbiter::new(&mut dice, &mut sink);
        bf.add_condition("Blau 1", keys::FLEEING, Duration::Indefinite, &mut arb);

        let mut out = Outcome::new();
        assert_eq!(counter_attack(&mut bf, "Blau 1", "Rot 1", &mut arb, &mut out), None);
        assert!(out.log.is_empty());
    }

    #[test]
    fn test_flank_distracts_target() {
        let mut bf = field();
        let mut dice = ScriptedDice::new([20]);
        let mut sink: Vec<String> = Vec::new();
        let mut arb = Arbiter::new(&mut dice, &mut sink);
        let mut out = Outcome::new();

        flank(&mut bf, "Rot 1", "Blau 1", &mut arb, &mut out);
        assert!(bf.troop("Blau 1").unwrap().has_condition(keys::DISTRACTED));
        assert_eq!(bf.troop("Rot 1").unwrap().melee_target.as_deref(), Some("Blau 1"));
    }

    #[test]
    fn test_disengage_releases_both_sides() {
        let mut bf = field();
        engage(&mut bf, "Rot 1", "Blau 1");
        assert_eq!(bf.troop("Blau 1").unwrap().melee_target.as_deref(), Some("Rot 1"));
        disengage(&mut bf, "Rot 1");
        assert_eq!(bf.troop("Rot 1").unwrap().melee_target, None);
        assert_eq!(bf.troop("Blau 1").unwrap().melee_target, None);
    }
}
