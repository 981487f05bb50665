//! Free actions: resolve at once in any phase, cost no allowance

use serde::{Deserialize, Serialize};

use crate::abilities::{Outcome, Rule};
use crate::units::{Arbiter, Battlefield};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FreeAction {
    SwitchWeapon,
    BreakFormation,
}

impl FreeAction {
    pub fn all() -> &'static [FreeAction] {
        &[FreeAction::SwitchWeapon, FreeAction::BreakFormation]
    }
}

impl Rule for FreeAction {
    fn name(&self) -> &'static str {
        match self {
            FreeAction::SwitchWeapon => "Waffe wechseln",
            FreeAction::BreakFormation => "Formation auflösen",
        }
    }

    fn check(&self, bf: &Battlefield, source: &str) -> bool {
        let Some(troop) = bf.troop(source).filter(|t| t.is_alive()) else {
            return false;
        };
        match self {
            FreeAction::SwitchWeapon => troop.weapons.len() > 1,
            FreeAction::BreakFormation => troop.stance().is_some(),
        }
    }

    fn perform(
        &self,
        bf: &mut Battlefield,
        source: &str,
        _targets: &[String],
        arb: &mut Arbiter,
    ) -> Outcome {
        let Some(troop) = bf.troop_mut(source) else {
            return Outcome::missing(source);
        };
        let mut out = Outcome::new();
        out.short(self.name());

        match self {
            FreeAction::SwitchWeapon => {
                if !troop.weapons.is_empty() {
                    troop.weapon = (troop.weapon + 1) % troop.weapons.len();
                }
                let weapon = troop.equipped().map_or("nichts", |w| w.name.as_str());
                out.line(format!("{} führt jetzt {}.", source, weapon));
            }
            FreeAction::BreakFormation => {
                if let Some(stance) = troop.stance().map(str::to_string) {
                    troop.remove_condition(&stance, arb.sink);
                    out.line(format!("{} löst die Formation auf.", source));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::conditions::{keys, Duration};
    use crate::combat::weapons::Weapon;
    use crate::dice::ScriptedDice;
    use crate::units::Troop;

    #[test]
    fn test_switch_weapon_cycles() {
        let mut bf = Battlefield::new();
        let spear = Weapon::fist().with_reach(2);
        bf.add_troop(Troop::new("Rot 1", "Rot").with_weapons(vec![Weapon::fist(), spear]))
            .unwrap();
        let mut dice = ScriptedDice::repeating(1);
        let mut sink: Vec<String> = Vec::new();
        let mut arb = Arbiter::new(&mut dice, &mut sink);

        assert!(FreeAction::SwitchWeapon.check(&bf, "Rot 1"));
        FreeAction::SwitchWeapon.perform(&mut bf, "Rot 1", &[], &mut arb);
        assert_eq!(bf.troop("Rot 1").unwrap().weapon, 1);
        FreeAction::SwitchWeapon.perform(&mut bf, "Rot 1", &[], &mut arb);
        assert_eq!(bf.troop("Rot 1").unwrap().weapon, 0);
    }

    #[test]
    fn test_break_formation_drops_stance() {
        let mut bf = Battlefield::new();
        bf.add_troop(Troop::new("Rot 1", "Rot")).unwrap();
        assert!(!FreeAction::BreakFormation.check(&bf, "Rot 1"));

        let mut dice = ScriptedDice::repeating(1);
        let mut sink: Vec<String> = Vec::new();
        let mut arb = Arbiter::new(&mut dice, &mut sink);
        bf.add_condition("Rot 1", keys::PIKE_WALL, Duration::Indefinite, &mut arb);
        assert!(FreeAction::BreakFormation.check(&bf, "Rot 1"));
        FreeAction::BreakFormation.perform(&mut bf, "Rot 1", &[], &mut arb);
        assert_eq!(bf.troop("Rot 1").unwrap().stance(), None);
    }
}
