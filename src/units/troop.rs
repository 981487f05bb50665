//! Troops: bodies of soldiers that fight, tire and break
//!
//! A troop carries its base profile plus all per-round combat state. Stat
//! lookups combine the profile with the equipped weapon, the per-round
//! modifier accumulator, active conditions and the commanding leader.

use serde::{Deserialize, Serialize};

use crate::combat::conditions::{keys, ConditionCatalog, StatusEffect};
use crate::combat::constants::{HEAVY_RANGED_DIVISOR, MULTI_PARRY_BASE};
use crate::combat::context::CombatContext;
use crate::combat::modifiers::Modifiers;
use crate::combat::weapons::Weapon;
use crate::core::types::Stat;
use crate::dice::DiceRoller;
use crate::units::arbiter::Arbiter;
use crate::units::leader::Leader;

/// What a stat lookup may consult besides the troop itself
#[derive(Clone, Copy)]
pub struct StatEnv<'a> {
    pub conditions: &'a ConditionCatalog,
    pub leader: Option<&'a Leader>,
}

impl<'a> StatEnv<'a> {
    pub fn new(conditions: &'a ConditionCatalog) -> Self {
        Self {
            conditions,
            leader: None,
        }
    }

    pub fn with_leader(mut self, leader: Option<&'a Leader>) -> Self {
        self.leader = leader;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Troop {
    // Profile
    pub name: String,
    pub party: String,
    pub ek: i32,
    pub head_count: u32,
    pub big: bool,
    pub shield: bool,
    /// Mount class; 2 is mounted
    pub rtm: u32,
    pub gs_base: i32,
    pub gs_mounted: i32,
    pub max_health: i32,
    pub rs_base: i32,
    pub at_base: i32,
    pub pa_base: i32,
    pub fk_base: i32,
    pub mo_base: i32,
    pub au_base: i32,
    pub ini_base: i32,
    pub action_count: i32,
    pub maneuver_count: i32,
    pub weapons: Vec<Weapon>,
    #[serde(default)]
    pub properties: Vec<String>,

    // Resources
    pub health: i32,
    pub morale: i32,
    /// Charges that absorb a failed morale probe instead of fleeing
    pub morale_immunity: i32,
    #[serde(default)]
    pub exhaustion: i32,
    #[serde(default)]
    pub recovery: i32,
    #[serde(default)]
    pub initiative: i32,
    #[serde(default)]
    pub weapon: usize,

    // Engagement
    #[serde(default)]
    pub in_melee: bool,
    #[serde(default)]
    pub melee_streak: u32,
    #[serde(default)]
    pub melee_target: Option<String>,
    #[serde(default)]
    pub parry_count: u32,
    #[serde(default)]
    pub in_range: bool,
    #[serde(default)]
    pub rapid_fire: bool,
    #[serde(default)]
    pub rapid_fire_streak: u32,
    /// Rounds until the equipped missile weapon is ready
    #[serde(default)]
    pub reload: u32,
    #[serde(default)]
    pub range_target: Option<String>,
    #[serde(default)]
    pub moved: bool,

    #[serde(default)]
    pub mods: Modifiers,
    #[serde(default)]
    pub conditions: Vec<StatusEffect>,
    #[serde(default)]
    pub immunities: Vec<StatusEffect>,
    /// Leader currently granting bonuses
    #[serde(default)]
    pub leader: Option<String>,
}

impl Troop {
    pub fn new(name: impl Into<String>, party: impl Into<String>) -> Self {
        let ek = 3;
        let max_health = 30;
        let mo_base = 10;
        Self {
            name: name.into(),
            party: party.into(),
            ek,
            head_count: 10,
            big: false,
            shield: false,
            rtm: 0,
            gs_base: 4,
            gs_mounted: 0,
            max_health,
            rs_base: 1,
            at_base: 8,
            pa_base: 6,
            fk_base: 6,
            mo_base,
            au_base: 10,
            ini_base: 3,
            action_count: 1,
            maneuver_count: 1,
            weapons: vec![Weapon::fist()],
            properties: Vec::new(),
            health: max_health,
            morale: mo_base,
            morale_immunity: ek,
            exhaustion: 0,
            recovery: 0,
            initiative: 0,
            weapon: 0,
            in_melee: false,
            melee_streak: 0,
            melee_target: None,
            parry_count: 0,
            in_range: false,
            rapid_fire: false,
            rapid_fire_streak: 0,
            reload: 0,
            range_target: None,
            moved: false,
            mods: Modifiers::default(),
            conditions: Vec::new(),
            immunities: Vec::new(),
            leader: None,
        }
    }

    pub fn with_ek(mut self, ek: i32) -> Self {
        self.ek = ek;
        self.morale_immunity = ek;
        self
    }

    pub fn with_health(mut self, max_health: i32) -> Self {
        self.max_health = max_health;
        self.health = max_health;
        self
    }

    pub fn with_armor(mut self, rs: i32) -> Self {
        self.rs_base = rs;
        self
    }

    pub fn with_combat(mut self, at: i32, pa: i32, fk: i32) -> Self {
        self.at_base = at;
        self.pa_base = pa;
        self.fk_base = fk;
        self
    }

    pub fn with_morale(mut self, mo: i32) -> Self {
        self.mo_base = mo;
        self.morale = mo;
        self
    }

    pub fn with_stamina(mut self, au: i32) -> Self {
        self.au_base = au;
        self
    }

    pub fn with_speed(mut self, gs: i32, mounted: i32, rtm: u32) -> Self {
        self.gs_base = gs;
        self.gs_mounted = mounted;
        self.rtm = rtm;
        self
    }

    pub fn with_allowance(mut self, actions: i32, maneuvers: i32) -> Self {
        self.action_count = actions;
        self.maneuver_count = maneuvers;
        self
    }

    /// Replace the weapon list; an empty list leaves the troop with fists
    pub fn with_weapons(mut self, weapons: Vec<Weapon>) -> Self {
        self.weapons = if weapons.is_empty() {
            vec![Weapon::fist()]
        } else {
            weapons
        };
        self.weapon = 0;
        self
    }

    pub fn big(mut self) -> Self {
        self.big = true;
        self
    }

    pub fn shielded(mut self) -> Self {
        self.shield = true;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn equipped(&self) -> Option<&Weapon> {
        self.weapons.get(self.weapon)
    }

    pub fn reach(&self) -> u32 {
        self.equipped().map_or(1, |weapon| weapon.reach)
    }

    pub fn has_ranged_weapon(&self) -> bool {
        self.equipped().is_some_and(Weapon::is_ranged)
    }

    /// Shield from the profile or from the equipped weapon
    pub fn has_shield(&self) -> bool {
        self.shield || self.equipped().is_some_and(|weapon| weapon.shield)
    }

    pub fn is_mounted(&self) -> bool {
        self.rtm == 2
    }

    pub fn condition_keys(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|condition| condition.key.as_str())
    }

    pub fn stance(&self) -> Option<&str> {
        self.condition_keys().find(|key| keys::STANCES.contains(key))
    }

    fn base(&self, stat: Stat, env: &StatEnv, ctx: &CombatContext) -> i32 {
        let weapon = self.equipped().map_or(0, |weapon| weapon.modifier(stat));
        match stat {
            Stat::Ek => self.ek,
            Stat::At => self.at_base + weapon + self.get(Stat::Ek, env, ctx),
            Stat::Pa => self.pa_base + weapon + self.get(Stat::Ek, env, ctx),
            Stat::Fk => self.fk_base + weapon + self.get(Stat::Ek, env, ctx),
            Stat::Tp => self.get(Stat::Ek, env, ctx),
            Stat::Mo => self.morale,
            Stat::Rs => self.rs_base,
            Stat::Gs if self.is_mounted() => self.gs_base + self.gs_mounted,
            Stat::Gs => self.gs_base,
            Stat::Au => self.au_base,
            Stat::ActionCount => self.action_count,
            Stat::ManeuverCount => self.maneuver_count,
            Stat::EkAction => self.get(Stat::Ek, env, ctx),
        }
    }

    /// Effective value of `stat`, never below zero
    pub fn get(&self, stat: Stat, env: &StatEnv, ctx: &CombatContext) -> i32 {
        if stat == Stat::EkAction && env.leader.is_some_and(Leader::grants_unlimited_actions) {
            return i32::MAX;
        }

        let conditions = env
            .conditions
            .modifier(self.condition_keys(), stat, ctx);
        let leader = env.leader.map_or(0, |leader| leader.bonus(stat));
        let value = (self.base(stat, env, ctx) + self.mods.get(stat) + conditions + leader).max(0);

        if stat == Stat::Pa && ctx.ranged {
            (value + 1) / 2
        } else {
            value
        }
    }

    /// Whether a parry against this attack fails outright
    fn parry_impossible(&self, ctx: &CombatContext) -> bool {
        (ctx.lance && !self.has_condition(keys::PIKE_WALL))
            || (ctx.ranged && !self.has_shield())
            || (ctx.attacker_big && !self.has_shield())
    }

    /// Roll-under check on `stat`; positive `modifier` makes it harder
    ///
    /// Sets the engagement flags for AT, PA and FK. Each parry raises the
    /// penalty on the next one this round.
    pub fn roll(
        &mut self,
        stat: Stat,
        modifier: i32,
        env: &StatEnv,
        ctx: &CombatContext,
        dice: &mut dyn DiceRoller,
    ) -> bool {
        match stat {
            Stat::Pa => {
                self.in_melee |= !ctx.ranged;
                if self.parry_impossible(ctx) {
                    self.parry_count += 1;
                    return false;
                }
                let per_parry = (2 * MULTI_PARRY_BASE - self.get(Stat::Ek, env, ctx)).max(0);
                // half points count against the defender
                let penalty = (self.parry_count as i32 * per_parry + 1) / 2;
                let target = self.get(Stat::Pa, env, ctx) - modifier - penalty;
                self.parry_count += 1;
                dice.check(target)
            }
            Stat::At => {
                self.in_melee = true;
                dice.check(self.get(Stat::At, env, ctx) - modifier)
            }
            Stat::Fk => {
                self.in_range = true;
                self.rapid_fire |= ctx.rapid_fire;
                dice.check(self.get(Stat::Fk, env, ctx) - modifier)
            }
            _ => dice.check(self.get(stat, env, ctx) - modifier),
        }
    }

    /// Apply a hit and return the damage that got through
    ///
    /// Multipliers act before armor. Heavy missile hits and hits from a
    /// sallying attacker force a morale probe. Death handling for other
    /// units is the roster's job.
    pub fn take_damage(
        &mut self,
        amount: i32,
        env: &StatEnv,
        ctx: &CombatContext,
        arb: &mut Arbiter,
    ) -> i32 {
        let mut damage = amount;
        if self.has_condition(keys::CRITICAL_HEALTH) {
            damage /= 2;
        }
        if self.has_condition(keys::SKIRMISH) {
            if ctx.ranged {
                damage /= 2;
            } else {
                damage *= 2;
            }
        }
        if !ctx.true_damage {
            damage -= self.get(Stat::Rs, env, ctx);
        }
        let applied = damage.max(0);
        self.health -= applied;

        let heavy_ranged = ctx.ranged && applied > 0 && applied * HEAVY_RANGED_DIVISOR >= self.max_health;
        if self.is_alive() && (heavy_ranged || ctx.attacker_sally) {
            self.morale_probe(env, arb);
        }
        self.update_health_conditions(arb.sink);
        applied
    }

    /// Weapon damage plus TP
    pub fn damage_roll(&self, env: &StatEnv, dice: &mut dyn DiceRoller) -> i32 {
        let weapon = self.equipped().map_or(0, |weapon| weapon.damage.evaluate(dice));
        weapon + self.get(Stat::Tp, env, &CombatContext::default())
    }

    pub fn roll_initiative(&mut self, dice: &mut dyn DiceRoller) -> i32 {
        self.initiative = 2 * self.ini_base + dice.roll(6, self.ek.max(0) as u32);
        self.initiative
    }

    /// Forget `name` as a melee, ranged or leader reference
    pub fn clear_reference(&mut self, name: &str) {
        if self.melee_target.as_deref() == Some(name) {
            self.melee_target = None;
        }
        if self.range_target.as_deref() == Some(name) {
            self.range_target = None;
        }
        if self.leader.as_deref() == Some(name) {
            self.leader = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::conditions::Duration;
    use crate::combat::damage::DamageExpr;
    use crate::dice::ScriptedDice;

    fn sword() -> Weapon {
        Weapon::new("Schwert", DamageExpr::parse("1W6+1").unwrap()).with_mods(1, 0, 0)
    }

    #[test]
    fn test_attack_includes_ek_and_weapon() {
        let catalog = ConditionCatalog::new();
        let env = StatEnv::new(&catalog);
        let troop = Troop::new("Rot 1", "Rot").with_weapons(vec![sword()]);
        // 8 base + 1 weapon + 3 EK
        assert_eq!(troop.get(Stat::At, &env, &CombatContext::melee()), 12);
        assert_eq!(troop.get(Stat::Tp, &env, &CombatContext::melee()), 3);
    }

    #[test]
    fn test_ranged_parry_is_halved_rounding_up() {
        let catalog = ConditionCatalog::new();
        let env = StatEnv::new(&catalog);
        let troop = Troop::new("Rot 1", "Rot");
        assert_eq!(troop.get(Stat::Pa, &env, &CombatContext::melee()), 9);
        assert_eq!(troop.get(Stat::Pa, &env, &CombatContext::ranged()), 5);
    }

    #[test]
    fn test_stats_clamped_at_zero() {
        let catalog = ConditionCatalog::new();
        let env = StatEnv::new(&catalog);
        let mut troop = Troop::new("Rot 1", "Rot");
        troop
            .conditions
            .push(StatusEffect::new("f", "Fliehend", Duration::Indefinite));
        assert_eq!(troop.get(Stat::At, &env, &CombatContext::melee()), 0);
        assert_eq!(troop.get(Stat::EkAction, &env, &CombatContext::melee()), 0);
    }

    #[test]
    fn test_mounted_speed() {
        let catalog = ConditionCatalog::new();
        let env = StatEnv::new(&catalog);
        let rider = Troop::new("Reiter", "Rot").with_speed(4, 6, 2);
        let walker = Troop::new("Fuß", "Rot").with_speed(4, 6, 1);
        assert_eq!(rider.get(Stat::Gs, &env, &CombatContext::melee()), 10);
        assert_eq!(walker.get(Stat::Gs, &env, &CombatContext::melee()), 4);
    }

    #[test]
    fn test_parry_penalty_escalates() {
        let catalog = ConditionCatalog::new();
        let env = StatEnv::new(&catalog);
        let mut troop = Troop::new("Rot 1", "Rot").with_ek(4);
        let ctx = CombatContext::melee();
        // PA 10; second parry loses 6 - 4/2 = 4
        let mut dice = ScriptedDice::new([10, 7]);
        assert!(troop.roll(Stat::Pa, 0, &env, &ctx, &mut dice));
        assert!(!troop.roll(Stat::Pa, 0, &env, &ctx, &mut dice));
        assert_eq!(troop.parry_count, 2);
    }

    #[test]
    fn test_parry_penalty_rounds_against_defender() {
        let catalog = ConditionCatalog::new();
        let env = StatEnv::new(&catalog);
        let ctx = CombatContext::melee();
        // PA 9 at EK 3; second parry loses 6 - 3/2 = 4.5, so it needs 4 or less
        let mut troop = Troop::new("Rot 1", "Rot");
        let mut dice = ScriptedDice::new([9, 5]);
        assert!(troop.roll(Stat::Pa, 0, &env, &ctx, &mut dice));
        assert!(!troop.roll(Stat::Pa, 0, &env, &ctx, &mut dice));

        let mut troop = Troop::new("Rot 2", "Rot");
        let mut dice = ScriptedDice::new([9, 4]);
        assert!(troop.roll(Stat::Pa, 0, &env, &ctx, &mut dice));
        assert!(troop.roll(Stat::Pa, 0, &env, &ctx, &mut dice));
    }

    #[test]
    fn test_parry_auto_fails_against_missiles_without_shield() {
        let catalog = ConditionCatalog::new();
        let env = StatEnv::new(&catalog);
        let mut dice = ScriptedDice::repeating(1);
        let mut troop = Troop::new("Rot 1", "Rot");
        assert!(!troop.roll(Stat::Pa, 0, &env, &CombatContext::ranged(), &mut dice));

        let mut shielded = Troop::new("Rot 2", "Rot").shielded();
        assert!(shielded.roll(Stat::Pa, 0, &env, &CombatContext::ranged(), &mut dice));
    }

    #[test]
    fn test_attack_rolls_set_engagement_flags() {
        let catalog = ConditionCatalog::new();
        let env = StatEnv::new(&catalog);
        let mut dice = ScriptedDice::repeating(1);
        let mut troop = Troop::new("Rot 1", "Rot");

        troop.roll(Stat::At, 0, &env, &CombatContext::melee(), &mut dice);
        assert!(troop.in_melee);

        let ctx = CombatContext {
            rapid_fire: true,
            ..CombatContext::ranged()
        };
        troop.roll(Stat::Fk, 0, &env, &ctx, &mut dice);
        assert!(troop.in_range && troop.rapid_fire);
    }

    #[test]
    fn test_take_damage_subtracts_armor() {
        let catalog = ConditionCatalog::new();
        let env = StatEnv::new(&catalog);
        let mut dice = ScriptedDice::repeating(1);
        let mut sink: Vec<String> = Vec::new();
        let mut arb = Arbiter::new(&mut dice, &mut sink);

        let mut troop = Troop::new("Rot 1", "Rot").with_armor(2);
        assert_eq!(troop.take_damage(7, &env, &CombatContext::melee(), &mut arb), 5);
        assert_eq!(troop.health, 25);
        assert_eq!(troop.take_damage(1, &env, &CombatContext::melee(), &mut arb), 0);

        let true_hit = CombatContext {
            true_damage: true,
            ..CombatContext::melee()
        };
        assert_eq!(troop.take_damage(3, &env, &true_hit, &mut arb), 3);
    }

    #[test]
    fn test_skirmish_doubles_melee_and_halves_missiles() {
        let catalog = ConditionCatalog::new();
        let env = StatEnv::new(&catalog);
        let mut dice = ScriptedDice::repeating(1);
        let mut sink: Vec<String> = Vec::new();
        let mut arb = Arbiter::new(&mut dice, &mut sink);

        let mut troop = Troop::new("Plänkler", "Rot").with_armor(1).with_health(100);
        troop
            .conditions
            .push(StatusEffect::new("pl", "Plänkeln", Duration::Indefinite));

        assert_eq!(troop.take_damage(5, &env, &CombatContext::melee(), &mut arb), 9);
        assert_eq!(troop.take_damage(6, &env, &CombatContext::ranged(), &mut arb), 2);
    }

    #[test]
    fn test_low_health_conditions_toggle() {
        let catalog = ConditionCatalog::new();
        let env = StatEnv::new(&catalog);
        let mut dice = ScriptedDice::repeating(1);
        let mut sink: Vec<String> = Vec::new();
        let mut arb = Arbiter::new(&mut dice, &mut sink);
        let true_hit = CombatContext {
            true_damage: true,
            ..CombatContext::melee()
        };

        let mut troop = Troop::new("Rot 1", "Rot").with_health(40);
        troop.take_damage(21, &env, &true_hit, &mut arb);
        assert!(troop.has_condition("n"));
        assert!(!troop.has_condition("g"));

        troop.take_damage(10, &env, &true_hit, &mut arb);
        assert!(troop.has_condition("g"));
        assert!(!troop.has_condition("n"));
    }

    #[test]
    fn test_clear_reference() {
        let mut troop = Troop::new("Rot 1", "Rot");
        troop.melee_target = Some("Blau 1".into());
        troop.range_target = Some("Blau 2".into());
        troop.clear_reference("Blau 1");
        assert_eq!(troop.melee_target, None);
        assert_eq!(troop.range_target.as_deref(), Some("Blau 2"));
    }
}
