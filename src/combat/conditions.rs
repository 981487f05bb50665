//! Condition catalog and timed status effects
//!
//! Built-in conditions are fixed. Custom conditions are authored by the
//! operator and persisted with the workspace. Keys are unique across both
//! sets.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::combat::constants::*;
use crate::combat::context::CombatContext;
use crate::combat::damage::DamageExpr;
use crate::combat::modifiers::Modifiers;
use crate::core::error::{KriegsratError, Result};
use crate::core::types::Stat;
use crate::dice::DiceRoller;

/// Built-in condition keys
pub mod keys {
    pub const COVER: &str = "d";
    pub const SHOCK: &str = "x";
    pub const UNDER_FIRE: &str = "u";
    pub const WINDED: &str = "a";
    pub const EXHAUSTED: &str = "e";
    pub const SEVERELY_EXHAUSTED: &str = "s";
    pub const DISTRACTED: &str = "l";
    pub const LOW_HEALTH: &str = "n";
    pub const CRITICAL_HEALTH: &str = "g";
    pub const FLEEING: &str = "f";
    pub const BURNING: &str = "b";

    pub const SHIELD_WALL: &str = "sw";
    pub const PIKE_WALL: &str = "pw";
    pub const SKIRMISH: &str = "pl";
    pub const SALLY: &str = "af";

    /// At most one stance at a time
    pub const STANCES: [&str; 4] = [SHIELD_WALL, PIKE_WALL, SKIRMISH, SALLY];
    /// Exhaustion ladder, mildest first
    pub const EXHAUSTION_TIERS: [&str; 3] = [WINDED, EXHAUSTED, SEVERELY_EXHAUSTED];
    pub const HEALTH_TIERS: [&str; 2] = [LOW_HEALTH, CRITICAL_HEALTH];

    /// Keys that may not coexist with `key` on one unit
    pub fn exclusive_with(key: &str) -> &'static [&'static str] {
        if STANCES.contains(&key) {
            &STANCES
        } else if EXHAUSTION_TIERS.contains(&key) {
            &EXHAUSTION_TIERS
        } else if HEALTH_TIERS.contains(&key) {
            &HEALTH_TIERS
        } else {
            &[]
        }
    }
}

/// How long a condition or immunity lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Duration {
    Indefinite,
    Rounds(u32),
}

impl Duration {
    /// At least one round
    pub fn rounds(n: u32) -> Self {
        Duration::Rounds(n.max(1))
    }

    pub fn is_indefinite(&self) -> bool {
        matches!(self, Duration::Indefinite)
    }

    /// Count one round down; returns true once expired
    pub fn tick(&mut self) -> bool {
        match self {
            Duration::Indefinite => false,
            Duration::Rounds(n) => {
                *n = n.saturating_sub(1);
                *n == 0
            }
        }
    }

    /// Whether `self` outlasts `current`
    ///
    /// Indefinite beats any finite duration; finite only beats a strictly
    /// shorter finite one.
    pub fn extends(&self, current: &Duration) -> bool {
        match (current, self) {
            (Duration::Indefinite, _) => false,
            (Duration::Rounds(_), Duration::Indefinite) => true,
            (Duration::Rounds(old), Duration::Rounds(new)) => new > old,
        }
    }
}

impl TryFrom<i32> for Duration {
    type Error = KriegsratError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            -1 => Ok(Duration::Indefinite),
            n if n > 0 => Ok(Duration::Rounds(n as u32)),
            n => Err(KriegsratError::InvalidDuration(n)),
        }
    }
}

impl From<Duration> for i32 {
    fn from(value: Duration) -> Self {
        match value {
            Duration::Indefinite => -1,
            Duration::Rounds(n) => n as i32,
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Duration::Indefinite => write!(f, "unbegrenzt"),
            Duration::Rounds(n) => write!(f, "{} Runde(n)", n),
        }
    }
}

/// An active condition or immunity on a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub key: String,
    pub name: String,
    pub duration: Duration,
}

impl StatusEffect {
    pub fn new(key: impl Into<String>, name: impl Into<String>, duration: Duration) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            duration,
        }
    }
}

/// Definition of a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDef {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub mods: Modifiers,
    /// Damage dealt at every round end while active
    #[serde(default)]
    pub damage: Option<DamageExpr>,
}

impl ConditionDef {
    pub fn new(key: impl Into<String>, name: impl Into<String>, mods: Modifiers) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            mods,
            damage: None,
        }
    }

    pub fn with_damage(mut self, damage: DamageExpr) -> Self {
        self.damage = Some(damage);
        self
    }
}

fn builtin(key: &str, name: &str, pairs: &[(Stat, i32)]) -> ConditionDef {
    ConditionDef::new(key, name, Modifiers::from_pairs(pairs))
}

fn builtin_conditions() -> Vec<ConditionDef> {
    use Stat::*;
    vec![
        builtin(keys::COVER, "Deckung", &[(Pa, 2)]),
        builtin(keys::SHOCK, "Schock", &[(Ek, -1), (Mo, -2)]),
        builtin(
            keys::UNDER_FIRE,
            "Unter Feuer",
            &[(At, -2), (Pa, -2), (Fk, -4), (Mo, -1), (Gs, -1)],
        ),
        builtin(keys::WINDED, "Außer Atem", &[(At, -2), (Pa, -2), (Fk, -2), (Gs, -1)]),
        builtin(
            keys::EXHAUSTED,
            "Erschöpft",
            &[(At, -4), (Pa, -4), (Fk, -4), (Mo, -2), (Gs, -1), (EkAction, -1)],
        ),
        builtin(
            keys::SEVERELY_EXHAUSTED,
            "Schwer Erschöpft",
            &[(At, -6), (Pa, -6), (Fk, -6), (Mo, -4), (Gs, -2), (EkAction, -3)],
        ),
        builtin(keys::DISTRACTED, "Abgelenkt", &[(Pa, -3)]),
        builtin(keys::LOW_HEALTH, "Niedrige LE", &[(Pa, -2), (Tp, -1), (Mo, -2), (Gs, 1)]),
        builtin(
            keys::CRITICAL_HEALTH,
            "Geringe LE",
            &[(Ek, -1), (Pa, -2), (Tp, -1), (Mo, -4), (Gs, 1), (EkAction, -1)],
        ),
        builtin(
            keys::FLEEING,
            "Fliehend",
            &[(At, -999), (Pa, -999), (Fk, -999), (Gs, 3), (EkAction, -999)],
        ),
        builtin(keys::BURNING, "Brennend", &[(Mo, -1)])
            .with_damage(DamageExpr::parse("W6").unwrap_or_default()),
        builtin(
            keys::SHIELD_WALL,
            "Schildwall",
            &[(At, SHIELD_WALL_AT), (Fk, SHIELD_WALL_FK), (Pa, SHIELD_WALL_PA)],
        ),
        builtin(keys::PIKE_WALL, "Pikenwall", &[(At, PIKE_WALL_AT), (Pa, PIKE_WALL_PA)]),
        builtin(keys::SKIRMISH, "Plänkeln", &[(Gs, SKIRMISH_GS)]),
        builtin(keys::SALLY, "Ausfall", &[(At, SALLY_AT), (Pa, SALLY_PA)]),
    ]
}

/// Built-in plus custom condition definitions
#[derive(Debug, Clone)]
pub struct ConditionCatalog {
    builtin: Vec<ConditionDef>,
    custom: Vec<ConditionDef>,
}

impl Default for ConditionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionCatalog {
    pub fn new() -> Self {
        Self {
            builtin: builtin_conditions(),
            custom: Vec::new(),
        }
    }

    /// Catalog with previously persisted custom conditions
    pub fn with_custom(custom: Vec<ConditionDef>) -> Result<Self> {
        let mut catalog = Self::new();
        for def in custom {
            catalog.add_custom(def)?;
        }
        Ok(catalog)
    }

    pub fn get(&self, key: &str) -> Option<&ConditionDef> {
        self.builtin
            .iter()
            .chain(self.custom.iter())
            .find(|def| def.key == key)
    }

    pub fn name(&self, key: &str) -> Option<&str> {
        self.get(key).map(|def| def.name.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.builtin
            .iter()
            .chain(self.custom.iter())
            .map(|def| def.key.as_str())
    }

    pub fn custom(&self) -> &[ConditionDef] {
        &self.custom
    }

    pub fn add_custom(&mut self, def: ConditionDef) -> Result<()> {
        if def.key.is_empty() || self.get(&def.key).is_some() {
            return Err(KriegsratError::DuplicateCondition(def.key));
        }
        self.custom.push(def);
        Ok(())
    }

    /// Built-ins cannot be removed
    pub fn remove_custom(&mut self, key: &str) -> bool {
        let before = self.custom.len();
        self.custom.retain(|def| def.key != key);
        self.custom.len() != before
    }

    /// Summed modifiers of the active keys
    ///
    /// Cover suppresses under-fire for this computation only. Unknown keys
    /// contribute nothing.
    pub fn resolve_modifiers<'a, I>(&self, active: I, ctx: &CombatContext) -> Modifiers
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut active: Vec<&str> = active.into_iter().collect();
        if active.contains(&keys::COVER) {
            active.retain(|key| *key != keys::UNDER_FIRE);
        }

        let mut total = Modifiers::default();
        for key in active {
            if let Some(def) = self.get(key) {
                total += def.mods;
                if key == keys::COVER && ctx.ranged {
                    total.pa += COVER_RANGED_PA;
                }
            }
        }
        total
    }

    pub fn modifier<'a, I>(&self, active: I, stat: Stat, ctx: &CombatContext) -> i32
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.resolve_modifiers(active, ctx).get(stat)
    }

    /// Rolled damage-over-time of the active keys
    pub fn damage_bonus<'a, I>(&self, active: I, dice: &mut dyn DiceRoller) -> i32
    where
        I: IntoIterator<Item = &'a str>,
    {
        active
            .into_iter()
            .filter_map(|key| self.get(key))
            .filter_map(|def| def.damage.as_ref())
            .map(|damage| damage.evaluate(dice))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;

    #[test]
    fn test_cover_suppresses_under_fire() {
        let catalog = ConditionCatalog::new();
        let melee = CombatContext::melee();
        assert_eq!(catalog.modifier(["u"], Stat::Pa, &melee), -2);
        assert_eq!(catalog.modifier(["u", "d"], Stat::Pa, &melee), 2);
        assert_eq!(catalog.modifier(["d", "u"], Stat::Fk, &melee), 0);
    }

    #[test]
    fn test_cover_bonus_against_missiles() {
        let catalog = ConditionCatalog::new();
        assert_eq!(catalog.modifier(["d"], Stat::Pa, &CombatContext::ranged()), 4);
    }

    #[test]
    fn test_unknown_keys_contribute_nothing() {
        let catalog = ConditionCatalog::new();
        let mods = catalog.resolve_modifiers(["zz", "?"], &CombatContext::melee());
        assert!(mods.is_zero());
    }

    #[test]
    fn test_custom_keys_must_be_unique() {
        let mut catalog = ConditionCatalog::new();
        let blessed = ConditionDef::new("seg", "Gesegnet", Modifiers::from_pairs(&[(Stat::Mo, 2)]));
        catalog.add_custom(blessed.clone()).unwrap();
        assert!(catalog.add_custom(blessed).is_err());
        assert!(catalog
            .add_custom(ConditionDef::new("d", "Doppelt", Modifiers::default()))
            .is_err());
        assert_eq!(catalog.modifier(["seg"], Stat::Mo, &CombatContext::melee()), 2);
    }

    #[test]
    fn test_damage_bonus_rolls_burning() {
        let catalog = ConditionCatalog::new();
        let mut dice = ScriptedDice::new([4]);
        assert_eq!(catalog.damage_bonus(["b", "d"], &mut dice), 4);
    }

    #[test]
    fn test_duration_round_trip_encoding() {
        assert_eq!(Duration::try_from(-1).unwrap(), Duration::Indefinite);
        assert_eq!(Duration::try_from(3).unwrap(), Duration::Rounds(3));
        assert!(Duration::try_from(0).is_err());
        assert!(Duration::try_from(-4).is_err());
        assert_eq!(i32::from(Duration::Indefinite), -1);
    }

    #[test]
    fn test_duration_tick_and_extend() {
        let mut d = Duration::rounds(2);
        assert!(!d.tick());
        assert!(d.tick());

        let mut forever = Duration::Indefinite;
        assert!(!forever.tick());

        assert!(Duration::Indefinite.extends(&Duration::Rounds(5)));
        assert!(!Duration::Rounds(5).extends(&Duration::Indefinite));
        assert!(Duration::Rounds(3).extends(&Duration::Rounds(2)));
        assert!(!Duration::Rounds(2).extends(&Duration::Rounds(2)));
    }

    #[test]
    fn test_exclusive_groups() {
        assert!(keys::exclusive_with("pw").contains(&"sw"));
        assert!(keys::exclusive_with("a").contains(&"s"));
        assert!(keys::exclusive_with("g").contains(&"n"));
        assert!(keys::exclusive_with("d").is_empty());
    }
}
