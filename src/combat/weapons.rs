//! Weapons carried by troops

use serde::{Deserialize, Serialize};

use crate::combat::damage::DamageExpr;
use crate::core::types::Stat;

/// A weapon; value type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    #[serde(default)]
    pub at_mod: i32,
    #[serde(default)]
    pub pa_mod: i32,
    #[serde(default)]
    pub fk_mod: i32,
    #[serde(default)]
    pub shield: bool,
    /// 1 is melee, anything above is ranged
    pub reach: u32,
    /// Rounds until the next shot after firing
    #[serde(default)]
    pub reload_turns: u32,
    pub damage: DamageExpr,
}

impl Weapon {
    pub fn new(name: impl Into<String>, damage: DamageExpr) -> Self {
        Self {
            name: name.into(),
            at_mod: 0,
            pa_mod: 0,
            fk_mod: 0,
            shield: false,
            reach: 1,
            reload_turns: 0,
            damage,
        }
    }

    /// Bare hands, used when a troop carries nothing
    pub fn fist() -> Self {
        Self::new("Faust", DamageExpr::parse("W6").unwrap_or_default())
    }

    pub fn with_mods(mut self, at: i32, pa: i32, fk: i32) -> Self {
        self.at_mod = at;
        self.pa_mod = pa;
        self.fk_mod = fk;
        self
    }

    pub fn with_shield(mut self) -> Self {
        self.shield = true;
        self
    }

    pub fn with_reach(mut self, reach: u32) -> Self {
        self.reach = reach.max(1);
        self
    }

    pub fn with_reload(mut self, turns: u32) -> Self {
        self.reload_turns = turns;
        self
    }

    pub fn is_ranged(&self) -> bool {
        self.reach > 1
    }

    /// Modifier this weapon adds to `stat`
    pub fn modifier(&self, stat: Stat) -> i32 {
        match stat {
            Stat::At => self.at_mod,
            Stat::Pa => self.pa_mod,
            Stat::Fk => self.fk_mod,
            _ => 0,
        }
    }
}
