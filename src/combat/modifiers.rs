//! Per-stat modifier vector
//!
//! Used for condition effects, leader bonuses and the per-round accumulator
//! on each troop.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::core::types::Stat;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    #[serde(rename = "EK")]
    pub ek: i32,
    #[serde(rename = "AT")]
    pub at: i32,
    #[serde(rename = "PA")]
    pub pa: i32,
    #[serde(rename = "FK")]
    pub fk: i32,
    #[serde(rename = "TP")]
    pub tp: i32,
    #[serde(rename = "MO")]
    pub mo: i32,
    #[serde(rename = "RS")]
    pub rs: i32,
    #[serde(rename = "GS")]
    pub gs: i32,
    #[serde(rename = "AU")]
    pub au: i32,
    #[serde(rename = "actionCount")]
    pub action_count: i32,
    #[serde(rename = "maneuverCount")]
    pub maneuver_count: i32,
    #[serde(rename = "EKAction")]
    pub ek_action: i32,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(stat, value)` pairs
    pub fn from_pairs(pairs: &[(Stat, i32)]) -> Self {
        let mut mods = Self::default();
        for &(stat, value) in pairs {
            mods.add(stat, value);
        }
        mods
    }

    fn slot_mut(&mut self, stat: Stat) -> &mut i32 {
        match stat {
            Stat::Ek => &mut self.ek,
            Stat::At => &mut self.at,
            Stat::Pa => &mut self.pa,
            Stat::Fk => &mut self.fk,
            Stat::Tp => &mut self.tp,
            Stat::Mo => &mut self.mo,
            Stat::Rs => &mut self.rs,
            Stat::Gs => &mut self.gs,
            Stat::Au => &mut self.au,
            Stat::ActionCount => &mut self.action_count,
            Stat::ManeuverCount => &mut self.maneuver_count,
            Stat::EkAction => &mut self.ek_action,
        }
    }

    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Ek => self.ek,
            Stat::At => self.at,
            Stat::Pa => self.pa,
            Stat::Fk => self.fk,
            Stat::Tp => self.tp,
            Stat::Mo => self.mo,
            Stat::Rs => self.rs,
            Stat::Gs => self.gs,
            Stat::Au => self.au,
            Stat::ActionCount => self.action_count,
            Stat::ManeuverCount => self.maneuver_count,
            Stat::EkAction => self.ek_action,
        }
    }

    pub fn set(&mut self, stat: Stat, value: i32) {
        *self.slot_mut(stat) = value;
    }

    pub fn add(&mut self, stat: Stat, value: i32) {
        *self.slot_mut(stat) += value;
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Move every value one step toward zero
    ///
    /// TP and the action-granting slots do not linger and are cleared.
    pub fn relax(&mut self) {
        for &stat in Stat::all() {
            let slot = self.slot_mut(stat);
            *slot -= slot.signum();
        }
        self.tp = 0;
        self.action_count = 0;
        self.maneuver_count = 0;
        self.ek_action = 0;
    }
}

impl AddAssign for Modifiers {
    fn add_assign(&mut self, rhs: Self) {
        for &stat in Stat::all() {
            self.add(stat, rhs.get(stat));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relax_moves_toward_zero() {
        let mut mods = Modifiers::from_pairs(&[(Stat::At, 3), (Stat::Pa, -2)]);
        mods.relax();
        assert_eq!((mods.at, mods.pa), (2, -1));
        mods.relax();
        assert_eq!((mods.at, mods.pa), (1, 0));
        mods.relax();
        mods.relax();
        assert_eq!((mods.at, mods.pa), (0, 0));
    }

    #[test]
    fn test_relax_clears_tp_and_counts() {
        let mut mods = Modifiers::from_pairs(&[
            (Stat::Tp, 5),
            (Stat::ActionCount, 2),
            (Stat::ManeuverCount, 1),
        ]);
        mods.relax();
        assert!(mods.is_zero());
    }

    #[test]
    fn test_add_assign_sums_slots() {
        let mut a = Modifiers::from_pairs(&[(Stat::Mo, -2)]);
        a += Modifiers::from_pairs(&[(Stat::Mo, -1), (Stat::Gs, 3)]);
        assert_eq!(a.get(Stat::Mo), -3);
        assert_eq!(a.get(Stat::Gs), 3);
    }

    #[test]
    fn test_serde_uses_stat_codes() {
        let mods = Modifiers::from_pairs(&[(Stat::Pa, 2)]);
        let json = serde_json::to_value(mods).unwrap();
        assert_eq!(json["PA"], 2);
        let partial: Modifiers = serde_json::from_str(r#"{"AT": -1}"#).unwrap();
        assert_eq!(partial.at, -1);
        assert_eq!(partial.pa, 0);
    }
}
