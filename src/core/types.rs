//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::KriegsratError;

/// Stats a unit exposes through derived-stat computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    /// Combat competence, basis of most other stats
    Ek,
    /// Melee attack
    At,
    /// Parry
    Pa,
    /// Ranged attack
    Fk,
    /// Damage bonus
    Tp,
    /// Morale
    Mo,
    /// Armor
    Rs,
    /// Speed
    Gs,
    /// Stamina
    Au,
    ActionCount,
    ManeuverCount,
    /// Gate for competence-limited actions
    EkAction,
}

impl Stat {
    pub fn all() -> &'static [Stat] {
        &[
            Stat::Ek,
            Stat::At,
            Stat::Pa,
            Stat::Fk,
            Stat::Tp,
            Stat::Mo,
            Stat::Rs,
            Stat::Gs,
            Stat::Au,
            Stat::ActionCount,
            Stat::ManeuverCount,
            Stat::EkAction,
        ]
    }

    pub fn code(&self) -> &'static str {
        match self {
            Stat::Ek => "EK",
            Stat::At => "AT",
            Stat::Pa => "PA",
            Stat::Fk => "FK",
            Stat::Tp => "TP",
            Stat::Mo => "MO",
            Stat::Rs => "RS",
            Stat::Gs => "GS",
            Stat::Au => "AU",
            Stat::ActionCount => "actionCount",
            Stat::ManeuverCount => "maneuverCount",
            Stat::EkAction => "EKAction",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Stat {
    type Err = KriegsratError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stat::all()
            .iter()
            .copied()
            .find(|stat| stat.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| KriegsratError::UnknownStat(s.to_string()))
    }
}

/// Which roster table a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Troop,
    Leader,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_codes_parse_back() {
        for stat in Stat::all() {
            assert_eq!(stat.code().parse::<Stat>().unwrap(), *stat);
        }
    }

    #[test]
    fn test_stat_parse_is_case_insensitive() {
        assert_eq!("pa".parse::<Stat>().unwrap(), Stat::Pa);
        assert_eq!("ekaction".parse::<Stat>().unwrap(), Stat::EkAction);
        assert!("XX".parse::<Stat>().is_err());
    }
}
