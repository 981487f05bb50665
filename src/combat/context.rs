//! Situational flags for a single roll or hit

/// Describes the attack a stat lookup, roll or hit belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombatContext {
    /// Missile attack
    pub ranged: bool,
    /// Mounted lance charge
    pub lance: bool,
    /// Attacker is a big unit
    pub attacker_big: bool,
    /// Ignore armor
    pub true_damage: bool,
    /// Attacker is sallying out
    pub attacker_sally: bool,
    /// Second volley in the same round
    pub rapid_fire: bool,
    /// Attack from the flank
    pub flank: bool,
}

impl CombatContext {
    pub fn melee() -> Self {
        Self::default()
    }

    pub fn ranged() -> Self {
        Self {
            ranged: true,
            ..Self::default()
        }
    }
}
