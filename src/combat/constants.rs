//! Rule constants - all tunable values in one place
//!
//! Modifiers are ADDITIVE on the d20 target value.

// Round maintenance
pub const RECOVERY_THRESHOLD: i32 = 10;
pub const MORALE_STREAK_INTERVAL: u32 = 3;

// Exhaustion
pub const REST_RECOVERY: i32 = 2;
pub const MARCH_EXHAUSTION: i32 = 1;
pub const CHARGE_EXHAUSTION: i32 = 2;

// Stances (carried by the stance conditions)
pub const SHIELD_WALL_AT: i32 = -2;
pub const SHIELD_WALL_FK: i32 = -4;
pub const SHIELD_WALL_PA: i32 = 4;
pub const PIKE_WALL_AT: i32 = 1;
pub const PIKE_WALL_PA: i32 = 2;
pub const SKIRMISH_GS: i32 = 2;
pub const SALLY_AT: i32 = 2;
pub const SALLY_PA: i32 = -2;

// Cover against missiles, on top of the regular cover bonus
pub const COVER_RANGED_PA: i32 = 2;

// Parry penalty per earlier parry this round: parries * (MULTI_PARRY_BASE - EK / 2)
pub const MULTI_PARRY_BASE: i32 = 6;

// Attack modifiers (subtracted from the target value when positive)
pub const FLANK_ADVANTAGE: i32 = 2;
pub const COUNTER_PENALTY: i32 = 2;
pub const RAPID_FIRE_PENALTY: i32 = 2;
pub const BARRAGE_PENALTY: i32 = 2;
pub const CHARGE_BONUS: i32 = 2;
pub const INSULT_PENALTY: i32 = 4;

// Health tiers (fraction of max health, in percent)
pub const LOW_HEALTH_PERCENT: i32 = 50;
pub const CRITICAL_HEALTH_PERCENT: i32 = 25;

// A ranged hit of at least a tenth of max health forces a morale probe
pub const HEAVY_RANGED_DIVISOR: i32 = 10;

// Shock lasts this many rounds
pub const SHOCK_ROUNDS: u32 = 1;
pub const BARRAGE_ROUNDS: u32 = 1;
pub const RALLY_IMMUNITY_ROUNDS: u32 = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_tiers_ordered() {
        assert!(CRITICAL_HEALTH_PERCENT < LOW_HEALTH_PERCENT);
        assert!(LOW_HEALTH_PERCENT < 100);
    }

    #[test]
    fn test_shield_wall_trades_attack_for_parry() {
        assert!(SHIELD_WALL_AT < 0 && SHIELD_WALL_FK < 0);
        assert!(SHIELD_WALL_PA > 0);
    }
}
