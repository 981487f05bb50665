//! Kriegsrat - Game master assistant for round-based tabletop wargames
//!
//! Tracks troops and leaders through maneuver and action phases and resolves
//! the combat rules. All randomness goes through [`dice::DiceRoller`], all
//! operator-facing text through [`bus::notify::NotificationSink`].

pub mod abilities;
pub mod bus;
pub mod combat;
pub mod core;
pub mod dice;
pub mod orchestrator;
pub mod persistence;
pub mod units;
