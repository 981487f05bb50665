//! Combat units and the roster they live in

pub mod arbiter;
pub mod battlefield;
pub mod leader;
pub mod status;
pub mod troop;

pub use arbiter::Arbiter;
pub use battlefield::{Battlefield, Roster, Token};
pub use leader::{Leader, LeaderAction};
pub use status::MoraleOutcome;
pub use troop::{StatEnv, Troop};
