pub mod config;
pub mod error;
pub mod types;

pub use config::GameConfig;
pub use error::{KriegsratError, Result};
pub use types::{Stat, UnitKind};
