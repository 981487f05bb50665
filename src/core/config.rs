//! Game configuration with documented defaults
//!
//! Loaded from a TOML file by the console and persisted with every workspace
//! snapshot.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{KriegsratError, Result};

/// Configuration for a game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Folder the workspace snapshot is written to
    pub workspace: PathBuf,

    /// Parties in queue order
    ///
    /// During execution the per-party action lists are merged round-robin
    /// in exactly this order.
    pub parties: Vec<String>,

    /// Number of consecutive actions a party executes before the next
    /// party takes over
    ///
    /// At 3, two parties alternate in blocks of three actions.
    pub action_block_size: usize,

    /// Pause between two autoplayed actions (milliseconds)
    ///
    /// Gives the operator time to read the log. Not used by the core state
    /// machine, only by drivers that call `run_queue` step by step.
    pub action_delay_ms: u64,

    /// Seed for the dice; entropy is used when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("workspace"),
            parties: vec!["Rot".to_string(), "Blau".to_string()],
            action_block_size: 3,
            action_delay_ms: 1000,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Config with the given parties and defaults otherwise
    pub fn with_parties<I, S>(parties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parties: parties.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Load a config from a TOML file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: GameConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.parties.is_empty() {
            return Err(KriegsratError::InvalidConfig(
                "at least one party is required".into(),
            ));
        }

        for (i, party) in self.parties.iter().enumerate() {
            if party.is_empty() {
                return Err(KriegsratError::InvalidConfig("party names must not be empty".into()));
            }
            if self.parties[..i].contains(party) {
                return Err(KriegsratError::InvalidConfig(format!(
                    "party '{}' is listed twice",
                    party
                )));
            }
        }

        if self.action_block_size == 0 {
            return Err(KriegsratError::InvalidConfig(
                "action_block_size must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
