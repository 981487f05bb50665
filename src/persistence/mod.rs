//! Workspace snapshots and the gateway that stores them

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::combat::conditions::ConditionDef;
use crate::combat::weapons::Weapon;
use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::orchestrator::state::GameState;
use crate::orchestrator::undo::{HistoryEntry, UndoStack};
use crate::units::{Leader, Roster, Token, Troop};

const WORKSPACE_FILE: &str = "workspace.json";

/// Everything needed to resume a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
    pub config: GameConfig,
    pub gamestate: GameState,
    pub troops: Vec<Troop>,
    pub leaders: Vec<Leader>,
    pub tokens: Vec<Token>,
    /// Custom conditions only; built-ins are never persisted
    pub conditions: Vec<ConditionDef>,
    pub weapons: Vec<Weapon>,
    pub history: Vec<HistoryEntry>,
    pub undo_stack: UndoStack,
    pub log: Vec<String>,
}

impl Workspace {
    pub fn roster(&self) -> Roster {
        Roster {
            troops: self.troops.clone(),
            leaders: self.leaders.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

/// Loads and saves workspaces
pub trait PersistenceGateway {
    /// `None` when nothing has been saved yet
    fn load(&self) -> Result<Option<Workspace>>;
    fn save(&mut self, workspace: &Workspace) -> Result<()>;
}

/// Pretty-printed JSON in `<dir>/workspace.json`
#[derive(Debug, Clone)]
pub struct JsonFileGateway {
    dir: PathBuf,
}

impl JsonFileGateway {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(WORKSPACE_FILE)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PersistenceGateway for JsonFileGateway {
    fn load(&self) -> Result<Option<Workspace>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let workspace = serde_json::from_str(&content)?;
        tracing::info!(path = %path.display(), "workspace loaded");
        Ok(Some(workspace))
    }

    fn save(&mut self, workspace: &Workspace) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path();
        fs::write(&path, serde_json::to_string_pretty(workspace)?)?;
        tracing::info!(path = %path.display(), "workspace saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::conditions::{Duration, StatusEffect};
    use crate::combat::damage::DamageExpr;
    use crate::combat::modifiers::Modifiers;
    use crate::core::types::{Stat, UnitKind};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kriegsrat-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample() -> Workspace {
        let mut troop = Troop::new("Rot 1", "Rot");
        troop.health = 17;
        troop.melee_target = Some("Blau 1".into());
        troop.mods.at = 2;
        troop.conditions.push(StatusEffect::new("d", "Deckung", Duration::Rounds(2)));
        troop.immunities.push(StatusEffect::new("f", "Fliehend", Duration::Indefinite));
        let custom = ConditionDef::new("gift", "Vergiftet", Modifiers::from_pairs(&[(Stat::Au, -2)]))
            .with_damage(DamageExpr::parse("1W3").unwrap());

        Workspace {
            troops: vec![troop],
            leaders: vec![Leader::new("Hauptmann", "Rot")],
            tokens: vec![Token::new("Rot 1", UnitKind::Troop)],
            conditions: vec![custom],
            weapons: vec![Weapon::fist()],
            log: vec!["== Kampfphase ==".into()],
            ..Workspace::default()
        }
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let gateway = JsonFileGateway::new(scratch_dir("empty"));
        assert!(gateway.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_is_lossless() {
        let dir = scratch_dir("roundtrip");
        let mut gateway = JsonFileGateway::new(&dir);
        let workspace = sample();
        gateway.save(&workspace).unwrap();

        let loaded = gateway.load().unwrap().unwrap();
        assert_eq!(loaded, workspace);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_durations_persist_as_integers() {
        let json = serde_json::to_value(sample()).unwrap();
        let conditions = &json["troops"][0]["conditions"];
        assert_eq!(conditions[0]["duration"], 2);
        assert_eq!(json["troops"][0]["immunities"][0]["duration"], -1);
    }
}
