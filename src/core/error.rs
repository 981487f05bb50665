use thiserror::Error;

#[derive(Error, Debug)]
pub enum KriegsratError {
    #[error("Unit not found: {0}")]
    UnitNotFound(String),

    #[error("Unknown ability: {0}")]
    UnknownAbility(String),

    #[error("Duplicate ability name: {0}")]
    DuplicateAbility(String),

    #[error("Duplicate condition key: {0}")]
    DuplicateCondition(String),

    #[error("Duplicate unit name: {0}")]
    DuplicateUnit(String),

    #[error("Invalid damage expression '{0}'")]
    InvalidDamageExpression(String),

    #[error("Invalid duration {0}: expected -1 or a positive round count")]
    InvalidDuration(i32),

    #[error("Unknown weapon: {0}")]
    UnknownWeapon(String),

    #[error("Unknown stat: {0}")]
    UnknownStat(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, KriegsratError>;
