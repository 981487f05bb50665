pub mod conditions;
pub mod constants;
pub mod context;
pub mod damage;
pub mod modifiers;
pub mod weapons;

pub use conditions::{keys, ConditionCatalog, ConditionDef, Duration, StatusEffect};
pub use context::CombatContext;
pub use damage::DamageExpr;
pub use modifiers::Modifiers;
pub use weapons::Weapon;
