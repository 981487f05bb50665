//! Ability catalog
//!
//! Every maneuver, action, free action and leader order implements `Rule`:
//! an eligibility check, a check against chosen targets, a target selection
//! requirement and a resolution. Resolution mutates the units it touches and
//! returns an `Outcome` for the log.
//!
//! Resolutions roll dice. Running one twice is two separate events.

pub mod actions;
pub mod combat;
pub mod free_actions;
pub mod leader_actions;
pub mod maneuvers;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::{KriegsratError, Result};
use crate::units::{Arbiter, Battlefield, LeaderAction};

pub use actions::Action;
pub use free_actions::FreeAction;
pub use maneuvers::Maneuver;

/// Target selection requirement, computed per invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub needs_selection: bool,
    pub min: usize,
    pub max: usize,
    pub prompt: String,
}

impl Selection {
    pub fn none() -> Self {
        Self {
            needs_selection: false,
            min: 0,
            max: 0,
            prompt: String::new(),
        }
    }

    pub fn targets(min: usize, max: usize, prompt: impl Into<String>) -> Self {
        Self {
            needs_selection: true,
            min,
            max: max.max(min),
            prompt: prompt.into(),
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        !self.needs_selection || (self.min..=self.max).contains(&count)
    }
}

/// What a resolution reports back
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub log: Vec<String>,
    pub short_log: Vec<String>,
    /// Hold the turn until the operator continues
    pub pause: bool,
    pub display: Option<String>,
}

impl Outcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl Into<String>) {
        self.log.push(text.into());
    }

    pub fn short(&mut self, text: impl Into<String>) {
        self.short_log.push(text.into());
    }

    /// Pause with an operator prompt
    pub fn pause_with(&mut self, display: impl Into<String>) {
        self.pause = true;
        self.display = Some(display.into());
    }

    pub(crate) fn missing(source: &str) -> Self {
        let mut outcome = Self::new();
        outcome.line(format!("Einheit nicht gefunden: {}!", source));
        outcome
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    Maneuver,
    Action,
    FreeAction,
    LeaderAction,
}

/// The three-part ability contract
pub trait Rule {
    fn name(&self) -> &'static str;

    /// Whether `source` can use the ability at all
    fn check(&self, bf: &Battlefield, source: &str) -> bool;

    /// Whether `source` can use it on `targets` right now
    fn check_targeted(&self, bf: &Battlefield, source: &str, targets: &[String]) -> bool {
        self.selection(bf, source).accepts(targets.len())
    }

    fn selection(&self, _bf: &Battlefield, _source: &str) -> Selection {
        Selection::none()
    }

    /// Resolve against the roster
    ///
    /// Mutates `source` and `targets` in `bf`.
    fn perform(
        &self,
        bf: &mut Battlefield,
        source: &str,
        targets: &[String],
        arb: &mut Arbiter,
    ) -> Outcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ability {
    Maneuver(Maneuver),
    Action(Action),
    Free(FreeAction),
    Leader(LeaderAction),
}

impl Ability {
    pub fn all() -> Vec<Ability> {
        let maneuvers = Maneuver::all().iter().copied().map(Ability::Maneuver);
        let actions = Action::all().iter().copied().map(Ability::Action);
        let free = FreeAction::all().iter().copied().map(Ability::Free);
        let leader = LeaderAction::all().iter().copied().map(Ability::Leader);
        maneuvers.chain(actions).chain(free).chain(leader).collect()
    }

    pub fn kind(&self) -> AbilityKind {
        match self {
            Ability::Maneuver(_) => AbilityKind::Maneuver,
            Ability::Action(_) => AbilityKind::Action,
            Ability::Free(_) => AbilityKind::FreeAction,
            Ability::Leader(_) => AbilityKind::LeaderAction,
        }
    }

    fn rule(&self) -> &dyn Rule {
        match self {
            Ability::Maneuver(m) => m,
            Ability::Action(a) => a,
            Ability::Free(f) => f,
            Ability::Leader(l) => l,
        }
    }

    pub fn from_name(name: &str) -> Option<Ability> {
        Ability::all().into_iter().find(|ability| ability.name() == name)
    }
}

impl Rule for Ability {
    fn name(&self) -> &'static str {
        self.rule().name()
    }

    fn check(&self, bf: &Battlefield, source: &str) -> bool {
        self.rule().check(bf, source)
    }

    fn check_targeted(&self, bf: &Battlefield, source: &str, targets: &[String]) -> bool {
        self.rule().check_targeted(bf, source, targets)
    }

    fn selection(&self, bf: &Battlefield, source: &str) -> Selection {
        self.rule().selection(bf, source)
    }

    fn perform(
        &self,
        bf: &mut Battlefield,
        source: &str,
        targets: &[String],
        arb: &mut Arbiter,
    ) -> Outcome {
        tracing::debug!(ability = self.name(), source, ?targets, "resolving ability");
        self.rule().perform(bf, source, targets, arb)
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for Ability {
    type Error = KriegsratError;

    fn try_from(value: String) -> Result<Self> {
        Ability::from_name(&value).ok_or(KriegsratError::UnknownAbility(value))
    }
}

impl From<Ability> for String {
    fn from(value: Ability) -> Self {
        value.name().to_string()
    }
}

/// Name-keyed lookup over all abilities
#[derive(Debug, Clone)]
pub struct AbilityRegistry {
    by_name: AHashMap<&'static str, Ability>,
    order: Vec<Ability>,
}

impl AbilityRegistry {
    pub fn new() -> Result<Self> {
        Self::from_abilities(Ability::all())
    }

    /// Build a registry, rejecting duplicate names
    pub fn from_abilities(abilities: impl IntoIterator<Item = Ability>) -> Result<Self> {
        let mut by_name = AHashMap::new();
        let mut order = Vec::new();
        for ability in abilities {
            if by_name.insert(ability.name(), ability).is_some() {
                return Err(KriegsratError::DuplicateAbility(ability.name().to_string()));
            }
            order.push(ability);
        }
        Ok(Self { by_name, order })
    }

    pub fn get(&self, name: &str) -> Result<Ability> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| KriegsratError::UnknownAbility(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Abilities of the given kinds that `source` may use, in catalog order
    pub fn menu(&self, bf: &Battlefield, source: &str, kinds: &[AbilityKind]) -> Vec<Ability> {
        self.order
            .iter()
            .copied()
            .filter(|ability| kinds.contains(&ability.kind()))
            .filter(|ability| ability.check(bf, source))
            .collect()
    }
}

/// Fallback action for a troop with unused action slots
///
/// Keeps fighting the last melee target, else keeps shooting at the last
/// ranged target, else holds.
pub fn default_action(bf: &Battlefield, source: &str) -> (Ability, Vec<String>) {
    let alive = |name: &String| bf.troop(name).is_some_and(|t| t.is_alive());
    let Some(troop) = bf.troop(source) else {
        return (Ability::Action(Action::Hold), Vec::new());
    };

    if let Some(target) = troop.melee_target.as_ref().filter(|t| alive(t)) {
        let attack = Ability::Action(Action::Attack);
        if attack.check(bf, source) {
            return (attack, vec![target.clone()]);
        }
    }
    if let Some(target) = troop.range_target.as_ref().filter(|t| alive(t)) {
        let volley = Ability::Action(Action::Volley);
        if volley.check(bf, source) {
            return (volley, vec![target.clone()]);
        }
    }
    (Ability::Action(Action::Hold), Vec::new())
}
