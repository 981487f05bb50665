//! Dice and ability checks
//!
//! All randomness goes through `DiceRoller` so the rules engine can run
//! against a seeded generator in play and a scripted one in tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Source of die rolls
pub trait DiceRoller {
    /// Roll a single die with faces `1..=sides`
    fn roll_die(&mut self, sides: u32) -> u32;

    /// Sum of `count` dice with `sides` faces
    fn roll(&mut self, sides: u32, count: u32) -> i32 {
        (0..count).map(|_| self.roll_die(sides) as i32).sum()
    }

    /// Roll-under check on a d20
    fn check(&mut self, target: i32) -> bool {
        self.roll(20, 1) <= target
    }

    /// Three d20 against three attributes, overshoot paid from `skill`
    fn talent_check(&mut self, skill: i32, attributes: [i32; 3]) -> bool {
        let mut remaining = skill;
        for attribute in attributes {
            let roll = self.roll(20, 1);
            if roll > attribute {
                remaining -= roll - attribute;
            }
        }
        remaining >= 0
    }
}

/// Deterministic dice backed by ChaCha8
pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl DiceRoller for SeededDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        self.rng.gen_range(1..=sides)
    }
}

/// Dice that replay a fixed script of faces
///
/// Faces are clamped into `1..=sides`. Once the script runs dry every roll
/// returns the fallback face.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    faces: VecDeque<u32>,
    fallback: u32,
}

impl ScriptedDice {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
            fallback: 1,
        }
    }

    /// Every roll shows `face`
    pub fn repeating(face: u32) -> Self {
        Self {
            faces: VecDeque::new(),
            fallback: face,
        }
    }

    pub fn with_fallback(mut self, face: u32) -> Self {
        self.fallback = face;
        self
    }

    pub fn push(&mut self, face: u32) {
        self.faces.push_back(face);
    }

    /// Faces not yet consumed
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceRoller for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        let face = self.faces.pop_front().unwrap_or(self.fallback);
        face.clamp(1, sides)
    }
}
