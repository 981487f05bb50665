//! Damage notation ("2W6+3")
//!
//! An expression is a signed sum of dice terms (`2W6`) and flat terms (`3`).
//! Flat terms are stored as dice with one face so evaluation is uniform.

use nom::{
    character::complete::{digit1, one_of},
    combinator::{map, map_res, opt},
    error::{Error, ErrorKind},
    multi::many0,
    sequence::preceded,
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::{KriegsratError, Result};
use crate::dice::DiceRoller;

/// Most dice a single term may roll
pub const MAX_DICE: u32 = 100;
/// Most faces a die may have
pub const MAX_SIDES: u32 = 1000;
/// Largest flat term
pub const MAX_FLAT: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn factor(&self) -> i32 {
        match self {
            Sign::Plus => 1,
            Sign::Minus => -1,
        }
    }

    fn symbol(&self) -> char {
        match self {
            Sign::Plus => '+',
            Sign::Minus => '-',
        }
    }
}

/// One signed term: `count` dice with `sides` faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DamageTerm {
    pub sign: Sign,
    pub count: u32,
    /// 1 marks a flat term
    pub sides: u32,
}

impl DamageTerm {
    pub fn is_flat(&self) -> bool {
        self.sides == 1
    }

    fn within_limits(&self) -> bool {
        if self.is_flat() {
            self.count <= MAX_FLAT
        } else {
            self.count <= MAX_DICE && self.sides <= MAX_SIDES
        }
    }

    /// Unsigned (lowest, highest) result of the term
    fn range(&self) -> (i32, i32) {
        let low = self.count as i32;
        if self.is_flat() {
            (low, low)
        } else {
            (low, low.saturating_mul(self.sides as i32))
        }
    }
}

/// Parsed damage expression
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DamageExpr {
    terms: Vec<DamageTerm>,
}

impl DamageExpr {
    /// Expression that always deals zero
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::zero());
        }
        match expression(trimmed) {
            Ok(("", terms)) if terms.iter().all(DamageTerm::within_limits) => Ok(Self { terms }),
            _ => Err(KriegsratError::InvalidDamageExpression(text.to_string())),
        }
    }

    pub fn terms(&self) -> &[DamageTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Roll every dice term and sum the signed results
    ///
    /// Flat terms add their value without touching the dice.
    pub fn evaluate(&self, dice: &mut dyn DiceRoller) -> i32 {
        self.terms.iter().fold(0i32, |total, term| {
            let value = if term.is_flat() {
                term.count as i32
            } else {
                dice.roll(term.sides, term.count)
            };
            total.saturating_add(term.sign.factor() * value)
        })
    }

    /// Smallest possible result
    pub fn min_value(&self) -> i32 {
        self.terms.iter().fold(0i32, |total, term| {
            let (low, high) = term.range();
            match term.sign {
                Sign::Plus => total.saturating_add(low),
                Sign::Minus => total.saturating_sub(high),
            }
        })
    }

    /// Largest possible result
    pub fn max_value(&self) -> i32 {
        self.terms.iter().fold(0i32, |total, term| {
            let (low, high) = term.range();
            match term.sign {
                Sign::Plus => total.saturating_add(high),
                Sign::Minus => total.saturating_sub(low),
            }
        })
    }
}

impl fmt::Display for DamageExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 || term.sign == Sign::Minus {
                write!(f, "{}", term.sign.symbol())?;
            }
            if term.is_flat() {
                write!(f, "{}", term.count)?;
            } else {
                write!(f, "{}W{}", term.count, term.sides)?;
            }
        }
        Ok(())
    }
}

impl FromStr for DamageExpr {
    type Err = KriegsratError;

    fn from_str(s: &str) -> Result<Self> {
        DamageExpr::parse(s)
    }
}

impl TryFrom<String> for DamageExpr {
    type Error = KriegsratError;

    fn try_from(value: String) -> Result<Self> {
        DamageExpr::parse(&value)
    }
}

impl From<DamageExpr> for String {
    fn from(value: DamageExpr) -> Self {
        value.to_string()
    }
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>()).parse(input)
}

fn sign(input: &str) -> IResult<&str, Sign> {
    map(one_of("+-"), |c| if c == '-' { Sign::Minus } else { Sign::Plus }).parse(input)
}

fn unsigned_term(input: &str, sign: Sign) -> IResult<&str, DamageTerm> {
    let (input, count) = opt(number).parse(input)?;
    let (input, sides) = opt(preceded(one_of("Ww"), number)).parse(input)?;
    match (count, sides) {
        (None, None) | (_, Some(0)) => Err(nom::Err::Error(Error::new(input, ErrorKind::Digit))),
        (count, sides) => Ok((
            input,
            DamageTerm {
                sign,
                count: count.unwrap_or(1),
                sides: sides.unwrap_or(1),
            },
        )),
    }
}

fn signed_term(input: &str) -> IResult<&str, DamageTerm> {
    let (input, sign) = sign(input)?;
    unsigned_term(input, sign)
}

fn expression(input: &str) -> IResult<&str, Vec<DamageTerm>> {
    let (input, leading) = opt(sign).parse(input)?;
    let (input, first) = unsigned_term(input, leading.unwrap_or(Sign::Plus))?;
    let (input, rest) = many0(signed_term).parse(input)?;

    let mut terms = Vec::with_capacity(rest.len() + 1);
    terms.push(first);
    terms.extend(rest);
    Ok((input, terms))
}
