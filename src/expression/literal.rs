//! Literal Unit Parser
//!
//! Turns literal tokens into typed scalars.
//!
//! # Supported Forms
//!
//! ```text
//! 42        LONG
//! 4.2       DOUBLE
//! 5Mi       LONG, binary size   (5 * 1024^2)
//! 5M        LONG, decimal size  (5 * 1000^2)
//! 90%       DOUBLE, percentage  (0.9)
//! 1h        LONG, duration in seconds (3600)
//! -1d       LONG, signed duration (-86400), used for time offsets
//! ```

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, one_of},
    combinator::{opt, recognize, value},
    sequence::{pair, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::expression::error::{LiteralError, LiteralResult};
use crate::expression::scalar::Scalar;

/// How a literal's text was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiteralKind {
    /// Plain integer or decimal number
    Number,
    /// Integer with a `Ki`/`Mi`/... suffix
    BinarySize,
    /// Integer with a `K`/`M`/... suffix
    DecimalSize,
    /// Number with a `%` suffix
    Percentage,
    /// Integer with an `s`/`m`/`h`/`d`/`w` suffix, valued in seconds
    Duration,
}

/// A typed literal together with its source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    /// Text as written in the expression
    pub text: String,
    pub kind: LiteralKind,
    pub value: Scalar,
}

impl Literal {
    /// Parse literal text
    pub fn parse(text: &str) -> LiteralResult<Self> {
        parse_literal(text)
    }

    pub fn long(value: i64) -> Self {
        Self {
            text: value.to_string(),
            kind: LiteralKind::Number,
            value: Scalar::Long(value),
        }
    }

    pub fn double(value: f64) -> Self {
        Self {
            text: value.to_string(),
            kind: LiteralKind::Number,
            value: Scalar::Double(value),
        }
    }

    /// Seconds represented by a duration literal
    pub fn duration_secs(&self) -> Option<i64> {
        match (self.kind, self.value) {
            (LiteralKind::Duration, Scalar::Long(secs)) => Some(secs),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Suffix {
    Binary(u32),
    Decimal(u32),
    Percent,
    Seconds(i64),
}

/// Parse a literal token into a typed [`Literal`]
pub fn parse_literal(input: &str) -> LiteralResult<Literal> {
    let text = input.trim();
    if text.is_empty() {
        return Err(LiteralError::Empty);
    }

    let (remaining, (number, suffix)) = parse_token(text)
        .map_err(|_| LiteralError::Invalid(text.to_string()))?;
    if !remaining.is_empty() {
        return Err(LiteralError::UnknownSuffix {
            literal: text.to_string(),
            suffix: remaining.to_string(),
        });
    }

    let is_decimal = number.contains('.');
    let (kind, value) = match suffix {
        None if is_decimal => (LiteralKind::Number, Scalar::Double(parse_double(text, number)?)),
        None => (LiteralKind::Number, Scalar::Long(parse_long(text, number)?)),
        Some(Suffix::Percent) => (
            LiteralKind::Percentage,
            Scalar::Double(parse_double(text, number)? / 100.0),
        ),
        Some(_) if is_decimal => return Err(LiteralError::FractionalUnit(text.to_string())),
        Some(Suffix::Binary(exp)) => (
            LiteralKind::BinarySize,
            Scalar::Long(scale(text, parse_long(text, number)?, 1024_i64.checked_pow(exp))?),
        ),
        Some(Suffix::Decimal(exp)) => (
            LiteralKind::DecimalSize,
            Scalar::Long(scale(text, parse_long(text, number)?, 1000_i64.checked_pow(exp))?),
        ),
        Some(Suffix::Seconds(unit)) => (
            LiteralKind::Duration,
            Scalar::Long(scale(text, parse_long(text, number)?, Some(unit))?),
        ),
    };

    Ok(Literal {
        text: text.to_string(),
        kind,
        value,
    })
}

fn parse_long(literal: &str, number: &str) -> LiteralResult<i64> {
    number
        .parse::<i64>()
        .map_err(|_| LiteralError::Overflow(literal.to_string()))
}

fn parse_double(literal: &str, number: &str) -> LiteralResult<f64> {
    number
        .parse::<f64>()
        .map_err(|_| LiteralError::Invalid(literal.to_string()))
}

fn scale(literal: &str, base: i64, factor: Option<i64>) -> LiteralResult<i64> {
    factor
        .and_then(|f| base.checked_mul(f))
        .ok_or_else(|| LiteralError::Overflow(literal.to_string()))
}

/// Parse `<number><suffix>?`
fn parse_token(input: &str) -> IResult<&str, (&str, Option<Suffix>)> {
    pair(parse_number, opt(parse_suffix))(input)
}

/// Parse a signed integer or decimal number
fn parse_number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)
}

/// Parse a unit suffix
///
/// Binary suffixes are tried before decimal ones so `Mi` is not read as `M`.
/// Lowercase `m` is minutes, uppercase `M` is mega.
fn parse_suffix(input: &str) -> IResult<&str, Suffix> {
    alt((
        value(Suffix::Binary(1), tag("Ki")),
        value(Suffix::Binary(2), tag("Mi")),
        value(Suffix::Binary(3), tag("Gi")),
        value(Suffix::Binary(4), tag("Ti")),
        value(Suffix::Binary(5), tag("Pi")),
        value(Suffix::Decimal(1), tag("K")),
        value(Suffix::Decimal(2), tag("M")),
        value(Suffix::Decimal(3), tag("G")),
        value(Suffix::Decimal(4), tag("T")),
        value(Suffix::Decimal(5), tag("P")),
        value(Suffix::Percent, tag("%")),
        value(Suffix::Seconds(1), tag("s")),
        value(Suffix::Seconds(60), tag("m")),
        value(Suffix::Seconds(60 * 60), tag("h")),
        value(Suffix::Seconds(24 * 60 * 60), tag("d")),
        value(Suffix::Seconds(7 * 24 * 60 * 60), tag("w")),
    ))(input)
}
