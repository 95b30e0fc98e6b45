//! # Amount Normalization
//!
//! Clients send transfer amounts in several shapes. All of them pass
//! through [`Amount::normalize`], which accepts exactly this union:
//!
//! | Input | Example |
//! |-------|---------|
//! | JSON number | `5`, `2.5` |
//! | numeric string | `"5"`, `" 2.5 "`, `"1e2"` |
//! | object with a numeric `amount` or `value` field | `{"amount": 5}`, `{"value": "2.5"}` |
//!
//! The result must be strictly positive and representable in stroops
//! (at most 7 fractional digits). Everything else is rejected before any
//! remote call is made.

use crate::error::{PaymentError, PaymentResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Maximum number of fractional digits the ledger can settle
pub const MAX_SCALE: u32 = 7;

/// Smallest ledger units per whole unit
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

/// Sub-fields checked, in order, when the amount arrives as an object
const NESTED_AMOUNT_FIELDS: &[&str] = &["amount", "value"];

/// A strictly positive payment amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Amount {
    /// Normalize a raw JSON amount into a positive decimal.
    pub fn normalize(raw: &Value) -> PaymentResult<Self> {
        match raw {
            Value::Object(map) => {
                let inner = NESTED_AMOUNT_FIELDS
                    .iter()
                    .find_map(|field| map.get(*field).filter(|v| !v.is_null()))
                    .ok_or_else(|| invalid("object carries no numeric amount field"))?;
                Self::from_decimal(scalar_to_decimal(inner)?)
            }
            other => Self::from_decimal(scalar_to_decimal(other)?),
        }
    }

    /// Parse a numeric string.
    pub fn parse(input: &str) -> PaymentResult<Self> {
        Self::from_decimal(str_to_decimal(input)?)
    }

    /// Validate an already-numeric value.
    pub fn from_decimal(value: Decimal) -> PaymentResult<Self> {
        if value <= Decimal::ZERO {
            return Err(invalid("amount must be greater than zero"));
        }

        let value = value.normalize();
        if value.scale() > MAX_SCALE {
            return Err(invalid(format!(
                "amount has more than {} fractional digits",
                MAX_SCALE
            )));
        }

        let amount = Self(value);
        amount.to_stroops()?;
        Ok(amount)
    }

    /// The decimal value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Convert to the smallest ledger unit
    pub fn to_stroops(&self) -> PaymentResult<i64> {
        self.0
            .checked_mul(Decimal::from(STROOPS_PER_UNIT))
            .and_then(|d| d.to_i64())
            .ok_or_else(|| invalid("amount is too large"))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn scalar_to_decimal(raw: &Value) -> PaymentResult<Decimal> {
    match raw {
        // serde_json renders numbers without loss, so reparse the text form
        Value::Number(n) => str_to_decimal(&n.to_string()),
        Value::String(s) => str_to_decimal(s),
        Value::Null => Err(invalid("amount is missing")),
        Value::Bool(_) => Err(invalid("amount must be numeric, got a boolean")),
        Value::Array(_) => Err(invalid("amount must be numeric, got an array")),
        Value::Object(_) => Err(invalid("nested amount objects are not supported")),
    }
}

fn str_to_decimal(input: &str) -> PaymentResult<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("amount is empty"));
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| invalid(format!("'{}' is not a number", trimmed)))
}

fn invalid(message: impl Into<String>) -> PaymentError {
    PaymentError::InvalidAmount {
        message: message.into(),
    }
}
