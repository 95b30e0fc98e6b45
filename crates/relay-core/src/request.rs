//! # Inbound Request Normalization
//!
//! Turns loosely typed JSON fields into validated requests. Every function
//! here runs before any remote call; a failure is always a validation
//! error.

use crate::amount::Amount;
use crate::error::{PaymentError, PaymentResult};
use serde_json::Value;

/// Identifies a remote payment by its opaque id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub payment_id: String,
    pub txid: Option<String>,
}

impl PaymentRequest {
    /// Validate an approval request (`paymentId` required).
    pub fn for_approval(payment_id: Option<&Value>) -> PaymentResult<Self> {
        Ok(Self {
            payment_id: required_string("paymentId", payment_id)?,
            txid: None,
        })
    }

    /// Validate a completion request (`paymentId` and `txid` required).
    pub fn for_completion(payment_id: Option<&Value>, txid: Option<&Value>) -> PaymentResult<Self> {
        let payment_id = optional_string("paymentId", payment_id)?;
        let txid = optional_string("txid", txid)?;

        match (payment_id, txid) {
            (Some(payment_id), Some(txid)) => Ok(Self {
                payment_id,
                txid: Some(txid),
            }),
            _ => Err(PaymentError::InvalidRequest(
                "Missing paymentId or txid".to_string(),
            )),
        }
    }
}

/// A payout to initiate from the app wallet
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    /// User identifier (uid or username)
    pub recipient: String,
    pub amount: Amount,
    pub memo: Option<String>,
}

impl TransferRequest {
    /// Validate a transfer request.
    ///
    /// The recipient is the first present, non-empty value among `uid`
    /// and `username`.
    pub fn from_fields(
        uid: Option<&Value>,
        username: Option<&Value>,
        amount: Option<&Value>,
        memo: Option<&Value>,
    ) -> PaymentResult<Self> {
        let recipient = first_present(&[("uid", uid), ("username", username)])?.ok_or_else(
            || PaymentError::InvalidRequest("Missing uid/username or amount".to_string()),
        )?;

        let amount = match amount {
            None | Some(Value::Null) => {
                return Err(PaymentError::InvalidRequest(
                    "Missing uid/username or amount".to_string(),
                ))
            }
            Some(raw) => Amount::normalize(raw)?,
        };

        Ok(Self {
            recipient,
            amount,
            memo: optional_string("memo", memo)?,
        })
    }

    /// Memo to send, falling back to the given default
    pub fn memo_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.memo.as_deref().unwrap_or(default)
    }
}

fn first_present(candidates: &[(&str, Option<&Value>)]) -> PaymentResult<Option<String>> {
    for (field, value) in candidates {
        if let Some(s) = optional_string(field, *value)? {
            return Ok(Some(s));
        }
    }
    Ok(None)
}

fn required_string(field: &str, value: Option<&Value>) -> PaymentResult<String> {
    optional_string(field, value)?
        .ok_or_else(|| PaymentError::InvalidRequest(format!("Missing {}", field)))
}

/// Missing, null and blank strings all read as absent.
fn optional_string(field: &str, value: Option<&Value>) -> PaymentResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(_) => Err(PaymentError::InvalidRequest(format!(
            "{} must be a string",
            field
        ))),
    }
}
