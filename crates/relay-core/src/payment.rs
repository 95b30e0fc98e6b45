//! # Payment Types
//!
//! Payment records as the remote platform reports them, and the payloads
//! this relay sends when creating app-to-user payments. None of these are
//! stored locally.

use crate::amount::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a payment relative to the app wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDirection {
    /// U2A: a user pays the app
    UserToApp,
    /// A2U: the app pays a user
    AppToUser,
    /// Anything the relay does not know about (passthrough)
    #[serde(other)]
    Unknown,
}

impl Default for PaymentDirection {
    fn default() -> Self {
        PaymentDirection::Unknown
    }
}

/// Lifecycle flags reported by the remote platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusFlags {
    #[serde(default)]
    pub developer_approved: bool,
    #[serde(default)]
    pub transaction_verified: bool,
    #[serde(default)]
    pub developer_completed: bool,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub user_cancelled: bool,
}

/// Ledger transaction attached to a payment once submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub txid: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(rename = "_link", default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A payment record owned by the remote platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDto {
    /// Opaque payment identifier
    pub identifier: String,

    #[serde(default)]
    pub user_uid: String,

    pub amount: Amount,

    #[serde(default)]
    pub memo: String,

    #[serde(default)]
    pub metadata: serde_json::Value,

    #[serde(default)]
    pub from_address: String,

    #[serde(default)]
    pub to_address: String,

    #[serde(default)]
    pub direction: PaymentDirection,

    #[serde(default)]
    pub created_at: String,

    /// Ledger network name ("Pi Network" or "Pi Testnet")
    #[serde(default)]
    pub network: String,

    #[serde(default)]
    pub status: PaymentStatusFlags,

    #[serde(default)]
    pub transaction: Option<PaymentTransaction>,
}

impl PaymentDto {
    /// Lifecycle status derived from the remote flags
    pub fn lifecycle_status(&self) -> LifecycleStatus {
        LifecycleStatus::from_flags(&self.status)
    }

    /// Transaction id, if the payment has been submitted to the ledger
    pub fn txid(&self) -> Option<&str> {
        self.transaction.as_ref().map(|t| t.txid.as_str())
    }
}

/// Status of a remote payment, as observed by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    /// Created, not yet approved by the app
    Pending,
    /// Approved by the app, awaiting completion
    Approved,
    /// Completed by the app
    Completed,
    /// Cancelled by the app or the user
    Cancelled,
}

impl LifecycleStatus {
    pub fn from_flags(flags: &PaymentStatusFlags) -> Self {
        if flags.cancelled || flags.user_cancelled {
            LifecycleStatus::Cancelled
        } else if flags.developer_completed {
            LifecycleStatus::Completed
        } else if flags.developer_approved {
            LifecycleStatus::Approved
        } else {
            LifecycleStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Pending => "pending",
            LifecycleStatus::Approved => "approved",
            LifecycleStatus::Completed => "completed",
            LifecycleStatus::Cancelled => "cancelled",
        }
    }

    /// True once the app has approved the payment (completion implies approval)
    pub fn is_approved(&self) -> bool {
        matches!(self, LifecycleStatus::Approved | LifecycleStatus::Completed)
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata attached to app-to-user payments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    /// Classification tag, e.g. "reward"
    #[serde(rename = "type")]
    pub kind: String,
}

/// Arguments for creating an app-to-user payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentArgs {
    pub amount: Amount,
    pub memo: String,
    pub metadata: PaymentMetadata,
    /// Recipient user identifier
    pub uid: String,
}
