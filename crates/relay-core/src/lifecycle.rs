//! # Payment Lifecycle
//!
//! Approve and complete for user-to-app payments, with idempotency.
//!
//! Approval checks the remote status first and short-circuits when the
//! payment is already approved. The check and the approval are two calls,
//! so a concurrent approval can still slip in between; a `Duplicate`
//! error from the approve call is therefore also read as success.
//! Completion skips the pre-check and relies on the error classification
//! alone.

use crate::error::PaymentResult;
use crate::gateway::BoxedGateway;
use crate::payment::PaymentDto;
use serde::Serialize;
use tracing::{info, instrument};

/// How an approval request was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Approved,
    AlreadyApproved,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::AlreadyApproved => "already_approved",
        }
    }
}

/// How a completion request was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    AlreadyCompleted,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Completed => "completed",
            CompletionStatus::AlreadyCompleted => "already_completed",
        }
    }
}

/// Result of a successful completion
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub status: CompletionStatus,
    pub payment: PaymentDto,
}

/// Approve/complete service over an injected gateway
#[derive(Clone)]
pub struct PaymentLifecycle {
    gateway: BoxedGateway,
}

impl PaymentLifecycle {
    pub fn new(gateway: BoxedGateway) -> Self {
        Self { gateway }
    }

    /// Approve a payment. Approving an approved payment succeeds.
    #[instrument(skip(self), fields(provider = self.gateway.provider_name()))]
    pub async fn approve(&self, payment_id: &str) -> PaymentResult<ApprovalStatus> {
        let current = self.gateway.get_payment(payment_id).await?;
        if current.lifecycle_status().is_approved() {
            info!(
                "Payment {} already {}, skipping approve",
                payment_id,
                current.lifecycle_status()
            );
            return Ok(ApprovalStatus::AlreadyApproved);
        }

        match self.gateway.approve_payment(payment_id).await {
            Ok(_) => {
                info!("Payment approved: {}", payment_id);
                Ok(ApprovalStatus::Approved)
            }
            Err(e) if e.is_duplicate() => {
                info!("Payment {} was approved concurrently", payment_id);
                Ok(ApprovalStatus::AlreadyApproved)
            }
            Err(e) => Err(e),
        }
    }

    /// Complete a payment with its ledger txid. Completing twice succeeds.
    #[instrument(skip(self), fields(provider = self.gateway.provider_name()))]
    pub async fn complete(&self, payment_id: &str, txid: &str) -> PaymentResult<CompletionOutcome> {
        match self.gateway.complete_payment(payment_id, txid).await {
            Ok(payment) => {
                info!("Payment completed: {}", payment_id);
                Ok(CompletionOutcome {
                    status: CompletionStatus::Completed,
                    payment,
                })
            }
            Err(e) if e.is_duplicate() => {
                info!("Payment {} was already completed", payment_id);
                let payment = self.gateway.get_payment(payment_id).await?;
                Ok(CompletionOutcome {
                    status: CompletionStatus::AlreadyCompleted,
                    payment,
                })
            }
            Err(e) => Err(e),
        }
    }
}
