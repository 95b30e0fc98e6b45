//! # Transfer Orchestrator
//!
//! Server-initiated (A2U) payouts. The remote platform allows one
//! in-flight app-to-user payment per app, so stale ones are cancelled
//! before a new payment is created.
//!
//! ```text
//! list incomplete ─► cancel each ─► create ─► submit ─► complete
//!                    (failures       (any failure from here on
//!                     counted)        aborts the sequence)
//! ```
//!
//! Calls are strictly sequential and never retried.

use crate::error::{PaymentError, PaymentResult};
use crate::gateway::BoxedGateway;
use crate::payment::{CreatePaymentArgs, PaymentDto, PaymentMetadata};
use crate::request::TransferRequest;
use serde::Deserialize;
use std::fmt;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub const DEFAULT_MEMO: &str = "Reward from Orbit";
pub const DEFAULT_TAG: &str = "reward";

/// Defaults applied to every transfer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    /// Memo used when the request carries none
    pub default_memo: String,
    /// Value of `metadata.type` on created payments
    pub tag: String,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            default_memo: DEFAULT_MEMO.to_string(),
            tag: DEFAULT_TAG.to_string(),
        }
    }
}

/// Steps of the payout sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStep {
    ListIncomplete,
    Create,
    Submit,
    Complete,
}

impl fmt::Display for TransferStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransferStep::ListIncomplete => "list_incomplete",
            TransferStep::Create => "create",
            TransferStep::Submit => "submit",
            TransferStep::Complete => "complete",
        })
    }
}

/// State of a single transfer, as observed by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    None,
    Created,
    Submitted,
    Completed,
    /// Only reached by stale transfers during pre-clearing
    Cancelled,
    Failed,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferState::Completed | TransferState::Cancelled | TransferState::Failed
        )
    }

    /// State of an existing payment record, read from its remote flags
    pub fn observed(payment: &PaymentDto) -> TransferState {
        let flags = &payment.status;
        if flags.cancelled || flags.user_cancelled {
            TransferState::Cancelled
        } else if flags.developer_completed {
            TransferState::Completed
        } else if payment.txid().is_some() {
            TransferState::Submitted
        } else {
            TransferState::Created
        }
    }

    /// Move to `next`, rejecting transitions the sequence never makes.
    pub fn transition(self, next: TransferState) -> PaymentResult<TransferState> {
        let allowed = match (self, next) {
            (TransferState::None, TransferState::Created)
            | (TransferState::Created, TransferState::Submitted)
            | (TransferState::Submitted, TransferState::Completed) => true,
            (TransferState::Created | TransferState::Submitted, TransferState::Cancelled) => true,
            (from, TransferState::Failed) => !from.is_terminal(),
            _ => false,
        };

        if allowed {
            Ok(next)
        } else {
            Err(PaymentError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransferState::None => "none",
            TransferState::Created => "created",
            TransferState::Submitted => "submitted",
            TransferState::Completed => "completed",
            TransferState::Cancelled => "cancelled",
            TransferState::Failed => "failed",
        })
    }
}

/// Outcome of a successful payout
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    /// The completed payment record
    pub payment: PaymentDto,
    pub txid: String,
    /// Stale payments cancelled before creating this one
    pub stale_cancelled: usize,
    /// Stale payments whose cancel failed
    pub stale_cancel_failures: usize,
}

/// Sequences a full payout over an injected gateway
#[derive(Clone)]
pub struct TransferOrchestrator {
    gateway: BoxedGateway,
    settings: TransferSettings,
}

impl TransferOrchestrator {
    pub fn new(gateway: BoxedGateway, settings: TransferSettings) -> Self {
        Self { gateway, settings }
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    /// Run the whole payout sequence for one request.
    #[instrument(
        skip(self, request),
        fields(run_id = %Uuid::new_v4(), recipient = %request.recipient, amount = %request.amount)
    )]
    pub async fn send(&self, request: &TransferRequest) -> PaymentResult<TransferReceipt> {
        info!("Sending {} to user {}", request.amount, request.recipient);

        let (stale_cancelled, stale_cancel_failures) = self.clear_stale().await?;

        let args = CreatePaymentArgs {
            amount: request.amount,
            memo: request.memo_or(&self.settings.default_memo).to_string(),
            metadata: PaymentMetadata {
                kind: self.settings.tag.clone(),
            },
            uid: request.recipient.clone(),
        };

        let mut state = TransferState::None;

        let created = self
            .gateway
            .create_payment(&args)
            .await
            .map_err(|e| abort(TransferStep::Create, state, e))?;
        state = state.transition(TransferState::Created)?;
        info!("Payment created: {}", created.identifier);

        let txid = self
            .gateway
            .submit_payment(&created.identifier)
            .await
            .map_err(|e| abort(TransferStep::Submit, state, e))?;
        state = state.transition(TransferState::Submitted)?;
        info!("Payment submitted, txid: {}", txid);

        let completed = self
            .gateway
            .complete_payment(&created.identifier, &txid)
            .await
            .map_err(|e| abort(TransferStep::Complete, state, e))?;
        state.transition(TransferState::Completed)?;
        info!("Payment completed: {}", completed.identifier);

        Ok(TransferReceipt {
            payment: completed,
            txid,
            stale_cancelled,
            stale_cancel_failures,
        })
    }

    /// Cancel every in-flight app-to-user payment.
    /// Returns (cancelled, failed) counts.
    async fn clear_stale(&self) -> PaymentResult<(usize, usize)> {
        let incomplete = self
            .gateway
            .incomplete_server_payments()
            .await
            .map_err(|e| abort(TransferStep::ListIncomplete, TransferState::None, e))?;

        if incomplete.is_empty() {
            return Ok((0, 0));
        }

        warn!(
            "Found {} incomplete payments, cancelling...",
            incomplete.len()
        );

        let mut cancelled = 0;
        let mut failed = 0;
        for stale in &incomplete {
            let state = TransferState::observed(stale);
            match self.gateway.cancel_payment(&stale.identifier).await {
                Ok(_) => {
                    let next = state.transition(TransferState::Cancelled).unwrap_or(state);
                    info!("Stale payment {} {} -> {}", stale.identifier, state, next);
                    cancelled += 1;
                }
                Err(e) => {
                    let next = state.transition(TransferState::Failed).unwrap_or(state);
                    warn!(
                        "Failed to cancel stale payment {} ({} -> {}): {}",
                        stale.identifier, state, next, e
                    );
                    failed += 1;
                }
            }
        }

        Ok((cancelled, failed))
    }
}

fn abort(step: TransferStep, state: TransferState, source: PaymentError) -> PaymentError {
    let failed = state.transition(TransferState::Failed).unwrap_or(state);
    error!(
        "Transfer aborted at {} ({} -> {}): {}",
        step, state, failed, source
    );
    PaymentError::TransferFailed {
        step: step.to_string(),
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::gateway::mock::MockGateway;
    use std::sync::Arc;

    fn request(recipient: &str, amount: &str) -> TransferRequest {
        TransferRequest {
            recipient: recipient.to_string(),
            amount: Amount::parse(amount).unwrap(),
            memo: None,
        }
    }

    fn orchestrator(gateway: Arc<MockGateway>) -> TransferOrchestrator {
        TransferOrchestrator::new(gateway, TransferSettings::default())
    }

    #[tokio::test]
    async fn test_cancels_stale_before_create() {
        let gateway = Arc::new(MockGateway::default().with_stale("old_1").with_stale("old_2"));

        let receipt = orchestrator(gateway.clone())
            .send(&request("alice", "10"))
            .await
            .unwrap();

        assert_eq!(receipt.stale_cancelled, 2);
        assert_eq!(
            gateway.calls(),
            vec![
                "incomplete:server",
                "cancel:old_1",
                "cancel:old_2",
                "create:alice",
                "submit:a2u_3",
                "complete:a2u_3",
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_failure_is_counted_not_fatal() {
        let gateway = Arc::new(
            MockGateway::default()
                .with_stale("old_1")
                .with_stale("old_2")
                .failing("cancel:old_1", 500, "boom"),
        );

        let receipt = orchestrator(gateway.clone())
            .send(&request("alice", "1"))
            .await
            .unwrap();

        assert_eq!(receipt.stale_cancelled, 1);
        assert_eq!(receipt.stale_cancel_failures, 1);
        assert_eq!(gateway.call_count("complete"), 1);
    }

    #[tokio::test]
    async fn test_submit_failure_aborts_without_complete() {
        let gateway = Arc::new(MockGateway::default().failing("submit", 400, "underfunded"));

        let err = orchestrator(gateway.clone())
            .send(&request("alice", "1"))
            .await
            .unwrap_err();

        match err {
            PaymentError::TransferFailed { step, .. } => assert_eq!(step, "submit"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(gateway.call_count("create"), 1);
        assert_eq!(gateway.call_count("complete"), 0);
    }

    fn failed_step(err: PaymentError) -> String {
        match err {
            PaymentError::TransferFailed { step, .. } => step,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_list_failure_aborts_before_cancel_and_create() {
        let gateway = Arc::new(
            MockGateway::default()
                .with_stale("old_1")
                .failing("incomplete", 503, "unavailable"),
        );

        let err = orchestrator(gateway.clone())
            .send(&request("alice", "1"))
            .await
            .unwrap_err();

        assert_eq!(failed_step(err), "list_incomplete");
        assert_eq!(gateway.calls(), vec!["incomplete:server"]);
    }

    #[tokio::test]
    async fn test_create_failure_aborts_without_submit() {
        let gateway = Arc::new(MockGateway::default().failing("create", 400, "invalid_uid"));

        let err = orchestrator(gateway.clone())
            .send(&request("alice", "1"))
            .await
            .unwrap_err();

        assert_eq!(failed_step(err), "create");
        assert_eq!(gateway.call_count("submit"), 0);
        assert_eq!(gateway.call_count("complete"), 0);
    }

    #[tokio::test]
    async fn test_complete_failure_is_reported() {
        let gateway = Arc::new(MockGateway::default().failing("complete", 500, "internal"));

        let err = orchestrator(gateway.clone())
            .send(&request("alice", "1"))
            .await
            .unwrap_err();

        assert_eq!(err.details(), Some(&serde_json::json!({ "error": "internal" })));
        assert_eq!(failed_step(err), "complete");
        assert_eq!(gateway.call_count("submit"), 1);
    }

    #[test]
    fn test_observed_state_of_stale_records() {
        use crate::payment::{fixtures, PaymentStatusFlags, PaymentTransaction};

        let mut stale = fixtures::payment("old_1", PaymentStatusFlags::default());
        assert_eq!(TransferState::observed(&stale), TransferState::Created);

        stale.transaction = Some(PaymentTransaction {
            txid: "tx_old".into(),
            verified: false,
            link: None,
        });
        let state = TransferState::observed(&stale);
        assert_eq!(state, TransferState::Submitted);
        assert_eq!(
            state.transition(TransferState::Cancelled).unwrap(),
            TransferState::Cancelled
        );

        stale.status.cancelled = true;
        assert_eq!(TransferState::observed(&stale), TransferState::Cancelled);
    }

    #[tokio::test]
    async fn test_completed_record_and_defaults() {
        let gateway = Arc::new(MockGateway::default());

        let receipt = orchestrator(gateway).send(&request("alice", "10")).await.unwrap();

        assert_eq!(receipt.txid, "tx_a2u_1");
        assert!(receipt.payment.status.developer_completed);
        assert_eq!(receipt.payment.memo, DEFAULT_MEMO);
        assert_eq!(receipt.payment.metadata, serde_json::json!({ "type": "reward" }));
    }

    #[test]
    fn test_state_machine() {
        let state = TransferState::None;
        let state = state.transition(TransferState::Created).unwrap();
        let state = state.transition(TransferState::Submitted).unwrap();
        let state = state.transition(TransferState::Completed).unwrap();
        assert!(state.is_terminal());

        assert!(TransferState::Completed.transition(TransferState::Failed).is_err());
        assert!(TransferState::None.transition(TransferState::Submitted).is_err());
        assert!(TransferState::None.transition(TransferState::Cancelled).is_err());
        assert!(TransferState::Submitted.transition(TransferState::Failed).is_ok());
        assert!(TransferState::Created.transition(TransferState::Cancelled).is_ok());
    }
}
