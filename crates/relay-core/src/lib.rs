//! # relay-core
//!
//! Core types and payment sequencing for the pi-relay server.
//!
//! This crate provides:
//! - `PaymentGateway` trait for the remote payment platform
//! - `Amount` normalization for loosely typed client amounts
//! - `PaymentRequest` / `TransferRequest` validation
//! - `PaymentLifecycle` for idempotent approve and complete
//! - `TransferOrchestrator` for app-to-user payouts
//! - `PaymentError` with remote error classification
//!
//! ## Example
//!
//! ```rust,ignore
//! use relay_core::{TransferOrchestrator, TransferRequest, TransferSettings};
//!
//! let orchestrator = TransferOrchestrator::new(gateway, TransferSettings::default());
//! let request = TransferRequest::from_fields(Some(&uid), None, Some(&amount), None)?;
//!
//! let receipt = orchestrator.send(&request).await?;
//! println!("paid out in {}", receipt.txid);
//! ```

pub mod amount;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod payment;
pub mod request;
pub mod transfer;

// Re-exports for convenience
pub use amount::{Amount, MAX_SCALE, STROOPS_PER_UNIT};
pub use error::{PaymentError, PaymentResult, RemoteErrorKind};
pub use gateway::{BoxedGateway, PaymentGateway};
pub use lifecycle::{ApprovalStatus, CompletionOutcome, CompletionStatus, PaymentLifecycle};
pub use payment::{
    CreatePaymentArgs, LifecycleStatus, PaymentDirection, PaymentDto, PaymentMetadata,
    PaymentStatusFlags, PaymentTransaction,
};
pub use request::{PaymentRequest, TransferRequest};
pub use transfer::{
    TransferOrchestrator, TransferReceipt, TransferSettings, TransferState, TransferStep,
};
