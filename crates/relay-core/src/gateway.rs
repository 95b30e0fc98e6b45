//! # Payment Gateway Trait
//!
//! The seam between the relay and the remote payment platform.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PaymentGateway (trait)                    │
//! │  ├── get_payment() / approve_payment() / complete_payment() │
//! │  ├── incomplete_server_payments() / cancel_payment()        │
//! │  └── create_payment() / submit_payment()                    │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!          ┌─────────────────┴─────────────────┐
//!  ┌───────┴───────┐                   ┌───────┴───────┐
//!  │ PiNetwork     │                   │ test doubles  │
//!  │ Client        │                   │               │
//!  └───────────────┘                   └───────────────┘
//! ```
//!
//! The gateway is built once at startup and shared as a [`BoxedGateway`]
//! by the HTTP handlers, the lifecycle service and the transfer
//! orchestrator.

use crate::error::PaymentResult;
use crate::payment::{CreatePaymentArgs, PaymentDto};
use async_trait::async_trait;
use std::sync::Arc;

/// Remote operations the relay performs against a payment platform.
///
/// Every method is a single outbound call (ledger submission aside) and
/// none of them retry.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Fetch the current record of a payment.
    async fn get_payment(&self, payment_id: &str) -> PaymentResult<PaymentDto>;

    /// Approve a user-initiated payment.
    async fn approve_payment(&self, payment_id: &str) -> PaymentResult<PaymentDto>;

    /// Mark a payment completed with its ledger transaction id.
    async fn complete_payment(&self, payment_id: &str, txid: &str) -> PaymentResult<PaymentDto>;

    /// Cancel a payment.
    async fn cancel_payment(&self, payment_id: &str) -> PaymentResult<PaymentDto>;

    /// List app-to-user payments the platform still considers in flight.
    async fn incomplete_server_payments(&self) -> PaymentResult<Vec<PaymentDto>>;

    /// Create an app-to-user payment.
    async fn create_payment(&self, args: &CreatePaymentArgs) -> PaymentResult<PaymentDto>;

    /// Submit an app-to-user payment to the ledger and return the txid.
    async fn submit_payment(&self, payment_id: &str) -> PaymentResult<String>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared gateway (dynamic dispatch)
pub type BoxedGateway = Arc<dyn PaymentGateway>;

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::error::PaymentError;
    use crate::payment::{fixtures, PaymentDirection, PaymentStatusFlags, PaymentTransaction};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory gateway that records every call it receives.
    #[derive(Default)]
    pub struct MockGateway {
        payments: Mutex<HashMap<String, PaymentDto>>,
        incomplete: Mutex<Vec<String>>,
        failures: Mutex<HashMap<String, (u16, String)>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockGateway {
        pub fn with_payment(self, payment: PaymentDto) -> Self {
            self.payments
                .lock()
                .unwrap()
                .insert(payment.identifier.clone(), payment);
            self
        }

        pub fn with_stale(self, payment_id: &str) -> Self {
            let stale = fixtures::payment(payment_id, PaymentStatusFlags::default());
            self.incomplete.lock().unwrap().push(payment_id.to_string());
            self.with_payment(stale)
        }

        /// Fail an operation (`"submit"`) or one call of it (`"cancel:p1"`)
        pub fn failing(self, key: &str, status: u16, message: &str) -> Self {
            self.failures
                .lock()
                .unwrap()
                .insert(key.to_string(), (status, message.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self, op: &str) -> usize {
            self.calls()
                .iter()
                .filter(|c| c.split(':').next() == Some(op))
                .count()
        }

        fn record(&self, op: &str, id: &str) -> PaymentResult<()> {
            self.calls.lock().unwrap().push(format!("{}:{}", op, id));

            let failures = self.failures.lock().unwrap();
            let hit = failures
                .get(&format!("{}:{}", op, id))
                .or_else(|| failures.get(op));
            match hit {
                Some((status, message)) => Err(remote(*status, message)),
                None => Ok(()),
            }
        }

        fn update<F>(&self, id: &str, f: F) -> PaymentResult<PaymentDto>
        where
            F: FnOnce(&mut PaymentDto) -> PaymentResult<()>,
        {
            let mut payments = self.payments.lock().unwrap();
            let payment = payments
                .get_mut(id)
                .ok_or_else(|| remote(404, "payment_not_found"))?;
            f(payment)?;
            Ok(payment.clone())
        }
    }

    fn remote(status: u16, message: &str) -> PaymentError {
        PaymentError::ProviderError {
            provider: "mock".into(),
            status,
            message: message.into(),
            details: Some(serde_json::json!({ "error": message })),
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn get_payment(&self, payment_id: &str) -> PaymentResult<PaymentDto> {
            self.record("get", payment_id)?;
            self.update(payment_id, |_| Ok(()))
        }

        async fn approve_payment(&self, payment_id: &str) -> PaymentResult<PaymentDto> {
            self.record("approve", payment_id)?;
            self.update(payment_id, |p| {
                if p.status.developer_approved {
                    return Err(remote(400, "already_approved"));
                }
                p.status.developer_approved = true;
                Ok(())
            })
        }

        async fn complete_payment(&self, payment_id: &str, txid: &str) -> PaymentResult<PaymentDto> {
            self.record("complete", payment_id)?;
            self.update(payment_id, |p| {
                if p.status.developer_completed {
                    return Err(remote(400, "already_completed"));
                }
                p.status.developer_completed = true;
                p.transaction = Some(PaymentTransaction {
                    txid: txid.to_string(),
                    verified: true,
                    link: None,
                });
                Ok(())
            })
        }

        async fn cancel_payment(&self, payment_id: &str) -> PaymentResult<PaymentDto> {
            self.record("cancel", payment_id)?;
            self.update(payment_id, |p| {
                p.status.cancelled = true;
                Ok(())
            })
        }

        async fn incomplete_server_payments(&self) -> PaymentResult<Vec<PaymentDto>> {
            self.record("incomplete", "server")?;
            let ids = self.incomplete.lock().unwrap().clone();
            let payments = self.payments.lock().unwrap();
            Ok(ids.iter().filter_map(|id| payments.get(id).cloned()).collect())
        }

        async fn create_payment(&self, args: &CreatePaymentArgs) -> PaymentResult<PaymentDto> {
            self.record("create", &args.uid)?;
            let id = format!("a2u_{}", self.payments.lock().unwrap().len() + 1);
            let mut payment = fixtures::payment(&id, PaymentStatusFlags::default());
            payment.user_uid = args.uid.clone();
            payment.amount = args.amount;
            payment.memo = args.memo.clone();
            payment.metadata = serde_json::to_value(&args.metadata).unwrap();
            payment.direction = PaymentDirection::AppToUser;
            Ok(self.with_payment_ref(payment))
        }

        async fn submit_payment(&self, payment_id: &str) -> PaymentResult<String> {
            self.record("submit", payment_id)?;
            Ok(format!("tx_{}", payment_id))
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }

    impl MockGateway {
        fn with_payment_ref(&self, payment: PaymentDto) -> PaymentDto {
            self.payments
                .lock()
                .unwrap()
                .insert(payment.identifier.clone(), payment.clone());
            payment
        }
    }
}
