//! Shared fixtures for the HTTP tests: a recording gateway and a router
//! built around it.

use async_trait::async_trait;
use axum_test::TestServer;
use relay_api::{create_router, AppConfig, AppState};
use relay_core::{
    CreatePaymentArgs, PaymentDirection, PaymentDto, PaymentError, PaymentGateway, PaymentResult,
    PaymentStatusFlags, PaymentTransaction, TransferSettings,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Gateway double that records each call as `op:id`.
#[derive(Default)]
pub struct RecordingGateway {
    payments: Mutex<HashMap<String, PaymentDto>>,
    stale: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, (u16, serde_json::Value)>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingGateway {
    pub fn with_pending(self, id: &str) -> Self {
        self.insert(payment(id, "user_1"));
        self
    }

    pub fn with_stale(self, id: &str) -> Self {
        self.insert(payment(id, "someone"));
        self.stale.lock().unwrap().push(id.to_string());
        self
    }

    /// Fail `op` (or `op:id`) with the given status and JSON payload
    pub fn failing(self, key: &str, status: u16, body: serde_json::Value) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(key.to_string(), (status, body));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(op))
            .count()
    }

    fn insert(&self, payment: PaymentDto) -> PaymentDto {
        self.payments
            .lock()
            .unwrap()
            .insert(payment.identifier.clone(), payment.clone());
        payment
    }

    fn record(&self, op: &str, id: &str) -> PaymentResult<()> {
        self.calls.lock().unwrap().push(format!("{}:{}", op, id));
        let failures = self.failures.lock().unwrap();
        match failures.get(&format!("{}:{}", op, id)).or_else(|| failures.get(op)) {
            Some((status, body)) => Err(remote(*status, body.clone())),
            None => Ok(()),
        }
    }

    fn modify(
        &self,
        id: &str,
        f: impl FnOnce(&mut PaymentDto) -> PaymentResult<()>,
    ) -> PaymentResult<PaymentDto> {
        let mut payments = self.payments.lock().unwrap();
        let payment = payments
            .get_mut(id)
            .ok_or_else(|| remote(404, serde_json::json!({ "error": "payment_not_found" })))?;
        f(payment)?;
        Ok(payment.clone())
    }
}

fn remote(status: u16, body: serde_json::Value) -> PaymentError {
    let message = body["error"].as_str().unwrap_or("remote failure").to_string();
    PaymentError::ProviderError {
        provider: "recording".to_string(),
        status,
        message,
        details: Some(body),
    }
}

pub fn payment(id: &str, uid: &str) -> PaymentDto {
    serde_json::from_value(serde_json::json!({
        "identifier": id,
        "user_uid": uid,
        "amount": 1,
        "memo": "",
        "metadata": {},
        "direction": "user_to_app",
        "network": "Pi Testnet",
    }))
    .unwrap()
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn get_payment(&self, payment_id: &str) -> PaymentResult<PaymentDto> {
        self.record("get", payment_id)?;
        self.modify(payment_id, |_| Ok(()))
    }

    async fn approve_payment(&self, payment_id: &str) -> PaymentResult<PaymentDto> {
        self.record("approve", payment_id)?;
        self.modify(payment_id, |p| {
            if p.status.developer_approved {
                return Err(remote(
                    400,
                    serde_json::json!({ "error": "already_approved" }),
                ));
            }
            p.status.developer_approved = true;
            Ok(())
        })
    }

    async fn complete_payment(&self, payment_id: &str, txid: &str) -> PaymentResult<PaymentDto> {
        self.record("complete", payment_id)?;
        self.modify(payment_id, |p| {
            if p.status.developer_completed {
                return Err(remote(
                    400,
                    serde_json::json!({ "error": "already_completed" }),
                ));
            }
            p.status = PaymentStatusFlags {
                developer_approved: true,
                transaction_verified: true,
                developer_completed: true,
                cancelled: false,
                user_cancelled: false,
            };
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
        self.modify(payment_id, |p| {
            p.status.cancelled = true;
            Ok(())
        })
    }

    async fn incomplete_server_payments(&self) -> PaymentResult<Vec<PaymentDto>> {
        self.record("incomplete", "server")?;
        let stale = self.stale.lock().unwrap().clone();
        let payments = self.payments.lock().unwrap();
        Ok(stale.iter().filter_map(|id| payments.get(id).cloned()).collect())
    }

    async fn create_payment(&self, args: &CreatePaymentArgs) -> PaymentResult<PaymentDto> {
        self.record("create", &args.uid)?;
        let mut created = payment("a2u_new", &args.uid);
        created.amount = args.amount;
        created.memo = args.memo.clone();
        created.metadata = serde_json::to_value(&args.metadata).unwrap();
        created.direction = PaymentDirection::AppToUser;
        Ok(self.insert(created))
    }

    async fn submit_payment(&self, payment_id: &str) -> PaymentResult<String> {
        self.record("submit", payment_id)?;
        Ok(format!("tx_{}", payment_id))
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        relay_config_path: "config/relay.toml".to_string(),
    }
}

/// Router over the given gateway, plus a handle to inspect its calls
pub fn server(gateway: RecordingGateway) -> (TestServer, Arc<RecordingGateway>) {
    let gateway = Arc::new(gateway);
    let state = AppState::with_gateway(gateway.clone(), test_config(), TransferSettings::default());
    let server = TestServer::new(create_router(state)).unwrap();
    (server, gateway)
}
