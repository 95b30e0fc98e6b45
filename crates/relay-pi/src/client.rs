//! # Pi Network Gateway
//!
//! `PaymentGateway` implementation over the Pi Platform payments API.
//! App-to-user submission signs a ledger transaction with the app wallet
//! and posts it to Horizon.

use crate::config::PiConfig;
use crate::horizon::HorizonClient;
use crate::keypair::{decode_account_id, Keypair};
use crate::xdr::LedgerPayment;
use async_trait::async_trait;
use chrono::Utc;
use relay_core::{
    CreatePaymentArgs, PaymentDirection, PaymentDto, PaymentError, PaymentGateway, PaymentResult,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "pi";

/// Seconds a submitted transaction stays valid
const TX_VALIDITY_SECS: i64 = 180;

/// Pi Network payment gateway
pub struct PiNetworkClient {
    config: PiConfig,
    client: Client,
    horizon: HorizonClient,
    wallet: Option<Keypair>,
}

impl PiNetworkClient {
    /// Create a new client
    pub fn new(config: PiConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaymentError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let wallet = config
            .wallet_seed
            .as_deref()
            .map(Keypair::from_secret_seed)
            .transpose()
            .map_err(|e| PaymentError::Configuration(format!("Invalid PI_WALLET_SEED: {}", e)))?;

        if let Some(ref wallet) = wallet {
            info!("App wallet loaded: {}", wallet.account_id());
        }

        Ok(Self {
            horizon: HorizonClient::new(client.clone()),
            config,
            client,
            wallet,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = PiConfig::from_env()?;
        Self::new(config)
    }

    /// Public account id of the app wallet, if one is configured
    pub fn wallet_address(&self) -> Option<String> {
        self.wallet.as_ref().map(Keypair::account_id)
    }

    fn payment_url(&self, payment_id: &str, action: Option<&str>) -> String {
        match action {
            Some(action) => format!("{}/{}/{}", self.config.payments_url(), payment_id, action),
            None => format!("{}/{}", self.config.payments_url(), payment_id),
        }
    }

    async fn send<T: DeserializeOwned>(&self, op: &str, request: RequestBuilder) -> PaymentResult<T> {
        let response = request
            .header("Authorization", self.config.auth_header())
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Pi API error: op={}, status={}, body={}", op, status, body);
            return Err(provider_error(PROVIDER, status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Pi {} response: {}", op, e))
        })
    }
}

#[async_trait]
impl PaymentGateway for PiNetworkClient {
    #[instrument(skip(self))]
    async fn get_payment(&self, payment_id: &str) -> PaymentResult<PaymentDto> {
        let url = self.payment_url(payment_id, None);
        self.send("get", self.client.get(&url)).await
    }

    #[instrument(skip(self))]
    async fn approve_payment(&self, payment_id: &str) -> PaymentResult<PaymentDto> {
        let url = self.payment_url(payment_id, Some("approve"));
        let payment: PaymentDto = self
            .send("approve", self.client.post(&url).json(&serde_json::json!({})))
            .await?;
        debug!("Approved payment {}", payment.identifier);
        Ok(payment)
    }

    #[instrument(skip(self))]
    async fn complete_payment(&self, payment_id: &str, txid: &str) -> PaymentResult<PaymentDto> {
        let url = self.payment_url(payment_id, Some("complete"));
        let body = CompleteBody { txid };
        self.send("complete", self.client.post(&url).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn cancel_payment(&self, payment_id: &str) -> PaymentResult<PaymentDto> {
        let url = self.payment_url(payment_id, Some("cancel"));
        self.send("cancel", self.client.post(&url).json(&serde_json::json!({})))
            .await
    }

    #[instrument(skip(self))]
    async fn incomplete_server_payments(&self) -> PaymentResult<Vec<PaymentDto>> {
        let url = format!("{}/incomplete_server_payments", self.config.payments_url());
        let response: IncompleteServerPayments =
            self.send("incomplete", self.client.get(&url)).await?;
        Ok(response.incomplete_server_payments)
    }

    #[instrument(skip(self, args), fields(uid = %args.uid, amount = %args.amount))]
    async fn create_payment(&self, args: &CreatePaymentArgs) -> PaymentResult<PaymentDto> {
        let url = self.config.payments_url();
        let body = CreateBody { payment: args };
        self.send("create", self.client.post(&url).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn submit_payment(&self, payment_id: &str) -> PaymentResult<String> {
        let wallet = self.wallet.as_ref().ok_or_else(|| {
            PaymentError::Configuration(
                "PI_WALLET_SEED not set; app-to-user payments cannot be submitted".to_string(),
            )
        })?;

        let payment = self.get_payment(payment_id).await?;

        if payment.direction != PaymentDirection::AppToUser {
            return Err(PaymentError::Ledger(format!(
                "payment {} is not an app-to-user payment",
                payment_id
            )));
        }

        let source = wallet.account_id();
        if payment.from_address != source {
            return Err(PaymentError::Ledger(format!(
                "payment {} is sent from {}, not from the app wallet {}",
                payment_id, payment.from_address, source
            )));
        }

        if let Some(txid) = payment.txid() {
            info!("Payment {} already submitted as {}", payment_id, txid);
            return Ok(txid.to_string());
        }

        let destination = decode_account_id(&payment.to_address).map_err(|e| {
            PaymentError::Ledger(format!("bad to_address '{}': {}", payment.to_address, e))
        })?;

        let horizon_url = self.config.horizon_url_for(&payment.network);
        let sequence = self.horizon.load_sequence(&horizon_url, &source).await?;
        let base_fee = self.horizon.base_fee(&horizon_url).await?;

        let tx = LedgerPayment {
            source: wallet.public_key(),
            destination,
            fee: base_fee,
            sequence: sequence + 1,
            min_time: 0,
            max_time: (Utc::now().timestamp() + TX_VALIDITY_SECS) as u64,
            memo: payment.identifier.clone(),
            amount_stroops: payment.amount.to_stroops()?,
        };

        let envelope = tx.sign(wallet, &payment.network)?;
        debug!("Signed transaction {} for payment {}", envelope.txid(), payment_id);

        let txid = self
            .horizon
            .submit(&horizon_url, &envelope.to_base64())
            .await?;

        info!("Submitted payment {} to the ledger: {}", payment_id, txid);
        Ok(txid)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map a non-2xx response into a `ProviderError`, keeping the raw payload.
pub(crate) fn provider_error(provider: &str, status: u16, body: &str) -> PaymentError {
    let details = match serde_json::from_str::<Value>(body) {
        Ok(value) => Some(value),
        Err(_) if body.trim().is_empty() => None,
        Err(_) => Some(Value::String(body.to_string())),
    };

    let message = details
        .as_ref()
        .and_then(Value::as_object)
        .and_then(|obj| {
            ["error_message", "message", "error", "title"]
                .iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_str))
        })
        .map(String::from)
        .unwrap_or_else(|| format!("HTTP {}", status));

    PaymentError::ProviderError {
        provider: provider.to_string(),
        status,
        message,
        details,
    }
}

// =============================================================================
// Pi API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct CompleteBody<'a> {
    txid: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateBody<'a> {
    payment: &'a CreatePaymentArgs,
}

#[derive(Debug, Deserialize)]
struct IncompleteServerPayments {
    #[serde(default)]
    incomplete_server_payments: Vec<PaymentDto>,
}
