//! # Horizon Client
//!
//! The three ledger calls needed to submit an app-to-user payment:
//! load the source account sequence, read the base fee, post the signed
//! envelope.

use relay_core::{PaymentError, PaymentResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, instrument};

const PROVIDER: &str = "horizon";

#[derive(Debug, Deserialize)]
struct AccountResponse {
    sequence: String,
}

#[derive(Debug, Deserialize)]
struct FeeStatsResponse {
    last_ledger_base_fee: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: String,
}

/// Thin Horizon REST client sharing the gateway's HTTP pool
#[derive(Clone)]
pub struct HorizonClient {
    client: Client,
}

impl HorizonClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Current sequence number of an account
    #[instrument(skip(self))]
    pub async fn load_sequence(&self, horizon_url: &str, account_id: &str) -> PaymentResult<i64> {
        let url = format!("{}/accounts/{}", horizon_url, account_id);
        let account: AccountResponse = self.fetch(self.client.get(&url)).await?;

        account
            .sequence
            .parse()
            .map_err(|_| PaymentError::Ledger(format!("bad sequence '{}'", account.sequence)))
    }

    /// Base fee per operation, in stroops
    #[instrument(skip(self))]
    pub async fn base_fee(&self, horizon_url: &str) -> PaymentResult<u32> {
        let url = format!("{}/fee_stats", horizon_url);
        let stats: FeeStatsResponse = self.fetch(self.client.get(&url)).await?;

        stats
            .last_ledger_base_fee
            .parse()
            .map_err(|_| PaymentError::Ledger(format!("bad base fee '{}'", stats.last_ledger_base_fee)))
    }

    /// Submit a base64 envelope and return the transaction hash
    #[instrument(skip(self, envelope_b64))]
    pub async fn submit(&self, horizon_url: &str, envelope_b64: &str) -> PaymentResult<String> {
        let url = format!("{}/transactions", horizon_url);
        let request = self.client.post(&url).form(&[("tx", envelope_b64)]);
        let response: SubmitResponse = self.fetch(request).await?;

        debug!("Horizon accepted transaction {}", response.hash);
        Ok(response.hash)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> PaymentResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Horizon error: status={}, body={}", status, body);
            return Err(crate::client::provider_error(PROVIDER, status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Horizon response: {}", e))
        })
    }
}
