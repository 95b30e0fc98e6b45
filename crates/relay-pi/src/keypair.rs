//! # Ledger Keys
//!
//! The app wallet keypair that signs app-to-user transactions, and the
//! StrKey forms of its keys: account ids (`G...`) and secret seeds (`S...`).

use ed25519_dalek::{Signer, SigningKey};
use stellar_strkey::ed25519::{PrivateKey, PublicKey};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrKeyError {
    #[error("not a valid account id")]
    InvalidAccountId,
    #[error("not a valid secret seed")]
    InvalidSeed,
}

/// App wallet keypair
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    /// Decode a secret seed (`S...`).
    pub fn from_secret_seed(seed: &str) -> Result<Self, StrKeyError> {
        let PrivateKey(raw) =
            PrivateKey::from_string(seed.trim()).map_err(|_| StrKeyError::InvalidSeed)?;
        Ok(Self {
            signing: SigningKey::from_bytes(&raw),
        })
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing.verifying_key().to_bytes()
    }

    /// Public account id (`G...`)
    pub fn account_id(&self) -> String {
        encode_account_id(&self.public_key())
    }

    /// Last four bytes of the public key, used as the signature hint
    pub fn hint(&self) -> [u8; 4] {
        let pk = self.public_key();
        [pk[28], pk[29], pk[30], pk[31]]
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing.sign(message).to_bytes()
    }
}

pub fn encode_account_id(key: &[u8; 32]) -> String {
    PublicKey(*key).to_string()
}

/// Decode a public account id (`G...`) into raw key bytes.
pub fn decode_account_id(account_id: &str) -> Result<[u8; 32], StrKeyError> {
    let PublicKey(raw) =
        PublicKey::from_string(account_id.trim()).map_err(|_| StrKeyError::InvalidAccountId)?;
    Ok(raw)
}
