//! # Ledger Transaction Encoding
//!
//! XDR encoding of the one transaction shape the relay ever submits: a
//! single native-asset payment from the app wallet, with a text memo
//! carrying the payment identifier.

use crate::keypair::Keypair;
use relay_core::{PaymentError, PaymentResult};
use sha2::{Digest, Sha256};

const KEY_TYPE_ED25519: i32 = 0;
const PRECOND_TIME: i32 = 1;
const MEMO_TEXT: i32 = 1;
const OPERATION_PAYMENT: i32 = 1;
const ASSET_TYPE_NATIVE: i32 = 0;
const ENVELOPE_TYPE_TX: i32 = 2;

/// Longest memo the ledger accepts, in bytes
pub const MAX_MEMO_BYTES: usize = 28;

#[derive(Default)]
struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn fixed_opaque(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.pad(bytes.len());
    }

    fn var_opaque(&mut self, bytes: &[u8]) {
        self.u32(bytes.len() as u32);
        self.fixed_opaque(bytes);
    }

    fn pad(&mut self, len: usize) {
        let rem = len % 4;
        if rem != 0 {
            self.buf.extend(std::iter::repeat(0u8).take(4 - rem));
        }
    }

    fn muxed_account(&mut self, key: &[u8; 32]) {
        self.i32(KEY_TYPE_ED25519);
        self.fixed_opaque(key);
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// A single-payment transaction from the app wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPayment {
    pub source: [u8; 32],
    pub destination: [u8; 32],
    /// Total fee in stroops
    pub fee: u32,
    /// Account sequence number this transaction consumes
    pub sequence: i64,
    pub min_time: u64,
    pub max_time: u64,
    pub memo: String,
    pub amount_stroops: i64,
}

impl LedgerPayment {
    /// XDR of the `Transaction` body.
    pub fn to_xdr(&self) -> PaymentResult<Vec<u8>> {
        if self.memo.len() > MAX_MEMO_BYTES {
            return Err(PaymentError::Ledger(format!(
                "memo '{}' exceeds {} bytes",
                self.memo, MAX_MEMO_BYTES
            )));
        }

        let mut w = XdrWriter::default();
        w.muxed_account(&self.source);
        w.u32(self.fee);
        w.i64(self.sequence);

        w.i32(PRECOND_TIME);
        w.u64(self.min_time);
        w.u64(self.max_time);

        w.i32(MEMO_TEXT);
        w.var_opaque(self.memo.as_bytes());

        // One operation, no per-operation source account
        w.u32(1);
        w.u32(0);
        w.i32(OPERATION_PAYMENT);
        w.muxed_account(&self.destination);
        w.i32(ASSET_TYPE_NATIVE);
        w.i64(self.amount_stroops);

        // ext
        w.i32(0);

        Ok(w.into_bytes())
    }

    /// Transaction hash under the given network passphrase.
    pub fn hash(&self, network_passphrase: &str) -> PaymentResult<[u8; 32]> {
        let network_id = Sha256::digest(network_passphrase.as_bytes());

        let mut hasher = Sha256::new();
        hasher.update(network_id);
        hasher.update(ENVELOPE_TYPE_TX.to_be_bytes());
        hasher.update(self.to_xdr()?);
        Ok(hasher.finalize().into())
    }

    /// Sign and wrap into a `TransactionEnvelope`.
    pub fn sign(&self, keypair: &Keypair, network_passphrase: &str) -> PaymentResult<SignedEnvelope> {
        let hash = self.hash(network_passphrase)?;
        let signature = keypair.sign(&hash);

        let mut w = XdrWriter::default();
        w.i32(ENVELOPE_TYPE_TX);
        w.buf.extend_from_slice(&self.to_xdr()?);
        w.u32(1);
        w.fixed_opaque(&keypair.hint());
        w.var_opaque(&signature);

        Ok(SignedEnvelope {
            hash,
            xdr: w.into_bytes(),
        })
    }
}

/// A signed transaction ready for submission
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    pub hash: [u8; 32],
    pub xdr: Vec<u8>,
}

impl SignedEnvelope {
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.xdr)
    }

    /// Hex transaction id
    pub fn txid(&self) -> String {
        hex::encode(self.hash)
    }
}
