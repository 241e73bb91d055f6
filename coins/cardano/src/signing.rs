//! Witnessing a solved plan with Ed25519 payment keys.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH};

use crate::address::{Address, KeyHash};
use crate::cbor::encode;
use crate::error::{CardanoError, Result};
use crate::fee::collect_signers;
use crate::plan::TxPlan;

/// Source of Ed25519 signatures for one payment or stake key.
pub trait CryptoProvider: Send + Sync {
    fn public_key(&self) -> [u8; 32];

    fn sign(&self, message: &[u8]) -> [u8; 64];

    fn key_hash(&self) -> KeyHash {
        Address::hash_key(&self.public_key())
    }
}

/// In-memory Ed25519 key.
pub struct Ed25519KeyStore {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Ed25519KeyStore {
    pub fn from_private_key(private_key: &[u8]) -> Result<Self> {
        let bytes: [u8; SECRET_KEY_LENGTH] = private_key.try_into().map_err(|_| {
            CardanoError::Signing(format!(
                "private key must be {} bytes, got {}",
                SECRET_KEY_LENGTH,
                private_key.len()
            ))
        })?;
        let signing_key = SigningKey::from_bytes(&bytes);
        let verifying_key = signing_key.verifying_key();
        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// Hex-encoded private key, with or without a `0x` prefix.
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self> {
        let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = hex::decode(hex_key).map_err(|e| CardanoError::Signing(e.to_string()))?;
        Self::from_private_key(&bytes)
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.as_bytes())
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        verify_signature(self.verifying_key.as_bytes(), message, signature)
    }
}

impl CryptoProvider for Ed25519KeyStore {
    fn public_key(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

/// Checks an Ed25519 signature. Malformed keys or signatures simply fail.
pub fn verify_signature(public_key: &[u8; 32], message: &[u8], signature: &[u8]) -> bool {
    let Ok(signature) = <[u8; 64]>::try_from(signature) else {
        return false;
    };
    match VerifyingKey::from_bytes(public_key) {
        Ok(key) => key.verify(message, &Signature::from_bytes(&signature)).is_ok(),
        Err(_) => false,
    }
}

/// Checks a vkey witness against a transaction id.
pub fn verify_witness(public_key: &[u8; 32], signature: &[u8; 64], tx_id: &[u8; 32]) -> bool {
    verify_signature(public_key, tx_id, signature)
}

/// A fully witnessed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx_id: [u8; 32],
    pub bytes: Vec<u8>,
}

impl SignedTransaction {
    pub fn tx_id_hex(&self) -> String {
        hex::encode(self.tx_id)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

/// Signs the transaction id with one key per required signer and serializes the result.
///
/// Every distinct key hash the plan needs must be covered by `providers`. Byron inputs are
/// rejected: bootstrap witnesses need an extended key with its chain code.
pub fn sign_tx_plan(plan: &TxPlan, providers: &[&dyn CryptoProvider]) -> Result<SignedTransaction> {
    let signers = collect_signers(plan);
    if let Some(address) = signers.byron.iter().next() {
        return Err(CardanoError::Signing(format!(
            "bootstrap witness required for {}",
            address
        )));
    }

    let tx_id = plan.tx_id()?;
    let mut witnesses = plan.witness_skeleton();
    for key_hash in &signers.shelley {
        let provider = providers
            .iter()
            .find(|provider| provider.key_hash() == *key_hash)
            .ok_or_else(|| {
                CardanoError::Signing(format!("no key for signer {}", hex::encode(key_hash)))
            })?;
        witnesses
            .vkey_witnesses
            .push((provider.public_key(), provider.sign(&tx_id)));
    }

    let body = plan.body_bytes()?;
    let witness_bytes = encode::witness_set_bytes(&witnesses)?;
    let aux = plan.auxiliary_data_bytes()?;
    let bytes = encode::transaction_bytes(&body, &witness_bytes, aux.as_deref())?;
    Ok(SignedTransaction { tx_id, bytes })
}
