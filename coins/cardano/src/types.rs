//! Ledger data model shared by the planner and the codec.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::{Address, Credential, KeyHash};
use crate::cbor::{check_signed_range, encode, PlutusData};
use crate::error::{CardanoError, Result};
use crate::hash::{blake2b_224, blake2b_256};
use crate::token::{AssetName, PolicyId, Quantity, TokenBundle};

/// Amount of ADA in lovelace. Signed so that differences and refunds stay representable.
pub type Lovelace = i128;

/// Maximum length of a metadata text or byte string.
pub const MAX_METADATUM_CHUNK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn from_hex(tx_hash: &str) -> Result<Self> {
        let bytes = hex::decode(tx_hash)
            .map_err(|e| CardanoError::SerializationError(format!("tx hash: {}", e)))?;
        let array: [u8; 32] = bytes.try_into().map_err(|_| {
            CardanoError::SerializationError("tx hash must be 32 bytes".to_string())
        })?;
        Ok(Self(array))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Reference to a previous transaction output. Ordered by hash bytes, then index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxInput {
    pub tx_hash: TxHash,
    pub output_index: u32,
}

/// Datum attached to an output: either its hash or the datum itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatumOption {
    Hash([u8; 32]),
    Inline(PlutusData),
}

/// Multisig / timelock script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeScript {
    Pubkey(KeyHash),
    All(Vec<NativeScript>),
    Any(Vec<NativeScript>),
    NOfK(u32, Vec<NativeScript>),
    InvalidBefore(u64),
    InvalidHereafter(u64),
}

impl NativeScript {
    /// Every key hash the script could require a signature from.
    pub fn key_hashes(&self) -> Vec<KeyHash> {
        let mut hashes = Vec::new();
        self.collect_key_hashes(&mut hashes);
        hashes
    }

    fn collect_key_hashes(&self, hashes: &mut Vec<KeyHash>) {
        match self {
            NativeScript::Pubkey(hash) => hashes.push(*hash),
            NativeScript::All(scripts)
            | NativeScript::Any(scripts)
            | NativeScript::NOfK(_, scripts) => {
                for script in scripts {
                    script.collect_key_hashes(hashes);
                }
            }
            NativeScript::InvalidBefore(_) | NativeScript::InvalidHereafter(_) => {}
        }
    }
}

/// Plutus language version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "PlutusV1")]
    PlutusV1,
    #[serde(rename = "PlutusV2")]
    PlutusV2,
    #[serde(rename = "PlutusV3")]
    PlutusV3,
}

/// Script carried in a witness set or as an output reference script.
/// Plutus variants hold the serialized script bytes as they appear in the witness set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    Native(NativeScript),
    PlutusV1(Vec<u8>),
    PlutusV2(Vec<u8>),
    PlutusV3(Vec<u8>),
}

impl Script {
    /// Ledger script type tag, also the hashing prefix.
    pub fn type_tag(&self) -> u8 {
        match self {
            Script::Native(_) => 0,
            Script::PlutusV1(_) => 1,
            Script::PlutusV2(_) => 2,
            Script::PlutusV3(_) => 3,
        }
    }

    pub fn language(&self) -> Option<Language> {
        match self {
            Script::Native(_) => None,
            Script::PlutusV1(_) => Some(Language::PlutusV1),
            Script::PlutusV2(_) => Some(Language::PlutusV2),
            Script::PlutusV3(_) => Some(Language::PlutusV3),
        }
    }

    pub fn is_plutus(&self) -> bool {
        self.language().is_some()
    }

    /// blake2b-224 over the type tag followed by the script bytes.
    pub fn hash(&self) -> Result<[u8; 28]> {
        let body = match self {
            Script::Native(script) => encode::native_script_bytes(script)?,
            Script::PlutusV1(bytes) | Script::PlutusV2(bytes) | Script::PlutusV3(bytes) => {
                bytes.clone()
            }
        };
        let mut preimage = Vec::with_capacity(body.len() + 1);
        preimage.push(self.type_tag());
        preimage.extend_from_slice(&body);
        Ok(blake2b_224(&preimage))
    }

    /// Policy id of a minting policy is the script hash.
    pub fn policy_id(&self) -> Result<PolicyId> {
        self.hash().map(PolicyId)
    }
}

/// Output to be created by a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub address: Address,
    pub coins: Lovelace,
    pub token_bundle: TokenBundle,
    pub datum: Option<DatumOption>,
    pub script_ref: Option<Script>,
}

impl TxOutput {
    pub fn new(address: Address, coins: Lovelace) -> Self {
        Self {
            address,
            coins,
            token_bundle: TokenBundle::new(),
            datum: None,
            script_ref: None,
        }
    }

    pub fn with_tokens(mut self, token_bundle: TokenBundle) -> Self {
        self.token_bundle = token_bundle;
        self
    }

    pub fn with_datum(mut self, datum: DatumOption) -> Self {
        self.datum = Some(datum);
        self
    }

    pub fn with_script_ref(mut self, script: Script) -> Self {
        self.script_ref = Some(script);
        self
    }

    /// Inline datums and reference scripts only exist in the map-shaped output.
    pub fn uses_map_format(&self) -> bool {
        matches!(self.datum, Some(DatumOption::Inline(_))) || self.script_ref.is_some()
    }

    pub fn has_datum_hash(&self) -> bool {
        matches!(self.datum, Some(DatumOption::Hash(_)))
    }
}

/// Unspent output owned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub tx_hash: TxHash,
    pub output_index: u32,
    pub address: Address,
    pub coins: Lovelace,
    pub token_bundle: TokenBundle,
    pub datum: Option<DatumOption>,
    pub script_ref: Option<Script>,
}

impl Utxo {
    pub fn new(tx_hash: TxHash, output_index: u32, address: Address, coins: Lovelace) -> Self {
        Self {
            tx_hash,
            output_index,
            address,
            coins,
            token_bundle: TokenBundle::new(),
            datum: None,
            script_ref: None,
        }
    }

    pub fn with_tokens(mut self, token_bundle: TokenBundle) -> Self {
        self.token_bundle = token_bundle;
        self
    }

    pub fn with_datum(mut self, datum: DatumOption) -> Self {
        self.datum = Some(datum);
        self
    }

    pub fn input(&self) -> TxInput {
        TxInput {
            tx_hash: self.tx_hash,
            output_index: self.output_index,
        }
    }

    pub fn is_ada_only(&self) -> bool {
        self.token_bundle.is_empty()
    }

    /// Locked by a script or carrying script data; spent last.
    pub fn is_script_utxo(&self) -> bool {
        self.address.is_script() || self.datum.is_some() || self.script_ref.is_some()
    }

    pub fn to_output(&self) -> TxOutput {
        TxOutput {
            address: self.address.clone(),
            coins: self.coins,
            token_bundle: self.token_bundle.clone(),
            datum: self.datum.clone(),
            script_ref: self.script_ref.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Certificate {
    StakeRegistration(Credential),
    StakeDeregistration(Credential),
    StakeDelegation {
        credential: Credential,
        pool_key_hash: KeyHash,
    },
}

impl Certificate {
    pub fn credential(&self) -> &Credential {
        match self {
            Certificate::StakeRegistration(credential)
            | Certificate::StakeDeregistration(credential)
            | Certificate::StakeDelegation { credential, .. } => credential,
        }
    }

    /// Registration needs no witness; the other certificates are signed by the stake key.
    pub fn requires_witness(&self) -> bool {
        !matches!(self, Certificate::StakeRegistration(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub reward_address: Address,
    pub amount: Lovelace,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExUnits {
    pub memory: u64,
    pub steps: u64,
}

impl ExUnits {
    pub const ZERO: ExUnits = ExUnits { memory: 0, steps: 0 };

    pub fn new(memory: u64, steps: u64) -> Self {
        Self { memory, steps }
    }

    pub fn saturating_add(self, other: ExUnits) -> Self {
        Self {
            memory: self.memory.saturating_add(other.memory),
            steps: self.steps.saturating_add(other.steps),
        }
    }

    pub fn fits_within(&self, budget: &ExUnits) -> bool {
        self.memory <= budget.memory && self.steps <= budget.steps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RedeemerTag {
    Spend = 0,
    Mint = 1,
    Cert = 2,
    Reward = 3,
}

/// What a redeemer unlocks, before input order is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemerTarget {
    Spend(TxInput),
    Mint(PolicyId),
    Cert(usize),
    Reward(Address),
}

impl RedeemerTarget {
    pub fn tag(&self) -> RedeemerTag {
        match self {
            RedeemerTarget::Spend(_) => RedeemerTag::Spend,
            RedeemerTarget::Mint(_) => RedeemerTag::Mint,
            RedeemerTarget::Cert(_) => RedeemerTag::Cert,
            RedeemerTarget::Reward(_) => RedeemerTag::Reward,
        }
    }
}

/// Redeemer as requested, with a provisional target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeemer {
    pub target: RedeemerTarget,
    pub data: PlutusData,
    pub ex_units: ExUnits,
}

/// Redeemer with its final `(tag, index)` pointer, as it appears in the witness set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRedeemer {
    pub tag: RedeemerTag,
    pub index: u32,
    pub data: PlutusData,
    pub ex_units: ExUnits,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintEntry {
    pub policy_id: PolicyId,
    pub asset_name: AssetName,
    pub quantity: Quantity,
}

/// Transaction metadata value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadatum {
    Int(i128),
    Bytes(Vec<u8>),
    Text(String),
    List(Vec<Metadatum>),
    Map(Vec<(Metadatum, Metadatum)>),
}

impl Metadatum {
    /// Text and byte strings are limited to 64 bytes each, integers to `i64`.
    pub fn validate(&self) -> Result<()> {
        match self {
            Metadatum::Int(value) => check_signed_range(*value),
            Metadatum::Bytes(bytes) if bytes.len() > MAX_METADATUM_CHUNK => Err(
                CardanoError::Metadata(format!("byte string of {} bytes", bytes.len())),
            ),
            Metadatum::Text(text) if text.len() > MAX_METADATUM_CHUNK => Err(
                CardanoError::Metadata(format!("text of {} bytes", text.len())),
            ),
            Metadatum::Bytes(_) | Metadatum::Text(_) => Ok(()),
            Metadatum::List(items) => items.iter().try_for_each(Metadatum::validate),
            Metadatum::Map(entries) => entries.iter().try_for_each(|(key, value)| {
                key.validate()?;
                value.validate()
            }),
        }
    }
}

/// Auxiliary data limited to the metadata map (labels to values).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxiliaryData {
    pub metadata: BTreeMap<u64, Metadatum>,
}

impl AuxiliaryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, label: u64, value: Metadatum) -> Self {
        self.metadata.insert(label, value);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.metadata.values().try_for_each(Metadatum::validate)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode::auxiliary_data_bytes(self)
    }

    /// Body field 7.
    pub fn hash(&self) -> Result<[u8; 32]> {
        Ok(blake2b_256(&self.to_bytes()?))
    }
}
