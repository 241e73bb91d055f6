use std::fmt;

use base58::{FromBase58, ToBase58};
use bech32::{Bech32, Hrp};
use minicbor::data::Type;
use minicbor::Decoder;

use crate::config::{AddressType, MAINNET_NETWORK_ID};
use crate::error::{CardanoError, Result};
use crate::hash::blake2b_224;

/// Blake2b-224 hash of an Ed25519 verification key.
pub type KeyHash = [u8; 28];

/// Payment or stake credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Credential {
    Key(KeyHash),
    Script([u8; 28]),
}

impl Credential {
    pub fn hash(&self) -> &[u8; 28] {
        match self {
            Credential::Key(hash) | Credential::Script(hash) => hash,
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Credential::Script(_))
    }

    pub fn key_hash(&self) -> Option<&KeyHash> {
        match self {
            Credential::Key(hash) => Some(hash),
            Credential::Script(_) => None,
        }
    }
}

/// Cardano address in its raw binary form.
///
/// Shelley addresses are identified by the header nibble, Byron (bootstrap) addresses by
/// their CBOR envelope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    bytes: Vec<u8>,
}

impl Address {
    /// Parses raw address bytes, validating the header and length.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let header = *bytes
            .first()
            .ok_or_else(|| CardanoError::InvalidAddress("empty address".to_string()))?;
        let valid = match header >> 4 {
            0..=3 => bytes.len() == 57,
            4 | 5 => bytes.len() >= 32,
            6 | 7 | 14 | 15 => bytes.len() == 29,
            8 => byron_payload(&bytes).is_ok(),
            other => {
                return Err(CardanoError::InvalidAddress(format!(
                    "unknown address header type {}",
                    other
                )))
            }
        };
        if !valid {
            return Err(CardanoError::InvalidAddress(format!(
                "malformed address {}",
                hex::encode(&bytes)
            )));
        }
        Ok(Self { bytes })
    }

    pub fn from_hex(address: &str) -> Result<Self> {
        let bytes =
            hex::decode(address).map_err(|e| CardanoError::InvalidAddress(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Parses a bech32 Shelley address (`addr...`, `stake...`).
    pub fn from_bech32(address: &str) -> Result<Self> {
        let (hrp, data) =
            bech32::decode(address).map_err(|e| CardanoError::InvalidAddress(e.to_string()))?;
        let hrp = hrp.as_str();
        if !hrp.starts_with("addr") && !hrp.starts_with("stake") {
            return Err(CardanoError::InvalidAddress(format!("unexpected prefix {}", hrp)));
        }
        Self::from_bytes(data)
    }

    /// Parses a base58 Byron address (`Ae2...`, `DdzFF...`).
    pub fn from_base58(address: &str) -> Result<Self> {
        let bytes = address
            .from_base58()
            .map_err(|e| CardanoError::InvalidAddress(format!("base58: {:?}", e)))?;
        let parsed = Self::from_bytes(bytes)?;
        if parsed.address_type() != AddressType::Byron {
            return Err(CardanoError::InvalidAddress(
                "base58 encoding is only used by Byron addresses".to_string(),
            ));
        }
        Ok(parsed)
    }

    /// Parses either text encoding.
    pub fn parse(address: &str) -> Result<Self> {
        if address.starts_with("addr") || address.starts_with("stake") {
            Self::from_bech32(address)
        } else {
            Self::from_base58(address)
        }
    }

    /// Enterprise address (payment part only, no staking rights).
    pub fn enterprise(payment: Credential, network_id: u8) -> Self {
        let type_nibble = if payment.is_script() { 0x70 } else { 0x60 };
        let mut bytes = Vec::with_capacity(29);
        bytes.push(type_nibble | (network_id & 0x0F));
        bytes.extend_from_slice(payment.hash());
        Self { bytes }
    }

    /// Base address (payment + staking).
    pub fn base(payment: Credential, stake: Credential, network_id: u8) -> Self {
        let type_nibble = match (payment.is_script(), stake.is_script()) {
            (false, false) => 0x00,
            (true, false) => 0x10,
            (false, true) => 0x20,
            (true, true) => 0x30,
        };
        let mut bytes = Vec::with_capacity(57);
        bytes.push(type_nibble | (network_id & 0x0F));
        bytes.extend_from_slice(payment.hash());
        bytes.extend_from_slice(stake.hash());
        Self { bytes }
    }

    /// Reward (stake) address.
    pub fn reward(stake: Credential, network_id: u8) -> Self {
        let type_nibble = if stake.is_script() { 0xF0 } else { 0xE0 };
        let mut bytes = Vec::with_capacity(29);
        bytes.push(type_nibble | (network_id & 0x0F));
        bytes.extend_from_slice(stake.hash());
        Self { bytes }
    }

    /// Hash a public key using Blake2b-224
    pub fn hash_key(pubkey: &[u8]) -> KeyHash {
        blake2b_224(pubkey)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn header(&self) -> u8 {
        self.bytes[0]
    }

    pub fn address_type(&self) -> AddressType {
        match self.header() >> 4 {
            0..=3 => AddressType::Base,
            4 | 5 => AddressType::Pointer,
            6 | 7 => AddressType::Enterprise,
            14 | 15 => AddressType::Reward,
            _ => AddressType::Byron,
        }
    }

    /// Network id of a Shelley address. Byron addresses carry a protocol magic instead.
    pub fn network_id(&self) -> Option<u8> {
        match self.address_type() {
            AddressType::Byron => None,
            _ => Some(self.header() & 0x0F),
        }
    }

    pub fn is_byron(&self) -> bool {
        self.address_type() == AddressType::Byron
    }

    pub fn payment_credential(&self) -> Option<Credential> {
        let header_type = self.header() >> 4;
        if !matches!(header_type, 0..=7) {
            return None;
        }
        let hash = self.hash_at(1)?;
        if header_type % 2 == 1 {
            Some(Credential::Script(hash))
        } else {
            Some(Credential::Key(hash))
        }
    }

    pub fn stake_credential(&self) -> Option<Credential> {
        match self.header() >> 4 {
            0 | 1 => self.hash_at(29).map(Credential::Key),
            2 | 3 => self.hash_at(29).map(Credential::Script),
            14 => self.hash_at(1).map(Credential::Key),
            15 => self.hash_at(1).map(Credential::Script),
            _ => None,
        }
    }

    fn hash_at(&self, offset: usize) -> Option<[u8; 28]> {
        self.bytes.get(offset..offset + 28)?.try_into().ok()
    }

    /// True for addresses locked by a script payment credential.
    pub fn is_script(&self) -> bool {
        self.payment_credential()
            .map(|credential| credential.is_script())
            .unwrap_or(false)
    }

    /// True when the address delegates stake (base and pointer addresses).
    pub fn has_staking_part(&self) -> bool {
        matches!(self.address_type(), AddressType::Base | AddressType::Pointer)
    }

    /// Raw CBOR of the Byron address attributes, needed to size bootstrap witnesses.
    pub fn byron_attributes(&self) -> Result<Vec<u8>> {
        if !self.is_byron() {
            return Err(CardanoError::InvalidAddress("not a Byron address".to_string()));
        }
        let payload = byron_payload(&self.bytes)?;
        let mut d = Decoder::new(&payload);
        d.array()?;
        d.bytes()?;
        let start = d.position();
        d.skip()?;
        let end = d.position();
        Ok(payload[start..end].to_vec())
    }

    /// Text encoding: bech32 for Shelley addresses, base58 for Byron.
    pub fn to_bech32(&self) -> Result<String> {
        if self.is_byron() {
            return Ok(self.bytes.to_base58());
        }
        let mainnet = self.network_id() == Some(MAINNET_NETWORK_ID);
        let prefix = match (self.address_type(), mainnet) {
            (AddressType::Reward, true) => "stake",
            (AddressType::Reward, false) => "stake_test",
            (_, true) => "addr",
            (_, false) => "addr_test",
        };
        let hrp = Hrp::parse(prefix).map_err(|e| CardanoError::InvalidAddress(e.to_string()))?;
        bech32::encode::<Bech32>(hrp, &self.bytes)
            .map_err(|e| CardanoError::InvalidAddress(e.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bech32() {
            Ok(text) => write!(f, "{}", text),
            Err(_) => write!(f, "{}", hex::encode(&self.bytes)),
        }
    }
}

/// Unwraps `[#6.24(bytes .cbor payload), crc32]` and checks the payload shape.
fn byron_payload(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut d = Decoder::new(bytes);
    if d.array()? != Some(2) {
        return Err(CardanoError::InvalidAddress("byron envelope".to_string()));
    }
    if d.tag()?.as_u64() != 24 {
        return Err(CardanoError::InvalidAddress("byron payload tag".to_string()));
    }
    let payload = d.bytes()?.to_vec();
    d.u32()?;

    let mut inner = Decoder::new(&payload);
    if inner.array()? != Some(3) {
        return Err(CardanoError::InvalidAddress("byron payload".to_string()));
    }
    if inner.bytes()?.len() != 28 {
        return Err(CardanoError::InvalidAddress("byron root".to_string()));
    }
    if inner.datatype()? != Type::Map {
        return Err(CardanoError::InvalidAddress("byron attributes".to_string()));
    }
    inner.skip()?;
    inner.u8()?;
    Ok(payload)
}
