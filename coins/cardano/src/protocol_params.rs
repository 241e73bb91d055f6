//! Protocol parameter snapshot consumed by every solve.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CardanoError, Result};
use crate::types::{ExUnits, Language};

/// Exact rational used for execution unit prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInterval {
    pub numerator: u64,
    pub denominator: u64,
}

impl UnitInterval {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

/// Cost model parameters of one language, keyed by parameter name.
///
/// Names are kept in a `BTreeMap`, so iteration follows raw byte order of the keys, which is
/// the order the ledger serializes parameter values in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostModel(pub BTreeMap<String, i64>);

impl CostModel {
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.values().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, i64)> for CostModel {
    fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub type CostModels = BTreeMap<Language, CostModel>;

/// Ledger parameters relevant to transaction construction.
///
/// Exactly one of `coins_per_utxo_word` (Alonzo) and `coins_per_utxo_byte` (Babbage onward)
/// is normally present; the byte-based formula wins when both are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParameters {
    /// Per-byte fee coefficient.
    pub min_fee_a: u64,
    /// Constant fee term.
    pub min_fee_b: u64,
    pub max_tx_size: u64,
    pub max_value_size: u64,
    pub key_deposit: u64,
    pub pool_deposit: u64,
    #[serde(default)]
    pub coins_per_utxo_word: Option<u64>,
    #[serde(default)]
    pub coins_per_utxo_byte: Option<u64>,
    pub collateral_percentage: u64,
    pub max_collateral_inputs: u32,
    pub price_mem: UnitInterval,
    pub price_step: UnitInterval,
    #[serde(default)]
    pub max_tx_ex_units: Option<ExUnits>,
    #[serde(default)]
    pub cost_models: CostModels,
}

impl ProtocolParameters {
    /// Mainnet values at the Alonzo hard fork (word-based min-UTxO).
    pub fn alonzo() -> Self {
        Self {
            min_fee_a: 44,
            min_fee_b: 155_381,
            max_tx_size: 16_384,
            max_value_size: 5_000,
            key_deposit: 2_000_000,
            pool_deposit: 500_000_000,
            coins_per_utxo_word: Some(34_482),
            coins_per_utxo_byte: None,
            collateral_percentage: 150,
            max_collateral_inputs: 3,
            price_mem: UnitInterval::new(577, 10_000),
            price_step: UnitInterval::new(721, 10_000_000),
            max_tx_ex_units: Some(ExUnits::new(10_000_000, 10_000_000_000)),
            cost_models: CostModels::new(),
        }
    }

    /// Mainnet values from the Babbage era onward (byte-based min-UTxO).
    pub fn babbage() -> Self {
        Self {
            coins_per_utxo_word: None,
            coins_per_utxo_byte: Some(4_310),
            max_tx_ex_units: Some(ExUnits::new(14_000_000, 10_000_000_000)),
            ..Self::alonzo()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.coins_per_utxo_word.is_none() && self.coins_per_utxo_byte.is_none() {
            return Err(CardanoError::MissingProtocolParameter(
                "coins_per_utxo_word or coins_per_utxo_byte",
            ));
        }
        if self.price_mem.denominator == 0 || self.price_step.denominator == 0 {
            return Err(CardanoError::SerializationError(
                "execution price denominator must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_cost_model(mut self, language: Language, model: CostModel) -> Self {
        self.cost_models.insert(language, model);
        self
    }
}
