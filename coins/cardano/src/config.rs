use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{ExUnits, Lovelace};

/// Cardano network IDs
pub const MAINNET_NETWORK_ID: u8 = 1;
pub const TESTNET_NETWORK_ID: u8 = 0; // Preview/Preprod

/// Address types in Cardano
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressType {
    Base,       // Payment + staking key
    Enterprise, // Payment key only (no staking)
    Pointer,    // Payment + stake pool pointer
    Reward,     // Staking rewards address
    Byron,      // Legacy Byron addresses
}

/// Lovelace is the smallest unit (1 ADA = 1,000,000 Lovelace)
pub const LOVELACE_PER_ADA: Lovelace = 1_000_000;

/// Maximum number of distinct assets placed in one token change output.
pub const DEFAULT_MAX_OUTPUT_TOKENS: usize = 50;

/// Recommended collateral band used when reserving collateral candidates.
pub const DEFAULT_MIN_COLLATERAL: Lovelace = 2 * LOVELACE_PER_ADA;
pub const DEFAULT_MAX_COLLATERAL: Lovelace = 10 * LOVELACE_PER_ADA;

/// How many collateral candidates are kept out of the spendable pool.
pub const DEFAULT_MAX_RESERVED_COLLATERALS: usize = 3;

/// Planner policy knobs that are not protocol parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Token change is chunked into outputs of at most this many assets
    pub max_output_tokens: usize,
    /// Lower bound of the collateral band
    pub min_collateral_lovelace: Lovelace,
    /// Upper bound of the collateral band
    pub max_collateral_lovelace: Lovelace,
    /// Maximum number of reserved collateral candidates
    pub max_reserved_collaterals: usize,
    /// Execution units assumed per redeemer before evaluation.
    /// `None` splits the protocol per-transaction budget evenly.
    pub placeholder_ex_units: Option<ExUnits>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            min_collateral_lovelace: DEFAULT_MIN_COLLATERAL,
            max_collateral_lovelace: DEFAULT_MAX_COLLATERAL,
            max_reserved_collaterals: DEFAULT_MAX_RESERVED_COLLATERALS,
            placeholder_ex_units: None,
        }
    }
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_output_tokens(mut self, max: usize) -> Self {
        self.max_output_tokens = max;
        self
    }

    pub fn with_collateral_band(mut self, min: Lovelace, max: Lovelace) -> Self {
        self.min_collateral_lovelace = min;
        self.max_collateral_lovelace = max;
        self
    }

    pub fn with_max_reserved_collaterals(mut self, max: usize) -> Self {
        self.max_reserved_collaterals = max;
        self
    }

    pub fn with_placeholder_ex_units(mut self, ex_units: ExUnits) -> Self {
        self.placeholder_ex_units = Some(ex_units);
        self
    }

    /// Convert ADA to Lovelace
    pub fn ada_to_lovelace(ada: u64) -> Lovelace {
        Lovelace::from(ada) * LOVELACE_PER_ADA
    }
}

/// Evaluation cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an evaluation result stays valid
    pub ttl: Duration,
    /// Entries beyond this count evict expired entries first, then the oldest
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_entries: 1_024,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}
