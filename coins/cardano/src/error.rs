use std::convert::Infallible;

use thiserror::Error;

use crate::token::AssetId;
use crate::types::{Lovelace, RedeemerTag};

/// Hard errors raised by the codec and data layer.
///
/// These are programmer or data errors that no retry with different inputs can fix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardanoError {
    #[error("Number too big for the 64-bit wire range: {0}")]
    NumberTooBig(String),

    #[error("Constructor index {0} cannot be encoded (max 127)")]
    InvalidConstructorIndex(u64),

    #[error("Datum schema mismatch: expected {expected}, found {found}")]
    DatumSchema { expected: String, found: String },

    #[error("CBOR error: {0}")]
    Cbor(String),

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    #[error("Missing protocol parameter: {0}")]
    MissingProtocolParameter(&'static str),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Redeemer target not found in transaction: {0}")]
    UnresolvedRedeemer(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, CardanoError>;

impl From<minicbor::encode::Error<Infallible>> for CardanoError {
    fn from(err: minicbor::encode::Error<Infallible>) -> Self {
        CardanoError::Cbor(err.to_string())
    }
}

impl From<minicbor::decode::Error> for CardanoError {
    fn from(err: minicbor::decode::Error) -> Self {
        CardanoError::Cbor(err.to_string())
    }
}

impl From<serde_json::Error> for CardanoError {
    fn from(err: serde_json::Error) -> Self {
        CardanoError::SerializationError(err.to_string())
    }
}

/// Reasons a transaction plan cannot be produced.
///
/// Plan construction routinely fails and is retried by the caller with different inputs,
/// so these are values, not panics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxPlanError {
    #[error("Insufficient funds: required {required} lovelace, available {available}")]
    InsufficientFunds { required: Lovelace, available: Lovelace },

    #[error("Insufficient tokens: {0}")]
    InsufficientTokens(AssetId),

    #[error("Insufficient collateral: required {required} lovelace")]
    InsufficientCollateral { required: Lovelace },

    #[error("Too many collateral inputs (max {max})")]
    TooManyCollateralInputs { max: u32 },

    #[error("Change output too small: {coins} lovelace, minimum {min}")]
    ChangeOutputTooSmall { coins: Lovelace, min: Lovelace },

    #[error("Output too small: {coins} lovelace, minimum {min}")]
    OutputTooSmall { coins: Lovelace, min: Lovelace },

    #[error("Output value too big: {size} bytes, max {max}")]
    OutputTooBig { size: u64, max: u64 },

    #[error("Transaction too big: {size} bytes, max {max}")]
    TxTooBig { size: u64, max: u64 },

    #[error("Execution units exceed the per-transaction budget")]
    ExUnitsTooBig,

    #[error("Collateral inputs must hold ADA only")]
    BadCollaterals,

    #[error("Rewards balance {rewards} is lower than the fee {fee}")]
    RewardsBalanceTooLow { rewards: Lovelace, fee: Lovelace },

    #[error("Number too big: {0}")]
    NumberTooBig(String),

    #[error("No inputs available to build a transaction")]
    NoInputs,

    #[error(transparent)]
    Codec(CardanoError),
}

impl TxPlanError {
    /// Fatal errors are never retried with more inputs.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TxPlanError::NumberTooBig(_) | TxPlanError::Codec(_))
    }
}

impl From<CardanoError> for TxPlanError {
    fn from(err: CardanoError) -> Self {
        match err {
            CardanoError::NumberTooBig(value) => TxPlanError::NumberTooBig(value),
            other => TxPlanError::Codec(other),
        }
    }
}

/// A failed solve, with enough context for the caller to decide whether to add funds,
/// change outputs, or abort.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{error} (estimated fee {estimated_fee}, deposit {deposit}, minimal lovelace {minimal_lovelace_amount})")]
pub struct TxPlanFailure {
    pub error: TxPlanError,
    pub estimated_fee: Lovelace,
    pub deposit: Lovelace,
    pub minimal_lovelace_amount: Lovelace,
}

impl TxPlanFailure {
    pub fn new(error: TxPlanError) -> Self {
        Self {
            error,
            estimated_fee: 0,
            deposit: 0,
            minimal_lovelace_amount: 0,
        }
    }

    pub fn with_context(
        error: TxPlanError,
        estimated_fee: Lovelace,
        deposit: Lovelace,
        minimal_lovelace_amount: Lovelace,
    ) -> Self {
        Self {
            error,
            estimated_fee,
            deposit,
            minimal_lovelace_amount,
        }
    }
}

impl From<CardanoError> for TxPlanFailure {
    fn from(err: CardanoError) -> Self {
        TxPlanFailure::new(err.into())
    }
}

/// Failures of the external script evaluation oracle.
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Evaluation oracle failed: {0}")]
    Oracle(#[from] anyhow::Error),

    #[error("Script evaluation rejected the transaction: {0}")]
    Rejected(String),

    #[error("Oracle returned no execution units for redeemer {tag:?} #{index}")]
    MissingRedeemer { tag: RedeemerTag, index: u32 },
}

/// Outcome of two-phase planning: solver failures and oracle failures stay distinct.
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("Transaction planning failed: {0}")]
    Solver(#[from] TxPlanFailure),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Codec(#[from] CardanoError),
}
