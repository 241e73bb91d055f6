//! # WalletD Cardano
//!
//! Cardano (ADA) transaction planning for the WalletD SDK.
//!
//! ## Features
//!
//! - Canonical CBOR for transaction bodies, witness sets and Plutus data
//! - Minimum-UTxO and linear fee computation, including script execution costs
//! - Greedy and strict change / collateral solving
//! - Script data (integrity) hashing over redeemers, datums and cost models
//! - Two-phase planning against an external script evaluator, with a TTL cache
//! - Ed25519 witnessing of the resulting transaction
//!
//! ## Example
//!
//! ```rust,no_run
//! use walletd_cardano::{
//!     plan_transaction, Address, PlanRequest, PlannerConfig, ProtocolParameters, TxOutput,
//!     Utxo,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let change = Address::parse("addr1vx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzers66hrl8")?;
//!     let payee = Address::parse("addr1vpu5vlrf4xkxv2qpwngf6cjhtw542ayty80v8dyr49rf5eg0yu80w")?;
//!     let utxos: Vec<Utxo> = Vec::new(); // fetched from a chain indexer
//!
//!     let request = PlanRequest::new(change, ProtocolParameters::babbage())
//!         .with_output(TxOutput::new(payee, 5_000_000));
//!     let plan = plan_transaction(&request, &utxos, &PlannerConfig::default())?;
//!     println!("fee: {} lovelace", plan.fee);
//!     Ok(())
//! }
//! ```
//!
//! ## Note on the UTxO Model
//!
//! Cardano uses a UTXO (Unspent Transaction Output) model similar to Bitcoin.
//! The fee depends on the transaction size, which depends on the change outputs,
//! which depend on the fee. The solver breaks the cycle by sizing transactions
//! with worst-case widths for every not-yet-known number.

pub mod address;
pub mod arrange;
pub mod cache;
pub mod cbor;
pub mod config;
pub mod draft;
pub mod error;
pub mod evaluation;
pub mod fee;
pub mod hash;
pub mod min_utxo;
pub mod plan;
pub mod protocol_params;
pub mod script_integrity;
pub mod signing;
pub mod solver;
pub mod token;
pub mod types;
pub mod validator;

pub use address::{Address, Credential, KeyHash};
pub use cache::{CachingOracle, TtlCache};
pub use cbor::{FromPlutusData, PlutusData, ToPlutusData};
pub use config::{
    AddressType, CacheConfig, PlannerConfig,
    MAINNET_NETWORK_ID, TESTNET_NETWORK_ID, LOVELACE_PER_ADA,
};
pub use error::{CardanoError, EvaluationError, PlanningError, TxPlanError, TxPlanFailure};
pub use evaluation::{plan_with_evaluation, EvaluatedRedeemer, ScriptEvaluationOracle};
pub use fee::{compute_min_fee, estimate_size};
pub use min_utxo::compute_min_utxo;
pub use plan::{PlanRequest, TxPlan, TxPlanDraft, TxPlanResult};
pub use protocol_params::{CostModel, CostModels, ProtocolParameters, UnitInterval};
pub use script_integrity::hash_script_integrity;
pub use signing::{sign_tx_plan, CryptoProvider, Ed25519KeyStore, SignedTransaction};
pub use solver::{plan_transaction, plan_transaction_strict};
pub use token::{AssetId, AssetName, PolicyId, Quantity, TokenBundle};
pub use types::{
    AuxiliaryData, Certificate, DatumOption, ExUnits, Language, Lovelace, Metadatum, MintEntry,
    NativeScript, Redeemer, RedeemerTag, RedeemerTarget, Script, TxHash, TxInput, TxOutput, Utxo,
    Withdrawal,
};
pub use validator::validate_plan;
