//! Minimum coin an output must carry.
//!
//! Two ledger formulas exist and the one used is selected by which coefficient the
//! protocol parameters carry:
//!
//! - word-based (Alonzo): `coinsPerWord * (27 + valueSize + (10 if datum hash))`, where
//!   `valueSize` is 2 for an ADA-only value and otherwise
//!   `6 + ceil((12 * assets + assetNameBytes + 28 * policies) / 8)`;
//! - byte-based (Babbage onward): `coinsPerByte * (len(output with coin = 0) + 164)`.

use crate::cbor::encode::output_bytes;
use crate::error::{CardanoError, Result};
use crate::protocol_params::ProtocolParameters;
use crate::token::TokenBundle;
use crate::types::{Lovelace, TxOutput};

const UTXO_ENTRY_SIZE_WITHOUT_VALUE: i128 = 27;
const DATUM_HASH_WORDS: i128 = 10;
const ADA_ONLY_VALUE_WORDS: i128 = 2;
const OUTPUT_OVERHEAD_BYTES: i128 = 164;

/// Size of a token bundle in 8-byte words, as the Alonzo rule counts it.
pub fn value_size_words(bundle: &TokenBundle) -> i128 {
    if bundle.is_empty() {
        return ADA_ONLY_VALUE_WORDS;
    }
    let assets = bundle.len() as i128;
    let policies = bundle.policy_count() as i128;
    let name_bytes = bundle.asset_name_bytes() as i128;
    let bytes = 12 * assets + name_bytes + 28 * policies;
    6 + (bytes + 7) / 8
}

pub fn compute_min_utxo(output: &TxOutput, params: &ProtocolParameters) -> Result<Lovelace> {
    if let Some(coins_per_byte) = params.coins_per_utxo_byte {
        let zero_coin = TxOutput {
            coins: 0,
            ..output.clone()
        };
        let size = output_bytes(&zero_coin)?.len() as i128;
        return Ok(Lovelace::from(coins_per_byte) * (size + OUTPUT_OVERHEAD_BYTES));
    }
    if let Some(coins_per_word) = params.coins_per_utxo_word {
        let datum_words = if output.has_datum_hash() { DATUM_HASH_WORDS } else { 0 };
        let words = UTXO_ENTRY_SIZE_WITHOUT_VALUE + value_size_words(&output.token_bundle) + datum_words;
        return Ok(Lovelace::from(coins_per_word) * words);
    }
    Err(CardanoError::MissingProtocolParameter(
        "coins_per_utxo_word or coins_per_utxo_byte",
    ))
}
