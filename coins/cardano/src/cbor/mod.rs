//! Canonical CBOR codec producing ledger-exact bytes.
//!
//! Integers are always written in their shortest form, which places every value up to
//! 2^53-1 in the native short encodings and larger values in the explicit 8-byte form.
//! Unsigned fields (coins, output quantities) may use the whole `u64` range; signed fields
//! (mint, datum and metadata integers) are limited to `i64`. Anything beyond is rejected
//! with [`CardanoError::NumberTooBig`] at encode time.

pub mod decode;
pub mod encode;
pub mod plutus_data;

use minicbor::data::Int;
use minicbor::Encoder;

use crate::error::{CardanoError, Result};

pub use plutus_data::{FromPlutusData, PlutusData, ToPlutusData};

pub(crate) type CborEncoder = Encoder<Vec<u8>>;

/// Largest value a CBOR unsigned integer can carry.
pub const MAX_WIRE_INT: i128 = u64::MAX as i128;
/// Smallest value a CBOR negative integer can carry.
pub const MIN_WIRE_INT: i128 = -(u64::MAX as i128) - 1;
/// Bounds of signed ledger integers (mint quantities, datums, metadata).
pub const MAX_SIGNED_INT: i128 = i64::MAX as i128;
pub const MIN_SIGNED_INT: i128 = i64::MIN as i128;

/// Stand-in for scalars that are not fixed yet when sizing a transaction. It is the largest
/// value still exact in an IEEE double and takes the full 9-byte integer form.
pub const WORST_CASE_UINT: u64 = 9_007_199_254_740_991;

pub(crate) fn new_encoder() -> CborEncoder {
    Encoder::new(Vec::new())
}

pub(crate) fn check_range(value: i128) -> Result<()> {
    if (MIN_WIRE_INT..=MAX_WIRE_INT).contains(&value) {
        Ok(())
    } else {
        Err(CardanoError::NumberTooBig(value.to_string()))
    }
}

pub(crate) fn check_signed_range(value: i128) -> Result<()> {
    if (MIN_SIGNED_INT..=MAX_SIGNED_INT).contains(&value) {
        Ok(())
    } else {
        Err(CardanoError::NumberTooBig(value.to_string()))
    }
}

/// Writes a signed integer in canonical form.
pub(crate) fn encode_int(e: &mut CborEncoder, value: i128) -> Result<()> {
    check_signed_range(value)?;
    let int = Int::try_from(value).map_err(|_| CardanoError::NumberTooBig(value.to_string()))?;
    e.int(int)?;
    Ok(())
}

/// Writes a non-negative amount (coin, quantity) as an unsigned integer.
pub(crate) fn encode_uint(e: &mut CborEncoder, value: i128) -> Result<()> {
    check_range(value)?;
    if value < 0 {
        return Err(CardanoError::SerializationError(format!(
            "negative amount {} where an unsigned value is required",
            value
        )));
    }
    let value = u64::try_from(value).map_err(|_| CardanoError::NumberTooBig(value.to_string()))?;
    e.u64(value)?;
    Ok(())
}

/// Length of the CBOR encoding of an unsigned integer.
pub fn uint_size(value: u64) -> usize {
    match value {
        0..=23 => 1,
        24..=0xff => 2,
        0x100..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}
