//! Script data hash (body field 11).
//!
//! `blake2b-256(redeemers ∥ datums ∥ language_views)`, where redeemers are always written
//! (an empty array when there are none), datums are omitted when there are none, and the
//! language views only cover languages whose scripts are in the transaction.

use std::collections::BTreeSet;

use crate::cbor::encode::{encode_datums, encode_redeemers};
use crate::cbor::{encode_int, new_encoder, PlutusData};
use crate::error::{CardanoError, Result};
use crate::hash::blake2b_256;
use crate::protocol_params::{CostModel, CostModels};
use crate::types::{Language, ResolvedRedeemer};

/// One `(key, value)` pair of the language view map, both already encoded.
fn language_view(language: Language, model: &CostModel) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut key = new_encoder();
    let mut value = new_encoder();
    match language {
        // PlutusV1 keeps the historical double-bagged layout: the key is the serialized
        // language id wrapped in a byte string, the value an indefinite list in a byte string.
        Language::PlutusV1 => {
            key.bytes(&[0x00])?;
            let mut params = new_encoder();
            params.begin_array()?;
            for param in model.values() {
                encode_int(&mut params, i128::from(param))?;
            }
            params.end()?;
            value.bytes(&params.into_writer())?;
        }
        Language::PlutusV2 | Language::PlutusV3 => {
            key.u8(if language == Language::PlutusV2 { 1 } else { 2 })?;
            value.array(model.len() as u64)?;
            for param in model.values() {
                encode_int(&mut value, i128::from(param))?;
            }
        }
    }
    Ok((key.into_writer(), value.into_writer()))
}

/// Canonical map of cost models for the given languages. Keys are ordered shortest first,
/// then by bytes.
pub fn language_views(cost_models: &CostModels, languages: &BTreeSet<Language>) -> Result<Vec<u8>> {
    let mut entries = Vec::with_capacity(languages.len());
    for language in languages {
        let model = cost_models
            .get(language)
            .ok_or(CardanoError::MissingProtocolParameter("cost_models"))?;
        entries.push(language_view(*language, model)?);
    }
    entries.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    let mut e = new_encoder();
    e.map(entries.len() as u64)?;
    for (key, value) in entries {
        e.writer_mut().extend_from_slice(&key);
        e.writer_mut().extend_from_slice(&value);
    }
    Ok(e.into_writer())
}

/// `None` when the transaction carries neither redeemers nor datums.
pub fn hash_script_integrity(
    redeemers: &[ResolvedRedeemer],
    datums: &[PlutusData],
    cost_models: &CostModels,
    languages: &BTreeSet<Language>,
) -> Result<Option<[u8; 32]>> {
    if redeemers.is_empty() && datums.is_empty() {
        return Ok(None);
    }
    let mut e = new_encoder();
    encode_redeemers(&mut e, redeemers)?;
    if !datums.is_empty() {
        encode_datums(&mut e, datums)?;
    }
    let mut preimage = e.into_writer();
    preimage.extend_from_slice(&language_views(cost_models, languages)?);
    Ok(Some(blake2b_256(&preimage)))
}
