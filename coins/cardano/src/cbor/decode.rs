//! Decoders for fetched transaction outputs.
//!
//! Outputs decoded here re-encode to the same bytes as long as the source was canonical.

use minicbor::data::Type;
use minicbor::Decoder;

use crate::address::Address;
use crate::cbor::plutus_data::collect_bytes;
use crate::cbor::PlutusData;
use crate::error::{CardanoError, Result};
use crate::token::{AssetId, AssetName, PolicyId, TokenBundle};
use crate::types::{DatumOption, Lovelace, NativeScript, Script, TxOutput};

fn unexpected(what: &str, found: impl std::fmt::Display) -> CardanoError {
    CardanoError::Cbor(format!("expected {}, found {}", what, found))
}

fn definite_array(d: &mut Decoder<'_>, what: &str) -> Result<u64> {
    d.array()?
        .ok_or_else(|| unexpected(what, "indefinite array"))
}

fn hash_32(d: &mut Decoder<'_>) -> Result<[u8; 32]> {
    let bytes = d.bytes()?;
    bytes
        .try_into()
        .map_err(|_| unexpected("32-byte hash", format!("{} bytes", bytes.len())))
}

fn hash_28(d: &mut Decoder<'_>) -> Result<[u8; 28]> {
    let bytes = d.bytes()?;
    bytes
        .try_into()
        .map_err(|_| unexpected("28-byte hash", format!("{} bytes", bytes.len())))
}

pub fn decode_multiasset(d: &mut Decoder<'_>) -> Result<TokenBundle> {
    let mut bundle = TokenBundle::new();
    let policies = d.map()?.ok_or_else(|| unexpected("multiasset map", "indefinite map"))?;
    for _ in 0..policies {
        let policy_id = PolicyId(hash_28(d)?);
        let assets = d.map()?.ok_or_else(|| unexpected("asset map", "indefinite map"))?;
        for _ in 0..assets {
            let asset_name = AssetName::new(d.bytes()?.to_vec())?;
            let quantity = i128::from(d.int()?);
            bundle.add(AssetId::new(policy_id, asset_name), quantity);
        }
    }
    Ok(bundle)
}

pub fn decode_value(d: &mut Decoder<'_>) -> Result<(Lovelace, TokenBundle)> {
    match d.datatype()? {
        Type::Array => {
            if definite_array(d, "value")? != 2 {
                return Err(unexpected("[coin, multiasset]", "other arity"));
            }
            let coins = Lovelace::from(d.u64()?);
            let bundle = decode_multiasset(d)?;
            Ok((coins, bundle))
        }
        _ => Ok((Lovelace::from(d.u64()?), TokenBundle::new())),
    }
}

pub fn decode_native_script(d: &mut Decoder<'_>) -> Result<NativeScript> {
    let len = definite_array(d, "native script")?;
    let script = match (d.u8()?, len) {
        (0, 2) => NativeScript::Pubkey(hash_28(d)?),
        (1, 2) => NativeScript::All(decode_native_scripts(d)?),
        (2, 2) => NativeScript::Any(decode_native_scripts(d)?),
        (3, 3) => {
            let n = d.u32()?;
            NativeScript::NOfK(n, decode_native_scripts(d)?)
        }
        (4, 2) => NativeScript::InvalidBefore(d.u64()?),
        (5, 2) => NativeScript::InvalidHereafter(d.u64()?),
        (tag, len) => {
            return Err(unexpected(
                "native script",
                format!("tag {} with {} items", tag, len),
            ))
        }
    };
    Ok(script)
}

fn decode_native_scripts(d: &mut Decoder<'_>) -> Result<Vec<NativeScript>> {
    let len = definite_array(d, "native script list")?;
    (0..len).map(|_| decode_native_script(d)).collect()
}

fn decode_script_ref(d: &mut Decoder<'_>) -> Result<Script> {
    let tag = d.tag()?.as_u64();
    if tag != 24 {
        return Err(unexpected("tag 24", tag));
    }
    let inner = d.bytes()?;
    let mut d = Decoder::new(inner);
    if definite_array(&mut d, "script")? != 2 {
        return Err(unexpected("[type, script]", "other arity"));
    }
    let script = match d.u8()? {
        0 => Script::Native(decode_native_script(&mut d)?),
        1 => Script::PlutusV1(d.bytes()?.to_vec()),
        2 => Script::PlutusV2(d.bytes()?.to_vec()),
        3 => Script::PlutusV3(d.bytes()?.to_vec()),
        other => return Err(unexpected("script type", other)),
    };
    Ok(script)
}

fn decode_datum_option(d: &mut Decoder<'_>) -> Result<DatumOption> {
    if definite_array(d, "datum option")? != 2 {
        return Err(unexpected("[kind, datum]", "other arity"));
    }
    match d.u8()? {
        0 => Ok(DatumOption::Hash(hash_32(d)?)),
        1 => {
            let tag = d.tag()?.as_u64();
            if tag != 24 {
                return Err(unexpected("tag 24", tag));
            }
            let bytes = collect_bytes(d)?;
            Ok(DatumOption::Inline(PlutusData::from_bytes(&bytes)?))
        }
        other => Err(unexpected("datum option kind", other)),
    }
}

/// Decodes a legacy array output or a map-shaped output.
pub fn decode_output(d: &mut Decoder<'_>) -> Result<TxOutput> {
    match d.datatype()? {
        Type::Array => {
            let len = definite_array(d, "output")?;
            if !(2..=3).contains(&len) {
                return Err(unexpected("2 or 3 output fields", len));
            }
            let address = Address::from_bytes(d.bytes()?.to_vec())?;
            let (coins, bundle) = decode_value(d)?;
            let mut output = TxOutput::new(address, coins).with_tokens(bundle);
            if len == 3 {
                output.datum = Some(DatumOption::Hash(hash_32(d)?));
            }
            Ok(output)
        }
        Type::Map => {
            let len = d.map()?.ok_or_else(|| unexpected("output map", "indefinite map"))?;
            let mut address = None;
            let mut value = None;
            let mut datum = None;
            let mut script_ref = None;
            for _ in 0..len {
                match d.u8()? {
                    0 => address = Some(Address::from_bytes(d.bytes()?.to_vec())?),
                    1 => value = Some(decode_value(d)?),
                    2 => datum = Some(decode_datum_option(d)?),
                    3 => script_ref = Some(decode_script_ref(d)?),
                    other => return Err(unexpected("output field", other)),
                }
            }
            let address = address.ok_or_else(|| unexpected("output address", "nothing"))?;
            let (coins, bundle) = value.ok_or_else(|| unexpected("output value", "nothing"))?;
            Ok(TxOutput {
                address,
                coins,
                token_bundle: bundle,
                datum,
                script_ref,
            })
        }
        other => Err(unexpected("output", other)),
    }
}

pub fn output_from_bytes(bytes: &[u8]) -> Result<TxOutput> {
    let mut d = Decoder::new(bytes);
    decode_output(&mut d)
}
