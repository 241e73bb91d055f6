//! Plutus datum values.
//!
//! Constructor applications are tagged `121 + index` for indices 0 to 6 and
//! `1280 + (index - 7)` for indices 7 to 127. Larger indices are refused rather than
//! truncated. Constructor fields and non-empty lists are written as indefinite arrays,
//! empty ones as the definite `0x80`. Byte strings longer than 64 bytes are split into an
//! indefinite string of 64-byte chunks.

use minicbor::data::{Tag, Type};
use minicbor::Decoder;

use crate::cbor::{check_signed_range, encode_int, new_encoder, CborEncoder};
use crate::error::{CardanoError, Result};
use crate::hash::blake2b_256;

pub const MAX_CONSTRUCTOR_INDEX: u64 = 127;
const BYTES_CHUNK: usize = 64;

const TAG_POSITIVE_BIGNUM: u64 = 2;
const TAG_NEGATIVE_BIGNUM: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusData {
    Constr { index: u64, fields: Vec<PlutusData> },
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Integer(i128),
    Bytes(Vec<u8>),
}

/// CBOR tag for a constructor index.
pub fn constructor_tag(index: u64) -> Result<u64> {
    match index {
        0..=6 => Ok(121 + index),
        7..=MAX_CONSTRUCTOR_INDEX => Ok(1280 + (index - 7)),
        _ => Err(CardanoError::InvalidConstructorIndex(index)),
    }
}

/// Constructor index for a CBOR tag, if the tag is a constructor tag.
pub fn constructor_index(tag: u64) -> Option<u64> {
    match tag {
        121..=127 => Some(tag - 121),
        1280..=1400 => Some(tag - 1280 + 7),
        _ => None,
    }
}

impl PlutusData {
    pub fn constr(index: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr { index, fields }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PlutusData::Constr { .. } => "constructor",
            PlutusData::Map(_) => "map",
            PlutusData::List(_) => "list",
            PlutusData::Integer(_) => "integer",
            PlutusData::Bytes(_) => "bytes",
        }
    }

    pub fn encode(&self, e: &mut CborEncoder) -> Result<()> {
        match self {
            PlutusData::Constr { index, fields } => {
                e.tag(Tag::new(constructor_tag(*index)?))?;
                encode_list(e, fields)?;
            }
            PlutusData::Map(entries) => {
                e.map(entries.len() as u64)?;
                for (key, value) in entries {
                    key.encode(e)?;
                    value.encode(e)?;
                }
            }
            PlutusData::List(items) => encode_list(e, items)?,
            PlutusData::Integer(value) => encode_int(e, *value)?,
            PlutusData::Bytes(bytes) => {
                if bytes.len() <= BYTES_CHUNK {
                    e.bytes(bytes)?;
                } else {
                    e.begin_bytes()?;
                    for chunk in bytes.chunks(BYTES_CHUNK) {
                        e.bytes(chunk)?;
                    }
                    e.end()?;
                }
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut e = new_encoder();
        self.encode(&mut e)?;
        Ok(e.into_writer())
    }

    /// Datum hash: blake2b-256 of the canonical encoding.
    pub fn hash(&self) -> Result<[u8; 32]> {
        Ok(blake2b_256(&self.to_bytes()?))
    }

    pub fn decode(d: &mut Decoder<'_>) -> Result<Self> {
        match d.datatype()? {
            Type::Tag => {
                let tag = d.tag()?.as_u64();
                if let Some(index) = constructor_index(tag) {
                    let fields = decode_list(d)?;
                    return Ok(PlutusData::Constr { index, fields });
                }
                match tag {
                    TAG_POSITIVE_BIGNUM | TAG_NEGATIVE_BIGNUM => {
                        let magnitude = collect_bytes(d)?;
                        decode_bignum(tag, &magnitude).map(PlutusData::Integer)
                    }
                    other => Err(CardanoError::Cbor(format!("unexpected datum tag {}", other))),
                }
            }
            Type::Map | Type::MapIndef => {
                let len = d.map()?;
                let mut entries = Vec::new();
                match len {
                    Some(n) => {
                        for _ in 0..n {
                            let key = PlutusData::decode(d)?;
                            let value = PlutusData::decode(d)?;
                            entries.push((key, value));
                        }
                    }
                    None => {
                        while !at_break(d)? {
                            let key = PlutusData::decode(d)?;
                            let value = PlutusData::decode(d)?;
                            entries.push((key, value));
                        }
                        skip_break(d);
                    }
                }
                Ok(PlutusData::Map(entries))
            }
            Type::Array | Type::ArrayIndef => decode_list(d).map(PlutusData::List),
            Type::Bytes | Type::BytesIndef => collect_bytes(d).map(PlutusData::Bytes),
            Type::U8
            | Type::U16
            | Type::U32
            | Type::U64
            | Type::I8
            | Type::I16
            | Type::I32
            | Type::I64
            | Type::Int => {
                let value = i128::from(d.int()?);
                check_signed_range(value)?;
                Ok(PlutusData::Integer(value))
            }
            other => Err(CardanoError::Cbor(format!("unexpected datum item {}", other))),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut d = Decoder::new(bytes);
        let data = PlutusData::decode(&mut d)?;
        if d.position() != bytes.len() {
            return Err(CardanoError::Cbor("trailing bytes after datum".to_string()));
        }
        Ok(data)
    }

    /// Fields of a constructor with the given index and arity.
    pub fn expect_constr(&self, index: u64, arity: usize) -> Result<&[PlutusData]> {
        match self {
            PlutusData::Constr {
                index: found,
                fields,
            } if *found == index && fields.len() == arity => Ok(fields),
            PlutusData::Constr {
                index: found,
                fields,
            } => Err(schema_error(
                format!("constructor {} with {} fields", index, arity),
                format!("constructor {} with {} fields", found, fields.len()),
            )),
            other => Err(schema_error(format!("constructor {}", index), other.kind())),
        }
    }

    pub fn expect_integer(&self) -> Result<i128> {
        match self {
            PlutusData::Integer(value) => Ok(*value),
            other => Err(schema_error("integer", other.kind())),
        }
    }

    pub fn expect_bytes(&self) -> Result<&[u8]> {
        match self {
            PlutusData::Bytes(bytes) => Ok(bytes),
            other => Err(schema_error("bytes", other.kind())),
        }
    }

    pub fn expect_list(&self) -> Result<&[PlutusData]> {
        match self {
            PlutusData::List(items) => Ok(items),
            other => Err(schema_error("list", other.kind())),
        }
    }
}

fn schema_error(expected: impl Into<String>, found: impl Into<String>) -> CardanoError {
    CardanoError::DatumSchema {
        expected: expected.into(),
        found: found.into(),
    }
}

fn encode_list(e: &mut CborEncoder, items: &[PlutusData]) -> Result<()> {
    if items.is_empty() {
        e.array(0)?;
        return Ok(());
    }
    e.begin_array()?;
    for item in items {
        item.encode(e)?;
    }
    e.end()?;
    Ok(())
}

fn decode_list(d: &mut Decoder<'_>) -> Result<Vec<PlutusData>> {
    let mut items = Vec::new();
    match d.array()? {
        Some(n) => {
            for _ in 0..n {
                items.push(PlutusData::decode(d)?);
            }
        }
        None => {
            while !at_break(d)? {
                items.push(PlutusData::decode(d)?);
            }
            skip_break(d);
        }
    }
    Ok(items)
}

pub(crate) fn at_break(d: &mut Decoder<'_>) -> Result<bool> {
    Ok(d.datatype()? == Type::Break)
}

pub(crate) fn skip_break(d: &mut Decoder<'_>) {
    d.set_position(d.position() + 1);
}

/// Reads a definite or indefinite byte string into one buffer.
pub(crate) fn collect_bytes(d: &mut Decoder<'_>) -> Result<Vec<u8>> {
    match d.datatype()? {
        Type::Bytes => Ok(d.bytes()?.to_vec()),
        Type::BytesIndef => {
            let mut bytes = Vec::new();
            for chunk in d.bytes_iter()? {
                bytes.extend_from_slice(chunk?);
            }
            Ok(bytes)
        }
        other => Err(CardanoError::Cbor(format!("expected bytes, found {}", other))),
    }
}

fn decode_bignum(tag: u64, magnitude: &[u8]) -> Result<i128> {
    let digits: Vec<u8> = magnitude.iter().copied().skip_while(|b| *b == 0).collect();
    if digits.len() > 8 {
        return Err(CardanoError::NumberTooBig(format!("0x{}", hex::encode(magnitude))));
    }
    let value = digits
        .iter()
        .fold(0i128, |acc, byte| (acc << 8) | i128::from(*byte));
    let value = if tag == TAG_NEGATIVE_BIGNUM { -1 - value } else { value };
    check_signed_range(value)?;
    Ok(value)
}

/// Conversion of a Rust value into its datum representation.
pub trait ToPlutusData {
    fn to_plutus_data(&self) -> PlutusData;
}

/// Validating conversion from a datum. Arity and shape mismatches are errors.
pub trait FromPlutusData: Sized {
    fn from_plutus_data(data: &PlutusData) -> Result<Self>;
}

impl ToPlutusData for PlutusData {
    fn to_plutus_data(&self) -> PlutusData {
        self.clone()
    }
}

impl FromPlutusData for PlutusData {
    fn from_plutus_data(data: &PlutusData) -> Result<Self> {
        Ok(data.clone())
    }
}

impl ToPlutusData for bool {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(u64::from(*self), Vec::new())
    }
}

impl FromPlutusData for bool {
    fn from_plutus_data(data: &PlutusData) -> Result<Self> {
        match data {
            PlutusData::Constr { index: 0, fields } if fields.is_empty() => Ok(false),
            PlutusData::Constr { index: 1, fields } if fields.is_empty() => Ok(true),
            other => Err(schema_error("Bool constructor", other.kind())),
        }
    }
}

impl<T: ToPlutusData> ToPlutusData for Option<T> {
    fn to_plutus_data(&self) -> PlutusData {
        match self {
            Some(value) => PlutusData::constr(0, vec![value.to_plutus_data()]),
            None => PlutusData::constr(1, Vec::new()),
        }
    }
}

impl<T: FromPlutusData> FromPlutusData for Option<T> {
    fn from_plutus_data(data: &PlutusData) -> Result<Self> {
        match data {
            PlutusData::Constr { index: 0, .. } => {
                let fields = data.expect_constr(0, 1)?;
                T::from_plutus_data(&fields[0]).map(Some)
            }
            PlutusData::Constr { index: 1, .. } => {
                data.expect_constr(1, 0)?;
                Ok(None)
            }
            other => Err(schema_error("Maybe constructor", other.kind())),
        }
    }
}

impl<T: ToPlutusData> ToPlutusData for Vec<T> {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::List(self.iter().map(ToPlutusData::to_plutus_data).collect())
    }
}

impl<T: FromPlutusData> FromPlutusData for Vec<T> {
    fn from_plutus_data(data: &PlutusData) -> Result<Self> {
        data.expect_list()?.iter().map(T::from_plutus_data).collect()
    }
}

macro_rules! integer_plutus_data {
    ($($ty:ty),*) => {
        $(
            impl ToPlutusData for $ty {
                fn to_plutus_data(&self) -> PlutusData {
                    PlutusData::Integer(i128::from(*self))
                }
            }

            impl FromPlutusData for $ty {
                fn from_plutus_data(data: &PlutusData) -> Result<Self> {
                    let value = data.expect_integer()?;
                    <$ty>::try_from(value).map_err(|_| CardanoError::NumberTooBig(value.to_string()))
                }
            }
        )*
    };
}

integer_plutus_data!(i64, u64, i128);
