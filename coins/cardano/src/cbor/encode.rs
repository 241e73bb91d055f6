//! Encoders for transaction components.
//!
//! Body fields use the integer map keys of the ledger schema and appear in ascending key
//! order. Sets (inputs, collateral, required signers) are written sorted.

use minicbor::data::Tag;

use crate::address::{Credential, KeyHash};
use crate::cbor::{encode_int, encode_uint, new_encoder, CborEncoder, PlutusData, WORST_CASE_UINT};
use crate::error::Result;
use crate::hash::blake2b_256;
use crate::token::TokenBundle;
use crate::types::{
    AuxiliaryData, Certificate, DatumOption, ExUnits, Lovelace, Metadatum, NativeScript,
    ResolvedRedeemer, Script, TxInput, TxOutput, Withdrawal,
};

const TAG_ENCODED_CBOR: u64 = 24;

/// How not-yet-fixed scalars are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalars {
    /// The actual values.
    Exact,
    /// Coins, fee, ttl and validity start as [`WORST_CASE_UINT`], for size estimation.
    WorstCase,
}

impl Scalars {
    fn coin(self, value: Lovelace) -> Lovelace {
        match self {
            Scalars::Exact => value,
            Scalars::WorstCase => Lovelace::from(WORST_CASE_UINT),
        }
    }

    fn slot(self, value: u64) -> u64 {
        match self {
            Scalars::Exact => value,
            Scalars::WorstCase => WORST_CASE_UINT,
        }
    }
}

/// Borrowed view of everything that goes into a transaction body.
#[derive(Debug, Clone)]
pub struct TxBody<'a> {
    pub inputs: Vec<TxInput>,
    /// Explicit outputs followed by change outputs.
    pub outputs: Vec<&'a TxOutput>,
    pub fee: Lovelace,
    pub ttl: Option<u64>,
    pub certificates: &'a [Certificate],
    pub withdrawals: &'a [Withdrawal],
    pub auxiliary_data_hash: Option<[u8; 32]>,
    pub validity_interval_start: Option<u64>,
    pub mint: &'a TokenBundle,
    pub script_data_hash: Option<[u8; 32]>,
    pub collateral_inputs: Vec<TxInput>,
    pub required_signers: &'a [KeyHash],
    pub network_id: Option<u8>,
}

/// Bootstrap (Byron) witness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapWitness {
    pub public_key: [u8; 32],
    pub signature: [u8; 64],
    pub chain_code: [u8; 32],
    /// Raw CBOR of the address attributes.
    pub attributes: Vec<u8>,
}

/// Borrowed view of a witness set.
#[derive(Debug, Clone, Default)]
pub struct WitnessSet<'a> {
    pub vkey_witnesses: Vec<([u8; 32], [u8; 64])>,
    pub native_scripts: Vec<&'a NativeScript>,
    pub bootstrap_witnesses: Vec<BootstrapWitness>,
    pub plutus_v1_scripts: Vec<&'a [u8]>,
    pub plutus_v2_scripts: Vec<&'a [u8]>,
    pub plutus_v3_scripts: Vec<&'a [u8]>,
    pub datums: &'a [PlutusData],
    pub redeemers: &'a [ResolvedRedeemer],
}

impl<'a> WitnessSet<'a> {
    /// Script, datum and redeemer sections; signatures are added separately.
    pub fn with_scripts(scripts: &'a [Script], datums: &'a [PlutusData], redeemers: &'a [ResolvedRedeemer]) -> Self {
        let mut set = WitnessSet {
            datums,
            redeemers,
            ..Default::default()
        };
        for script in scripts {
            match script {
                Script::Native(native) => set.native_scripts.push(native),
                Script::PlutusV1(bytes) => set.plutus_v1_scripts.push(bytes),
                Script::PlutusV2(bytes) => set.plutus_v2_scripts.push(bytes),
                Script::PlutusV3(bytes) => set.plutus_v3_scripts.push(bytes),
            }
        }
        set
    }
}

pub fn encode_input(e: &mut CborEncoder, input: &TxInput) -> Result<()> {
    e.array(2)?;
    e.bytes(&input.tx_hash.0)?;
    e.u32(input.output_index)?;
    Ok(())
}

pub fn input_size(input: &TxInput) -> Result<usize> {
    let mut e = new_encoder();
    encode_input(&mut e, input)?;
    Ok(e.into_writer().len())
}

/// Multi-asset map: policies ascending, asset names ascending within each policy.
pub fn encode_multiasset(e: &mut CborEncoder, bundle: &TokenBundle, signed: bool) -> Result<()> {
    let grouped = bundle.by_policy();
    e.map(grouped.len() as u64)?;
    for (policy_id, assets) in grouped {
        e.bytes(policy_id.as_bytes())?;
        e.map(assets.len() as u64)?;
        for (asset_name, quantity) in assets {
            e.bytes(asset_name.as_bytes())?;
            if signed {
                encode_int(e, quantity)?;
            } else {
                encode_uint(e, quantity)?;
            }
        }
    }
    Ok(())
}

/// Coin alone, or `[coin, multiasset]` when tokens are present.
pub fn encode_value(e: &mut CborEncoder, coins: Lovelace, bundle: &TokenBundle) -> Result<()> {
    if bundle.is_empty() {
        encode_uint(e, coins)?;
    } else {
        e.array(2)?;
        encode_uint(e, coins)?;
        encode_multiasset(e, bundle, false)?;
    }
    Ok(())
}

pub fn value_bytes(coins: Lovelace, bundle: &TokenBundle) -> Result<Vec<u8>> {
    let mut e = new_encoder();
    encode_value(&mut e, coins, bundle)?;
    Ok(e.into_writer())
}

fn encode_output_with(e: &mut CborEncoder, output: &TxOutput, scalars: Scalars) -> Result<()> {
    let coins = scalars.coin(output.coins);
    if output.uses_map_format() {
        let mut fields = 2;
        if output.datum.is_some() {
            fields += 1;
        }
        if output.script_ref.is_some() {
            fields += 1;
        }
        e.map(fields)?;
        e.u8(0)?.bytes(output.address.as_bytes())?;
        e.u8(1)?;
        encode_value(e, coins, &output.token_bundle)?;
        if let Some(datum) = &output.datum {
            e.u8(2)?;
            encode_datum_option(e, datum)?;
        }
        if let Some(script) = &output.script_ref {
            e.u8(3)?;
            encode_script_ref(e, script)?;
        }
    } else {
        let hash = match &output.datum {
            Some(DatumOption::Hash(hash)) => Some(hash),
            _ => None,
        };
        e.array(if hash.is_some() { 3 } else { 2 })?;
        e.bytes(output.address.as_bytes())?;
        encode_value(e, coins, &output.token_bundle)?;
        if let Some(hash) = hash {
            e.bytes(hash)?;
        }
    }
    Ok(())
}

/// Legacy `[address, value(, datum_hash)]` unless an inline datum or reference script
/// requires the map shape.
pub fn encode_output(e: &mut CborEncoder, output: &TxOutput) -> Result<()> {
    encode_output_with(e, output, Scalars::Exact)
}

pub fn output_bytes(output: &TxOutput) -> Result<Vec<u8>> {
    let mut e = new_encoder();
    encode_output(&mut e, output)?;
    Ok(e.into_writer())
}

fn encode_datum_option(e: &mut CborEncoder, datum: &DatumOption) -> Result<()> {
    e.array(2)?;
    match datum {
        DatumOption::Hash(hash) => {
            e.u8(0)?.bytes(hash)?;
        }
        DatumOption::Inline(data) => {
            e.u8(1)?;
            e.tag(Tag::new(TAG_ENCODED_CBOR))?;
            e.bytes(&data.to_bytes()?)?;
        }
    }
    Ok(())
}

/// `#6.24(bytes .cbor [type, script])`
pub fn encode_script_ref(e: &mut CborEncoder, script: &Script) -> Result<()> {
    let mut inner = new_encoder();
    inner.array(2)?;
    inner.u8(script.type_tag())?;
    match script {
        Script::Native(native) => encode_native_script(&mut inner, native)?,
        Script::PlutusV1(bytes) | Script::PlutusV2(bytes) | Script::PlutusV3(bytes) => {
            inner.bytes(bytes)?;
        }
    }
    e.tag(Tag::new(TAG_ENCODED_CBOR))?;
    e.bytes(&inner.into_writer())?;
    Ok(())
}

pub fn encode_native_script(e: &mut CborEncoder, script: &NativeScript) -> Result<()> {
    match script {
        NativeScript::Pubkey(hash) => {
            e.array(2)?.u8(0)?.bytes(hash)?;
        }
        NativeScript::All(scripts) => {
            e.array(2)?.u8(1)?;
            encode_native_scripts(e, scripts)?;
        }
        NativeScript::Any(scripts) => {
            e.array(2)?.u8(2)?;
            encode_native_scripts(e, scripts)?;
        }
        NativeScript::NOfK(n, scripts) => {
            e.array(3)?.u8(3)?.u32(*n)?;
            encode_native_scripts(e, scripts)?;
        }
        NativeScript::InvalidBefore(slot) => {
            e.array(2)?.u8(4)?.u64(*slot)?;
        }
        NativeScript::InvalidHereafter(slot) => {
            e.array(2)?.u8(5)?.u64(*slot)?;
        }
    }
    Ok(())
}

fn encode_native_scripts(e: &mut CborEncoder, scripts: &[NativeScript]) -> Result<()> {
    e.array(scripts.len() as u64)?;
    for script in scripts {
        encode_native_script(e, script)?;
    }
    Ok(())
}

pub fn native_script_bytes(script: &NativeScript) -> Result<Vec<u8>> {
    let mut e = new_encoder();
    encode_native_script(&mut e, script)?;
    Ok(e.into_writer())
}

fn encode_credential(e: &mut CborEncoder, credential: &Credential) -> Result<()> {
    e.array(2)?;
    match credential {
        Credential::Key(hash) => e.u8(0)?.bytes(hash)?,
        Credential::Script(hash) => e.u8(1)?.bytes(hash)?,
    };
    Ok(())
}

pub fn encode_certificate(e: &mut CborEncoder, certificate: &Certificate) -> Result<()> {
    match certificate {
        Certificate::StakeRegistration(credential) => {
            e.array(2)?.u8(0)?;
            encode_credential(e, credential)?;
        }
        Certificate::StakeDeregistration(credential) => {
            e.array(2)?.u8(1)?;
            encode_credential(e, credential)?;
        }
        Certificate::StakeDelegation {
            credential,
            pool_key_hash,
        } => {
            e.array(3)?.u8(2)?;
            encode_credential(e, credential)?;
            e.bytes(pool_key_hash)?;
        }
    }
    Ok(())
}

pub fn encode_metadatum(e: &mut CborEncoder, metadatum: &Metadatum) -> Result<()> {
    match metadatum {
        Metadatum::Int(value) => encode_int(e, *value)?,
        Metadatum::Bytes(bytes) => {
            e.bytes(bytes)?;
        }
        Metadatum::Text(text) => {
            e.str(text)?;
        }
        Metadatum::List(items) => {
            e.array(items.len() as u64)?;
            for item in items {
                encode_metadatum(e, item)?;
            }
        }
        Metadatum::Map(entries) => {
            e.map(entries.len() as u64)?;
            for (key, value) in entries {
                encode_metadatum(e, key)?;
                encode_metadatum(e, value)?;
            }
        }
    }
    Ok(())
}

pub fn auxiliary_data_bytes(aux: &AuxiliaryData) -> Result<Vec<u8>> {
    let mut e = new_encoder();
    e.map(aux.metadata.len() as u64)?;
    for (label, value) in &aux.metadata {
        e.u64(*label)?;
        encode_metadatum(&mut e, value)?;
    }
    Ok(e.into_writer())
}

fn encode_ex_units(e: &mut CborEncoder, ex_units: &ExUnits) -> Result<()> {
    e.array(2)?.u64(ex_units.memory)?.u64(ex_units.steps)?;
    Ok(())
}

/// Redeemers as the legacy array of `[tag, index, data, ex_units]`.
pub fn encode_redeemers(e: &mut CborEncoder, redeemers: &[ResolvedRedeemer]) -> Result<()> {
    e.array(redeemers.len() as u64)?;
    for redeemer in redeemers {
        e.array(4)?;
        e.u8(redeemer.tag as u8)?;
        e.u32(redeemer.index)?;
        redeemer.data.encode(e)?;
        encode_ex_units(e, &redeemer.ex_units)?;
    }
    Ok(())
}

pub fn encode_datums(e: &mut CborEncoder, datums: &[PlutusData]) -> Result<()> {
    e.array(datums.len() as u64)?;
    for datum in datums {
        datum.encode(e)?;
    }
    Ok(())
}

fn encode_input_set(e: &mut CborEncoder, inputs: &[TxInput]) -> Result<()> {
    let mut sorted = inputs.to_vec();
    sorted.sort();
    e.array(sorted.len() as u64)?;
    for input in &sorted {
        encode_input(e, input)?;
    }
    Ok(())
}

pub fn encode_body(e: &mut CborEncoder, body: &TxBody<'_>, scalars: Scalars) -> Result<()> {
    let optional_fields = [
        body.ttl.is_some(),
        !body.certificates.is_empty(),
        !body.withdrawals.is_empty(),
        body.auxiliary_data_hash.is_some(),
        body.validity_interval_start.is_some(),
        !body.mint.is_empty(),
        body.script_data_hash.is_some(),
        !body.collateral_inputs.is_empty(),
        !body.required_signers.is_empty(),
        body.network_id.is_some(),
    ];
    let fields = 3 + optional_fields.iter().filter(|present| **present).count();
    e.map(fields as u64)?;

    e.u8(0)?;
    encode_input_set(e, &body.inputs)?;

    e.u8(1)?;
    e.array(body.outputs.len() as u64)?;
    for output in &body.outputs {
        encode_output_with(e, output, scalars)?;
    }

    e.u8(2)?;
    encode_uint(e, scalars.coin(body.fee))?;

    if let Some(ttl) = body.ttl {
        e.u8(3)?.u64(scalars.slot(ttl))?;
    }

    if !body.certificates.is_empty() {
        e.u8(4)?;
        e.array(body.certificates.len() as u64)?;
        for certificate in body.certificates {
            encode_certificate(e, certificate)?;
        }
    }

    if !body.withdrawals.is_empty() {
        let mut withdrawals: Vec<&Withdrawal> = body.withdrawals.iter().collect();
        withdrawals.sort_by(|a, b| a.reward_address.as_bytes().cmp(b.reward_address.as_bytes()));
        e.u8(5)?;
        e.map(withdrawals.len() as u64)?;
        for withdrawal in withdrawals {
            e.bytes(withdrawal.reward_address.as_bytes())?;
            encode_uint(e, withdrawal.amount)?;
        }
    }

    if let Some(hash) = &body.auxiliary_data_hash {
        e.u8(7)?.bytes(hash)?;
    }

    if let Some(start) = body.validity_interval_start {
        e.u8(8)?.u64(scalars.slot(start))?;
    }

    if !body.mint.is_empty() {
        e.u8(9)?;
        encode_multiasset(e, body.mint, true)?;
    }

    if let Some(hash) = &body.script_data_hash {
        e.u8(11)?.bytes(hash)?;
    }

    if !body.collateral_inputs.is_empty() {
        e.u8(13)?;
        encode_input_set(e, &body.collateral_inputs)?;
    }

    if !body.required_signers.is_empty() {
        let mut signers = body.required_signers.to_vec();
        signers.sort();
        e.u8(14)?;
        e.array(signers.len() as u64)?;
        for signer in &signers {
            e.bytes(signer)?;
        }
    }

    if let Some(network_id) = body.network_id {
        e.u8(15)?.u8(network_id)?;
    }
    Ok(())
}

pub fn body_bytes(body: &TxBody<'_>, scalars: Scalars) -> Result<Vec<u8>> {
    let mut e = new_encoder();
    encode_body(&mut e, body, scalars)?;
    Ok(e.into_writer())
}

/// Transaction id: blake2b-256 of the body alone.
pub fn tx_id(body: &TxBody<'_>) -> Result<[u8; 32]> {
    Ok(blake2b_256(&body_bytes(body, Scalars::Exact)?))
}

pub fn encode_witness_set(e: &mut CborEncoder, set: &WitnessSet<'_>) -> Result<()> {
    let sections = [
        !set.vkey_witnesses.is_empty(),
        !set.native_scripts.is_empty(),
        !set.bootstrap_witnesses.is_empty(),
        !set.plutus_v1_scripts.is_empty(),
        !set.datums.is_empty(),
        !set.redeemers.is_empty(),
        !set.plutus_v2_scripts.is_empty(),
        !set.plutus_v3_scripts.is_empty(),
    ];
    e.map(sections.iter().filter(|present| **present).count() as u64)?;

    if !set.vkey_witnesses.is_empty() {
        e.u8(0)?.array(set.vkey_witnesses.len() as u64)?;
        for (public_key, signature) in &set.vkey_witnesses {
            e.array(2)?.bytes(public_key)?.bytes(signature)?;
        }
    }
    if !set.native_scripts.is_empty() {
        e.u8(1)?.array(set.native_scripts.len() as u64)?;
        for script in &set.native_scripts {
            encode_native_script(e, script)?;
        }
    }
    if !set.bootstrap_witnesses.is_empty() {
        e.u8(2)?.array(set.bootstrap_witnesses.len() as u64)?;
        for witness in &set.bootstrap_witnesses {
            e.array(4)?
                .bytes(&witness.public_key)?
                .bytes(&witness.signature)?
                .bytes(&witness.chain_code)?
                .bytes(&witness.attributes)?;
        }
    }
    encode_script_section(e, 3, &set.plutus_v1_scripts)?;
    if !set.datums.is_empty() {
        e.u8(4)?;
        encode_datums(e, set.datums)?;
    }
    if !set.redeemers.is_empty() {
        e.u8(5)?;
        encode_redeemers(e, set.redeemers)?;
    }
    encode_script_section(e, 6, &set.plutus_v2_scripts)?;
    encode_script_section(e, 7, &set.plutus_v3_scripts)?;
    Ok(())
}

fn encode_script_section(e: &mut CborEncoder, key: u8, scripts: &[&[u8]]) -> Result<()> {
    if scripts.is_empty() {
        return Ok(());
    }
    e.u8(key)?.array(scripts.len() as u64)?;
    for script in scripts {
        e.bytes(script)?;
    }
    Ok(())
}

pub fn witness_set_bytes(set: &WitnessSet<'_>) -> Result<Vec<u8>> {
    let mut e = new_encoder();
    encode_witness_set(&mut e, set)?;
    Ok(e.into_writer())
}

/// `[body, witness_set, true, auxiliary_data / null]` from already encoded parts.
pub fn transaction_bytes(body: &[u8], witness_set: &[u8], auxiliary_data: Option<&[u8]>) -> Result<Vec<u8>> {
    let mut e = new_encoder();
    e.array(4)?;
    e.writer_mut().extend_from_slice(body);
    e.writer_mut().extend_from_slice(witness_set);
    e.bool(true)?;
    match auxiliary_data {
        Some(aux) => e.writer_mut().extend_from_slice(aux),
        None => {
            e.null()?;
        }
    }
    Ok(e.into_writer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::config::MAINNET_NETWORK_ID;
    use crate::token::{AssetId, AssetName, PolicyId};
    use crate::types::{RedeemerTag, TxHash};

    fn address() -> Address {
        Address::enterprise(Credential::Key([1; 28]), MAINNET_NETWORK_ID)
    }

    fn asset(policy: u8, name: &[u8]) -> AssetId {
        AssetId::new(PolicyId([policy; 28]), AssetName::new(name.to_vec()).unwrap())
    }

    fn to_hex(f: impl FnOnce(&mut CborEncoder) -> Result<()>) -> String {
        let mut e = new_encoder();
        f(&mut e).unwrap();
        hex::encode(e.into_writer())
    }

    // ========================================================================
    // Value & Output Tests
    // ========================================================================

    #[test]
    fn test_ada_only_value_is_plain_uint() {
        assert_eq!(to_hex(|e| encode_value(e, 1_000_000, &TokenBundle::new())), "1a000f4240");
    }

    #[test]
    fn test_bundle_encoding_is_order_independent() {
        let a = TokenBundle::from_entries(vec![
            (asset(2, b"x"), 1),
            (asset(1, b"bb"), 2),
            (asset(1, b"a"), 3),
        ]);
        let b = TokenBundle::from_entries(vec![
            (asset(1, b"a"), 3),
            (asset(2, b"x"), 1),
            (asset(1, b"bb"), 2),
        ]);
        assert_eq!(value_bytes(5, &a).unwrap(), value_bytes(5, &b).unwrap());

        // [5, {policy1: {"a": 3, "bb": 2}, policy2: {"x": 1}}]
        let expected = format!(
            "8205a2581c{}a241610342626202581c{}a1417801",
            "01".repeat(28),
            "02".repeat(28)
        );
        assert_eq!(hex::encode(value_bytes(5, &a).unwrap()), expected);
    }

    #[test]
    fn test_legacy_output_shape() {
        let output = TxOutput::new(address(), 2_000_000);
        let bytes = output_bytes(&output).unwrap();
        assert_eq!(bytes[0], 0x82);
        assert_eq!(bytes.len(), 1 + 2 + 29 + 5);

        let hashed = output.with_datum(DatumOption::Hash([9; 32]));
        let bytes = output_bytes(&hashed).unwrap();
        assert_eq!(bytes[0], 0x83);
    }

    #[test]
    fn test_map_output_shape_for_inline_datum() {
        let output = TxOutput::new(address(), 2_000_000)
            .with_datum(DatumOption::Inline(PlutusData::Integer(1)));
        let bytes = output_bytes(&output).unwrap();
        assert_eq!(bytes[0], 0xa3);
        // datum option [1, #6.24(h'01')]
        assert!(hex::encode(&bytes).ends_with("028201d8184101"));
    }

    #[test]
    fn test_negative_coin_is_rejected() {
        let output = TxOutput::new(address(), -1);
        assert!(output_bytes(&output).is_err());
    }

    // ========================================================================
    // Script & Certificate Tests
    // ========================================================================

    #[test]
    fn test_native_script_encoding() {
        let script = NativeScript::NOfK(1, vec![NativeScript::InvalidHereafter(100)]);
        assert_eq!(hex::encode(native_script_bytes(&script).unwrap()), "83030181820518 64".replace(' ', ""));
    }

    #[test]
    fn test_certificate_encoding() {
        let cert = Certificate::StakeRegistration(Credential::Key([0; 28]));
        let hex = to_hex(|e| encode_certificate(e, &cert));
        assert!(hex.starts_with("82008200581c"));
    }

    #[test]
    fn test_redeemer_array_encoding() {
        let redeemer = ResolvedRedeemer {
            tag: RedeemerTag::Mint,
            index: 0,
            data: PlutusData::Integer(7),
            ex_units: ExUnits::new(1, 2),
        };
        assert_eq!(to_hex(|e| encode_redeemers(e, &[redeemer])), "818401000782 0102".replace(' ', ""));
        assert_eq!(to_hex(|e| encode_redeemers(e, &[])), "80");
    }

    // ========================================================================
    // Body & Transaction Tests
    // ========================================================================

    fn sample_body<'a>(outputs: Vec<&'a TxOutput>, mint: &'a TokenBundle) -> TxBody<'a> {
        TxBody {
            inputs: vec![
                TxInput { tx_hash: TxHash([2; 32]), output_index: 0 },
                TxInput { tx_hash: TxHash([1; 32]), output_index: 3 },
            ],
            outputs,
            fee: 170_000,
            ttl: Some(1_000),
            certificates: &[],
            withdrawals: &[],
            auxiliary_data_hash: None,
            validity_interval_start: None,
            mint,
            script_data_hash: None,
            collateral_inputs: vec![],
            required_signers: &[],
            network_id: None,
        }
    }

    #[test]
    fn test_body_inputs_are_sorted() {
        let output = TxOutput::new(address(), 1_000_000);
        let mint = TokenBundle::new();
        let body = sample_body(vec![&output], &mint);
        let bytes = body_bytes(&body, Scalars::Exact).unwrap();
        // map(4), key 0, array(2), [h'0101..', 3] first
        assert_eq!(&bytes[..6], &[0xa4, 0x00, 0x82, 0x82, 0x58, 0x20]);
        assert_eq!(bytes[6], 0x01);
    }

    #[test]
    fn test_worst_case_scalars_are_larger() {
        let output = TxOutput::new(address(), 1_000_000);
        let mint = TokenBundle::new();
        let body = sample_body(vec![&output], &mint);
        let exact = body_bytes(&body, Scalars::Exact).unwrap().len();
        let worst = body_bytes(&body, Scalars::WorstCase).unwrap().len();
        // coin 5 -> 9, fee 5 -> 9, ttl 3 -> 9
        assert_eq!(worst, exact + 4 + 4 + 6);
    }

    #[test]
    fn test_mint_allows_negative_quantities() {
        let output = TxOutput::new(address(), 1_000_000);
        let mint = TokenBundle::from_entries(vec![(asset(1, b"burn"), -5)]);
        let body = sample_body(vec![&output], &mint);
        assert!(body_bytes(&body, Scalars::Exact).is_ok());
    }

    #[test]
    fn test_transaction_envelope() {
        let output = TxOutput::new(address(), 1_000_000);
        let mint = TokenBundle::new();
        let body = body_bytes(&sample_body(vec![&output], &mint), Scalars::Exact).unwrap();
        let witnesses = witness_set_bytes(&WitnessSet::default()).unwrap();
        assert_eq!(witnesses, vec![0xa0]);
        let tx = transaction_bytes(&body, &witnesses, None).unwrap();
        assert_eq!(tx[0], 0x84);
        assert_eq!(&tx[tx.len() - 3..], &[0xa0, 0xf5, 0xf6]);
    }

    #[test]
    fn test_vkey_witness_size() {
        let set = WitnessSet {
            vkey_witnesses: vec![([0; 32], [0; 64])],
            ..Default::default()
        };
        // map header, key, array header, then one 101-byte witness
        assert_eq!(witness_set_bytes(&set).unwrap().len(), 1 + 1 + 1 + 101);
    }
}
