//! Byte-level checks of the canonical codec through the public API.

use std::collections::BTreeSet;

use walletd_cardano::cbor::decode::output_from_bytes;
use walletd_cardano::cbor::encode::{native_script_bytes, output_bytes, value_bytes};
use walletd_cardano::hash::blake2b_256;
use walletd_cardano::{
    hash_script_integrity, Address, AssetId, AssetName, CardanoError, CostModels, Credential,
    DatumOption, FromPlutusData, NativeScript, PlannerConfig, PlanRequest, PlutusData, PolicyId,
    ProtocolParameters, TokenBundle, ToPlutusData, TxHash, TxOutput, Utxo, MAINNET_NETWORK_ID,
};

fn asset(policy: u8, name: &[u8]) -> AssetId {
    AssetId::new(PolicyId([policy; 28]), AssetName::new(name.to_vec()).unwrap())
}

// ============================================================================
// Plutus Data
// ============================================================================

#[test]
fn test_datum_roundtrip_preserves_bytes() {
    let datum = PlutusData::constr(
        1,
        vec![
            PlutusData::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
            PlutusData::Map(vec![(PlutusData::Integer(-3), PlutusData::List(vec![]))]),
            PlutusData::constr(100, vec![PlutusData::Integer(i128::from(i64::MAX))]),
        ],
    );
    let bytes = datum.to_bytes().unwrap();
    let decoded = PlutusData::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, datum);
    assert_eq!(decoded.to_bytes().unwrap(), bytes);
    assert_eq!(decoded.hash().unwrap(), blake2b_256(&bytes));
}

#[test]
fn test_typed_datum_fields() {
    let datum = (Some(42i64), vec![true, false]);
    let data = PlutusData::constr(0, vec![datum.0.to_plutus_data(), datum.1.to_plutus_data()]);
    let fields = data.expect_constr(0, 2).unwrap();
    assert_eq!(Option::<i64>::from_plutus_data(&fields[0]).unwrap(), Some(42));
    assert_eq!(Vec::<bool>::from_plutus_data(&fields[1]).unwrap(), vec![true, false]);
    assert!(matches!(data.expect_constr(1, 2), Err(CardanoError::DatumSchema { .. })));
}

#[test]
fn test_integer_out_of_signed_range() {
    for value in [i128::from(i64::MAX) + 1, i128::from(u64::MAX), -(1i128 << 64)] {
        let data = PlutusData::Integer(value);
        assert!(matches!(data.to_bytes(), Err(CardanoError::NumberTooBig(_))));
    }
}

// ============================================================================
// Values and Outputs
// ============================================================================

#[test]
fn test_bundle_encoding_ignores_insertion_order() {
    let forward = TokenBundle::from_entries(vec![
        (asset(1, b"a"), 1),
        (asset(1, b"bb"), 2),
        (asset(2, b""), 3),
    ]);
    let backward = TokenBundle::from_entries(vec![
        (asset(2, b""), 3),
        (asset(1, b"bb"), 2),
        (asset(1, b"a"), 1),
    ]);
    assert_eq!(
        value_bytes(1_000_000, &forward).unwrap(),
        value_bytes(1_000_000, &backward).unwrap()
    );
}

#[test]
fn test_ada_only_value_is_bare_coin() {
    assert_eq!(value_bytes(1_000_000, &TokenBundle::new()).unwrap(), vec![0x1a, 0x00, 0x0f, 0x42, 0x40]);
}

#[test]
fn test_output_decodes_back() {
    let address = Address::base(Credential::Key([4; 28]), Credential::Script([5; 28]), MAINNET_NETWORK_ID);
    let output = TxOutput::new(address, 2_500_000)
        .with_tokens(TokenBundle::from_entries(vec![(asset(9, b"coin"), 1_000)]))
        .with_datum(DatumOption::Inline(PlutusData::Integer(7)));
    let bytes = output_bytes(&output).unwrap();
    assert_eq!(output_from_bytes(&bytes).unwrap(), output);
}

#[test]
fn test_native_script_hash_uses_type_prefix() {
    let script = NativeScript::Pubkey([0xaa; 28]);
    let bytes = native_script_bytes(&script).unwrap();
    // [0, h'aa..aa']
    assert_eq!(&bytes[..4], &[0x82, 0x00, 0x58, 0x1c]);
    assert_eq!(bytes.len(), 32);
}

// ============================================================================
// Transaction Framing
// ============================================================================

#[test]
fn test_unsigned_transaction_framing() {
    let own = Address::enterprise(Credential::Key([1; 28]), MAINNET_NETWORK_ID);
    let request = PlanRequest::new(own.clone(), ProtocolParameters::alonzo())
        .with_output(TxOutput::new(own.clone(), 2_000_000));
    let utxos = vec![Utxo::new(TxHash([3; 32]), 1, own, 5_000_000)];
    let plan = walletd_cardano::plan_transaction(&request, &utxos, &PlannerConfig::default()).unwrap();

    let body = plan.body_bytes().unwrap();
    assert_eq!(plan.tx_id().unwrap(), blake2b_256(&body));

    let tx = plan.unsigned_tx_bytes().unwrap();
    assert_eq!(tx[0], 0x84);
    assert_eq!(&tx[1..1 + body.len()], &body[..]);
    // empty witness set, valid flag, no auxiliary data
    assert_eq!(&tx[1 + body.len()..], &[0xa0, 0xf5, 0xf6]);
}

// ============================================================================
// Script Integrity
// ============================================================================

#[test]
fn test_script_integrity_single_datum() {
    let hash = hash_script_integrity(&[], &[PlutusData::Integer(1)], &CostModels::new(), &BTreeSet::new())
        .unwrap()
        .unwrap();
    assert_eq!(
        hex::encode(hash),
        "4fb036bab07be26d263f69aae13ca5b1672bb8b96f4e60fe85f0638be9e0a26f"
    );
}
