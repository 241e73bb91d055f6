//! # WalletD Testing Infrastructure
//!
//! Shared testing utilities for the Cardano planner:
//! - Fixture builders for addresses, UTxOs and protocol parameters
//! - Edge case amounts around the CBOR wire range
//! - Property-based testing strategies
//!
//! ## Usage
//!
//! ```rust,ignore
//! use walletd_testing::*;
//!
//! proptest! {
//!     #[test]
//!     fn test_datum_roundtrip(datum in arb_plutus_data()) {
//!         let bytes = datum.to_bytes().unwrap();
//!         prop_assert_eq!(PlutusData::from_bytes(&bytes).unwrap(), datum);
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proptest::prelude::*;
use walletd_cardano::{
    Address, AssetId, AssetName, Credential, Lovelace, PlutusData, PolicyId, ProtocolParameters,
    TokenBundle, TxHash, Utxo, MAINNET_NETWORK_ID,
};

// ============================================================================
// Edge Case Key Material
// ============================================================================

/// Edge case Ed25519 private keys. Every 32-byte string is a valid Ed25519 seed.
pub struct EdgeCaseKeys;

impl EdgeCaseKeys {
    /// All zeros
    pub const ALL_ZEROS: [u8; 32] = [0u8; 32];

    /// All ones
    pub const ALL_ONES: [u8; 32] = [0xFF; 32];

    /// Key with alternating bits
    pub const ALTERNATING: [u8; 32] = [0xAA; 32];

    /// RFC 8032 test vector 1 secret key
    pub const RFC8032_TEST_1: [u8; 32] = [
        0x9d, 0x61, 0xb1, 0x9d, 0xef, 0xfd, 0x5a, 0x60,
        0xba, 0x84, 0x4a, 0xf4, 0x92, 0xec, 0x2c, 0xc4,
        0x44, 0x49, 0xc5, 0x69, 0x7b, 0x32, 0x69, 0x19,
        0x70, 0x3b, 0xac, 0x03, 0x1c, 0xae, 0x7f, 0x60,
    ];

    /// Get all edge case keys
    pub fn all() -> Vec<[u8; 32]> {
        vec![
            Self::ALL_ZEROS,
            Self::ALL_ONES,
            Self::ALTERNATING,
            Self::RFC8032_TEST_1,
        ]
    }
}

// ============================================================================
// Edge Case Amounts
// ============================================================================

/// Edge case lovelace amounts around the 64-bit wire range
pub struct EdgeCaseAmounts;

impl EdgeCaseAmounts {
    /// Zero amount
    pub const ZERO: Lovelace = 0;

    /// One lovelace
    pub const MIN: Lovelace = 1;

    /// One ADA
    pub const ONE_ADA: Lovelace = 1_000_000;

    /// Largest integer exact in an IEEE double, the worst-case scalar used for sizing
    pub const MAX_SAFE_INTEGER: Lovelace = 9_007_199_254_740_991;

    /// Maximum ADA supply in lovelace (45 billion ADA)
    pub const MAX_SUPPLY: Lovelace = 45_000_000_000_000_000;

    /// Largest encodable unsigned integer
    pub const MAX_WIRE: Lovelace = u64::MAX as Lovelace;

    /// Amounts at the boundaries of each CBOR integer width
    pub fn width_boundaries() -> Vec<Lovelace> {
        vec![
            0,
            23,
            24,
            255,
            256,
            65_535,
            65_536,
            4_294_967_295,
            4_294_967_296,
            Self::MAX_SAFE_INTEGER,
            Self::MAX_SAFE_INTEGER + 1,
            Self::MAX_WIRE,
        ]
    }

    /// Amounts just outside the wire range
    pub fn out_of_range() -> Vec<Lovelace> {
        vec![
            Self::MAX_WIRE + 1,
            -(Self::MAX_WIRE + 2),
            i128::MAX,
        ]
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Builders for commonly needed planner inputs
pub struct Fixtures;

impl Fixtures {
    /// Base address owned by the test wallet
    pub fn wallet_address() -> Address {
        Address::base(
            Credential::Key([0x11; 28]),
            Credential::Key([0x22; 28]),
            MAINNET_NETWORK_ID,
        )
    }

    /// Enterprise address of a third party
    pub fn payee_address() -> Address {
        Address::enterprise(Credential::Key([0x33; 28]), MAINNET_NETWORK_ID)
    }

    /// Script-locked enterprise address
    pub fn script_address() -> Address {
        Address::enterprise(Credential::Script([0x44; 28]), MAINNET_NETWORK_ID)
    }

    /// ADA-only UTxO held by the test wallet
    pub fn utxo(hash: u8, index: u32, coins: Lovelace) -> Utxo {
        Utxo::new(TxHash([hash; 32]), index, Self::wallet_address(), coins)
    }

    /// Asset id with a repeated-byte policy
    pub fn asset(policy: u8, name: &str) -> AssetId {
        AssetId::new(
            PolicyId([policy; 28]),
            AssetName::new(name.as_bytes()).unwrap_or_else(|_| AssetName::default()),
        )
    }

    /// Alonzo-era parameters (word-based min-UTxO)
    pub fn alonzo() -> ProtocolParameters {
        ProtocolParameters::alonzo()
    }

    /// Babbage-era parameters (byte-based min-UTxO)
    pub fn babbage() -> ProtocolParameters {
        ProtocolParameters::babbage()
    }
}

// ============================================================================
// Property-Based Testing Strategies
// ============================================================================

/// Lovelace amounts a wallet UTxO plausibly holds (1 to 100 ADA)
pub fn arb_lovelace() -> impl Strategy<Value = Lovelace> {
    1_000_000i128..=100_000_000i128
}

/// Arbitrary Plutus data trees of bounded depth
pub fn arb_plutus_data() -> impl Strategy<Value = PlutusData> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(|i| PlutusData::Integer(i128::from(i))),
        prop_oneof![Just(i64::MIN), Just(i64::MAX)].prop_map(|i| PlutusData::Integer(i128::from(i))),
        prop::collection::vec(any::<u8>(), 0..100).prop_map(PlutusData::Bytes),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            (0u64..=127, prop::collection::vec(inner.clone(), 0..4))
                .prop_map(|(index, fields)| PlutusData::constr(index, fields)),
            prop::collection::vec(inner.clone(), 0..4).prop_map(PlutusData::List),
            prop::collection::vec((inner.clone(), inner), 0..3).prop_map(PlutusData::Map),
        ]
    })
}

/// Asset ids drawn from a small policy and name space so bundles collide
pub fn arb_asset_id() -> impl Strategy<Value = AssetId> {
    (0u8..6, prop::collection::vec(b'a'..=b'z', 0..6)).prop_map(|(policy, name)| {
        AssetId::new(
            PolicyId([policy; 28]),
            AssetName::new(name).unwrap_or_else(|_| AssetName::default()),
        )
    })
}

/// Positive-quantity token bundles with up to `max_entries` entries
pub fn arb_token_bundle(max_entries: usize) -> impl Strategy<Value = TokenBundle> {
    prop::collection::vec((arb_asset_id(), 1i128..=1_000_000i128), 1..=max_entries.max(1))
        .prop_map(TokenBundle::from_entries)
}

/// ADA-only UTxO at the test wallet address
pub fn arb_ada_utxo() -> impl Strategy<Value = Utxo> {
    (any::<[u8; 32]>(), 0u32..4, arb_lovelace()).prop_map(|(hash, index, coins)| {
        Utxo::new(TxHash(hash), index, Fixtures::wallet_address(), coins)
    })
}

/// Multi-asset UTxO at the test wallet address
pub fn arb_token_utxo() -> impl Strategy<Value = Utxo> {
    (arb_ada_utxo(), arb_token_bundle(4))
        .prop_map(|(utxo, bundle)| utxo.with_tokens(bundle))
}

// ============================================================================
// Tests
// ============================================================================
