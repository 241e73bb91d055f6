//! End-to-end planning scenarios over realistic wallets.

use walletd_cardano::{
    estimate_size, plan_transaction, plan_transaction_strict, Address, AssetId, AssetName, Certificate,
    CostModel, Credential, ExUnits, Language, Lovelace, MintEntry, PlanRequest, PlannerConfig,
    PlutusData, PolicyId, ProtocolParameters, Redeemer, RedeemerTag, RedeemerTarget, Script,
    TokenBundle, TxHash, TxOutput, TxPlanError, Utxo, Withdrawal, MAINNET_NETWORK_ID,
};

fn own_address() -> Address {
    Address::base(
        Credential::Key([0x11; 28]),
        Credential::Key([0x22; 28]),
        MAINNET_NETWORK_ID,
    )
}

fn payee() -> Address {
    Address::enterprise(Credential::Key([0x33; 28]), MAINNET_NETWORK_ID)
}

fn utxo(hash: u8, coins: Lovelace) -> Utxo {
    Utxo::new(TxHash([hash; 32]), 0, own_address(), coins)
}

fn asset(policy: u8, name: &str) -> AssetId {
    AssetId::new(PolicyId([policy; 28]), AssetName::new(name.as_bytes()).unwrap())
}

fn v1_cost_model() -> CostModel {
    (0..166).map(|i| (format!("param-{:03}", i), 1_000 + i as i64)).collect()
}

// ============================================================================
// Payment Scenarios
// ============================================================================

/// Base address of a second account in the same wallet.
fn second_account() -> Address {
    Address::base(
        Credential::Key([0x12; 28]),
        Credential::Key([0x22; 28]),
        MAINNET_NETWORK_ID,
    )
}

fn merchant() -> Address {
    Address::base(
        Credential::Key([0x33; 28]),
        Credential::Key([0x44; 28]),
        MAINNET_NETWORK_ID,
    )
}

#[test]
fn test_ada_payment_with_token_wallet() {
    let tokens = TokenBundle::from_entries(vec![
        (asset(1, "HarvestRewardPointToken"), 1_000_000),
        (asset(2, "LiquidityProviderVoucherSeries2"), 42),
        (asset(3, "GovernanceStakeReceipt0001"), 7),
    ]);
    let utxos = vec![
        utxo(1, 5_200_000),
        Utxo::new(TxHash([2; 32]), 0, second_account(), 10_000_000).with_tokens(tokens.clone()),
    ];
    let request = PlanRequest::new(own_address(), ProtocolParameters::alonzo())
        .with_output(TxOutput::new(merchant(), 5_500_000))
        .with_ttl(120_000_000);

    let plan = plan_transaction(&request, &utxos, &PlannerConfig::default()).unwrap();

    // two inputs, two signers, three outputs and a ttl
    assert_eq!(estimate_size(&plan).unwrap(), 700);
    assert_eq!(plan.fee, 186_181);
    assert_eq!(plan.base_fee, 186_181);
    assert_eq!(plan.inputs.len(), 2);
    assert_eq!(plan.change.len(), 2);
    assert!(plan.change[0].token_bundle.is_empty());
    assert_eq!(plan.change[0].coins, 7_513_863);
    assert_eq!(plan.change[1].token_bundle, tokens);
    // 27 + 6 + ceil((12 * 3 + 80 + 28 * 3) / 8) = 58 words
    assert_eq!(plan.change[1].coins, 1_999_956);
    assert!(plan.is_balanced());
}

#[test]
fn test_token_payment_keeps_remaining_tokens_together() {
    let ticket = asset(7, "SeasonPassCollectibleTicket#0001");
    let badge = asset(7, "GoldBadge1");
    let key = asset(7, "SilverKey");
    let utxos = vec![
        utxo(1, 5_000_000),
        Utxo::new(TxHash([2; 32]), 30, own_address(), 1_500_000).with_tokens(
            TokenBundle::from_entries(vec![(ticket.clone(), 8), (badge.clone(), 4), (key.clone(), 2)]),
        ),
    ];
    let request = PlanRequest::new(own_address(), ProtocolParameters::babbage())
        .with_output(
            TxOutput::new(merchant(), 0)
                .with_tokens(TokenBundle::from_entries(vec![(ticket.clone(), 2)])),
        )
        .with_ttl(120_000_000);

    let plan = plan_transaction(&request, &utxos, &PlannerConfig::default()).unwrap();

    assert_eq!(estimate_size(&plan).unwrap(), 571);
    assert_eq!(plan.fee, 180_505);
    assert_eq!(plan.base_fee, 180_505);
    // the payee output was raised to 4310 * (129 + 164)
    assert_eq!(plan.outputs[0].coins, 1_262_830);
    assert_eq!(plan.additional_lovelace, 1_262_830);

    assert_eq!(plan.change.len(), 2);
    assert!(plan.change[0].token_bundle.is_empty());
    assert_eq!(plan.change[0].coins, 3_694_705);
    let bundle = &plan.change[1].token_bundle;
    assert_eq!(bundle.get(&ticket), 6);
    assert_eq!(bundle.get(&badge), 4);
    assert_eq!(bundle.get(&key), 2);
    // 4310 * (152 + 164)
    assert_eq!(plan.change[1].coins, 1_361_960);
    assert!(plan.is_balanced());
}

#[test]
fn test_exact_fee_fallback_keeps_least_slack() {
    // every prefix leaves dust: 1.5 ADA minus fee is below the ADA change minimum
    let utxos = vec![utxo(1, 3_500_000)];
    let request = PlanRequest::new(own_address(), ProtocolParameters::alonzo())
        .with_output(TxOutput::new(payee(), 3_000_000));
    let plan = plan_transaction(&request, &utxos, &PlannerConfig::default()).unwrap();
    assert!(plan.change.is_empty());
    assert_eq!(plan.fee, 500_000);
    assert!(plan.fee > plan.base_fee);
}

// ============================================================================
// Minting Scenarios
// ============================================================================

/// Compiled minting policy, 223 bytes of flat-encoded script.
fn free_mint_script() -> Script {
    let mut bytes = vec![0x4e, 0x4d, 0x01, 0x00, 0x00, 0x33, 0x22, 0x22, 0x20, 0x05, 0x12, 0x00, 0x12, 0x00, 0x11];
    bytes.resize(223, 0x22);
    Script::PlutusV1(bytes)
}

#[test]
fn test_plutus_mint_resolves_policy_index() {
    let script = free_mint_script();
    let policy_id = script.policy_id().unwrap();
    let params = ProtocolParameters::alonzo().with_cost_model(Language::PlutusV1, v1_cost_model());
    let request = PlanRequest::new(own_address(), params)
        .with_script(script)
        .with_mint(MintEntry {
            policy_id,
            asset_name: AssetName::new(b"FREE".to_vec()).unwrap(),
            quantity: 500,
        })
        .with_redeemer(Redeemer {
            target: RedeemerTarget::Mint(policy_id),
            data: PlutusData::Bytes(b"FREE".to_vec()),
            ex_units: ExUnits::new(1_700, 476_468),
        });
    let utxos = vec![utxo(1, 5_000_000), utxo(2, 30_000_000)];

    let plan = plan_transaction(&request, &utxos, &PlannerConfig::default()).unwrap();

    // 155381 + 44 * 697 + ceil(1700 * 0.0577 + 476468 * 0.0000721)
    assert_eq!(estimate_size(&plan).unwrap(), 697);
    assert_eq!(plan.fee, 186_182);
    assert_eq!(plan.base_fee, 186_182);
    assert_eq!(plan.redeemers.len(), 1);
    assert_eq!(plan.redeemers[0].tag, RedeemerTag::Mint);
    assert_eq!(plan.redeemers[0].index, 0);
    assert!(plan.script_data_hash.is_some());
    assert_eq!(plan.collateral_inputs.len(), 1);
    assert_eq!(plan.collateral_inputs[0].coins, 5_000_000);
    assert!(plan.collateral_inputs[0].coins * 100 >= plan.fee * 150);

    let minted = AssetId::new(policy_id, AssetName::new(b"FREE".to_vec()).unwrap());
    assert_eq!(plan.change.len(), 2);
    assert_eq!(plan.change[0].coins, 30_000_000 - 186_182 - 1_344_798);
    assert_eq!(plan.change[1].token_bundle.get(&minted), 500);
    assert_eq!(plan.change[1].coins, 1_344_798);
    assert!(plan.is_balanced());
}

#[test]
fn test_plutus_mint_without_cost_model_fails() {
    let script = Script::PlutusV1(vec![0x01, 0x02]);
    let policy_id = script.policy_id().unwrap();
    let request = PlanRequest::new(own_address(), ProtocolParameters::alonzo())
        .with_script(script)
        .with_redeemer(Redeemer {
            target: RedeemerTarget::Mint(policy_id),
            data: PlutusData::Integer(0),
            ex_units: ExUnits::new(1, 1),
        })
        .with_mint(MintEntry {
            policy_id,
            asset_name: AssetName::new(b"x".to_vec()).unwrap(),
            quantity: 1,
        });
    let failure =
        plan_transaction(&request, &[utxo(1, 5_000_000), utxo(2, 30_000_000)], &PlannerConfig::default())
            .unwrap_err();
    assert!(failure.error.is_fatal());
}

#[test]
fn test_burning_more_than_held() {
    let utxos = vec![utxo(1, 10_000_000).with_tokens(TokenBundle::from_entries(vec![(asset(4, "x"), 3)]))];
    let request = PlanRequest::new(own_address(), ProtocolParameters::alonzo()).with_mint(MintEntry {
        policy_id: PolicyId([4; 28]),
        asset_name: AssetName::new(b"x".to_vec()).unwrap(),
        quantity: -5,
    });
    let failure = plan_transaction(&request, &utxos, &PlannerConfig::default()).unwrap_err();
    assert_eq!(failure.error, TxPlanError::InsufficientTokens(asset(4, "x")));
}

// ============================================================================
// Staking Scenarios
// ============================================================================

#[test]
fn test_stake_registration_pays_deposit() {
    let stake = Credential::Key([0x22; 28]);
    let request = PlanRequest::new(own_address(), ProtocolParameters::alonzo())
        .with_certificate(Certificate::StakeRegistration(stake))
        .with_certificate(Certificate::StakeDelegation {
            credential: stake,
            pool_key_hash: [0x44; 28],
        });
    let plan = plan_transaction(&request, &[utxo(1, 10_000_000)], &PlannerConfig::default()).unwrap();
    assert_eq!(plan.deposit, 2_000_000);
    assert_eq!(plan.change.len(), 1);
    assert_eq!(plan.change[0].coins, 10_000_000 - 2_000_000 - plan.fee);
    assert!(plan.is_balanced());
}

#[test]
fn test_reward_withdrawal_adds_to_change() {
    let stake = Credential::Key([0x22; 28]);
    let request = PlanRequest::new(own_address(), ProtocolParameters::alonzo()).with_withdrawal(
        Withdrawal {
            reward_address: Address::reward(stake, MAINNET_NETWORK_ID),
            amount: 4_000_000,
        },
    );
    let plan = plan_transaction(&request, &[utxo(1, 2_000_000)], &PlannerConfig::default()).unwrap();
    assert_eq!(plan.rewards, 4_000_000);
    assert_eq!(plan.change[0].coins, 6_000_000 - plan.fee);
    assert!(plan.is_balanced());
}

#[test]
fn test_deregistration_refund_counts_as_input() {
    let stake = Credential::Key([0x22; 28]);
    let request = PlanRequest::new(own_address(), ProtocolParameters::alonzo())
        .with_certificate(Certificate::StakeDeregistration(stake));
    let plan = plan_transaction(&request, &[utxo(1, 1_500_000)], &PlannerConfig::default()).unwrap();
    assert_eq!(plan.deposit, -2_000_000);
    assert_eq!(plan.change[0].coins, 3_500_000 - plan.fee);
}

// ============================================================================
// Strict Mode
// ============================================================================

#[test]
fn test_strict_mode_with_insufficient_inputs() {
    let request = PlanRequest::new(own_address(), ProtocolParameters::babbage())
        .with_output(TxOutput::new(payee(), 8_000_000));
    let failure = plan_transaction_strict(&request, &[utxo(1, 5_000_000)], &PlannerConfig::default())
        .unwrap_err();
    match failure.error {
        TxPlanError::InsufficientFunds { required, available } => {
            assert_eq!(available, 5_000_000);
            assert_eq!(required, 8_000_000 + failure.estimated_fee);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_mint_beyond_signed_range_is_fatal() {
    let request = PlanRequest::new(own_address(), ProtocolParameters::alonzo()).with_mint(MintEntry {
        policy_id: PolicyId([0x66; 28]),
        asset_name: AssetName::new(b"supply".to_vec()).unwrap(),
        quantity: i128::from(i64::MAX) + 1,
    });
    let failure = plan_transaction(&request, &[utxo(1, 5_000_000)], &PlannerConfig::default())
        .unwrap_err();
    assert!(matches!(failure.error, TxPlanError::NumberTooBig(_)));
    assert!(failure.error.is_fatal());
}

#[test]
fn test_number_too_big_stops_the_search() {
    let request = PlanRequest::new(own_address(), ProtocolParameters::alonzo())
        .with_output(TxOutput::new(payee(), i128::from(u64::MAX) + 1));
    let failure = plan_transaction(&request, &[utxo(1, 5_000_000)], &PlannerConfig::default())
        .unwrap_err();
    assert!(matches!(failure.error, TxPlanError::NumberTooBig(_)));
}
