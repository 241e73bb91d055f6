//! Two-phase planning of a script spend against a mock evaluator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use walletd_cardano::{
    plan_with_evaluation, Address, CacheConfig, CachingOracle, CostModel, Credential, DatumOption,
    EvaluatedRedeemer, EvaluationError, ExUnits, Language, Lovelace, PlanRequest, PlannerConfig,
    PlanningError, PlutusData, ProtocolParameters, Redeemer, RedeemerTag, RedeemerTarget, Script,
    ScriptEvaluationOracle, TxHash, TxOutput, Utxo, MAINNET_NETWORK_ID,
};

const MEASURED: ExUnits = ExUnits {
    memory: 250_000,
    steps: 90_000_000,
};

/// Reports fixed units for every spend redeemer it is told about.
struct MockEvaluator {
    spend_indices: Vec<u32>,
    calls: AtomicUsize,
}

#[async_trait]
impl ScriptEvaluationOracle for MockEvaluator {
    async fn evaluate(&self, tx: &[u8]) -> Result<Vec<EvaluatedRedeemer>, EvaluationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if tx.first() != Some(&0x84) {
            return Err(EvaluationError::Rejected("not a transaction".to_string()));
        }
        Ok(self
            .spend_indices
            .iter()
            .map(|&index| EvaluatedRedeemer {
                tag: RedeemerTag::Spend,
                index,
                ex_units: MEASURED,
            })
            .collect())
    }
}

fn wallet_address() -> Address {
    Address::base(
        Credential::Key([0x11; 28]),
        Credential::Key([0x22; 28]),
        MAINNET_NETWORK_ID,
    )
}

fn wallet_utxo(hash: u8, coins: Lovelace) -> Utxo {
    Utxo::new(TxHash([hash; 32]), 0, wallet_address(), coins)
}

fn script_spend() -> (PlanRequest, Vec<Utxo>) {
    let script = Script::PlutusV2(vec![0x4e, 0x4d, 0x01, 0x00, 0x00, 0x33, 0x22, 0x22, 0x20, 0x05]);
    let script_hash = script.hash().unwrap();
    let datum = PlutusData::constr(0, vec![PlutusData::Integer(42)]);
    let locked = Utxo::new(
        TxHash([0x01; 32]),
        0,
        Address::enterprise(Credential::Script(script_hash), MAINNET_NETWORK_ID),
        3_000_000,
    )
    .with_datum(DatumOption::Hash(datum.hash().unwrap()));

    let params = ProtocolParameters::babbage().with_cost_model(
        Language::PlutusV2,
        (0..10).map(|i| (format!("p{}", i), i * 7)).collect::<CostModel>(),
    );
    let request = PlanRequest::new(wallet_address(), params)
        .with_required_input(locked.clone())
        .with_script(script)
        .with_datum(datum)
        .with_redeemer(Redeemer {
            target: RedeemerTarget::Spend(locked.input()),
            data: PlutusData::constr(0, vec![]),
            ex_units: ExUnits::ZERO,
        })
        .with_output(TxOutput::new(
            Address::enterprise(Credential::Key([0x33; 28]), MAINNET_NETWORK_ID),
            2_500_000,
        ));
    let utxos = vec![wallet_utxo(0x10, 5_000_000), wallet_utxo(0x20, 20_000_000)];
    (request, utxos)
}

// ============================================================================
// Two-Phase Planning
// ============================================================================

#[tokio::test]
async fn test_script_spend_uses_measured_units() {
    let (request, utxos) = script_spend();
    let oracle = MockEvaluator {
        spend_indices: vec![0],
        calls: AtomicUsize::new(0),
    };

    let plan = plan_with_evaluation(&request, &utxos, &PlannerConfig::default(), &oracle)
        .await
        .unwrap();

    assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    assert_eq!(plan.redeemers.len(), 1);
    assert_eq!(plan.redeemers[0].tag, RedeemerTag::Spend);
    assert_eq!(plan.redeemers[0].index, 0);
    assert_eq!(plan.redeemers[0].ex_units, MEASURED);
    assert_eq!(plan.inputs[0].input(), request.required_inputs[0].input());
    assert_eq!(plan.collateral_inputs.len(), 1);
    assert!(plan.script_data_hash.is_some());
    assert!(plan.is_balanced());
}

#[tokio::test]
async fn test_unreported_redeemer_is_an_evaluation_error() {
    let (request, utxos) = script_spend();
    let oracle = MockEvaluator {
        spend_indices: vec![3],
        calls: AtomicUsize::new(0),
    };
    let err = plan_with_evaluation(&request, &utxos, &PlannerConfig::default(), &oracle)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlanningError::Evaluation(EvaluationError::MissingRedeemer {
            tag: RedeemerTag::Spend,
            index: 0
        })
    ));
}

#[tokio::test]
async fn test_cached_oracle_evaluates_once() {
    let (request, utxos) = script_spend();
    let oracle = CachingOracle::new(
        MockEvaluator {
            spend_indices: vec![0],
            calls: AtomicUsize::new(0),
        },
        CacheConfig::default().with_ttl(Duration::from_secs(300)),
    );

    let first = plan_with_evaluation(&request, &utxos, &PlannerConfig::default(), &oracle)
        .await
        .unwrap();
    let second = plan_with_evaluation(&request, &utxos, &PlannerConfig::default(), &oracle)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(oracle.inner().calls.load(Ordering::SeqCst), 1);
    assert_eq!(oracle.cached_entries(), 1);
}
