//! Two-phase planning for transactions that run Plutus scripts.
//!
//! Execution units are unknown until the scripts run against a concrete transaction, so the
//! first phase plans with placeholder units, an external oracle evaluates the resulting
//! transaction, and the second phase re-solves over the same inputs with the measured units.

use async_trait::async_trait;
use log::info;

use crate::arrange::arrange;
use crate::config::PlannerConfig;
use crate::error::{EvaluationError, PlanningError};
use crate::plan::{PlanRequest, TxPlan};
use crate::protocol_params::ProtocolParameters;
use crate::solver::{plan_transaction, plan_transaction_strict};
use crate::types::{ExUnits, RedeemerTag, Utxo};

/// Execution units measured for one redeemer, addressed by its pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatedRedeemer {
    pub tag: RedeemerTag,
    pub index: u32,
    pub ex_units: ExUnits,
}

/// Runs the scripts of an unsigned transaction and reports what each redeemer consumed.
#[async_trait]
pub trait ScriptEvaluationOracle: Send + Sync {
    async fn evaluate(&self, tx: &[u8]) -> Result<Vec<EvaluatedRedeemer>, EvaluationError>;
}

/// Units assumed per redeemer before evaluation: the configured value, or the per-transaction
/// budget split evenly across `redeemers`.
pub fn placeholder_ex_units(
    params: &ProtocolParameters,
    config: &PlannerConfig,
    redeemers: usize,
) -> ExUnits {
    if let Some(units) = config.placeholder_ex_units {
        return units;
    }
    match params.max_tx_ex_units {
        Some(budget) if redeemers > 0 => {
            let count = redeemers as u64;
            ExUnits::new(budget.memory / count, budget.steps / count)
        }
        _ => ExUnits::ZERO,
    }
}

/// Plans, evaluates and re-plans.
///
/// Requests without redeemers are planned directly. Otherwise the placeholder plan fixes
/// the inputs and collateral; the final plan keeps both and only its fee and change move.
pub async fn plan_with_evaluation<O>(
    request: &PlanRequest,
    utxos: &[Utxo],
    config: &PlannerConfig,
    oracle: &O,
) -> Result<TxPlan, PlanningError>
where
    O: ScriptEvaluationOracle + ?Sized,
{
    if request.redeemers.is_empty() {
        return Ok(plan_transaction(request, utxos, config)?);
    }

    let placeholder = placeholder_ex_units(
        &request.protocol_parameters,
        config,
        request.redeemers.len(),
    );
    let mut first = request.clone();
    for redeemer in &mut first.redeemers {
        redeemer.ex_units = placeholder;
    }
    let provisional = plan_transaction(&first, utxos, config)?;

    let tx = provisional.unsigned_tx_bytes()?;
    info!(
        "evaluating {} redeemers against a {} byte transaction",
        provisional.redeemers.len(),
        tx.len()
    );
    let evaluated = oracle.evaluate(&tx).await?;

    let mut second = request.clone();
    for (redeemer, resolved) in second.redeemers.iter_mut().zip(&provisional.redeemers) {
        let measured = evaluated
            .iter()
            .find(|e| e.tag == resolved.tag && e.index == resolved.index)
            .ok_or(EvaluationError::MissingRedeemer {
                tag: resolved.tag,
                index: resolved.index,
            })?;
        redeemer.ex_units = measured.ex_units;
    }
    if second.potential_collaterals.is_none() {
        second.potential_collaterals = Some(arrange(utxos, request, config).collateral_candidates);
    }
    second.collateral_inputs = provisional.collateral_inputs.clone();

    let plan = plan_transaction_strict(&second, &provisional.inputs, config)?;
    info!(
        "re-solved with measured execution units: fee {} -> {}",
        provisional.fee, plan.fee
    );
    Ok(plan)
}
