//! Normalizes a [`PlanRequest`] into a [`TxPlanDraft`].

use std::collections::BTreeSet;

use log::warn;

use crate::cbor::{check_range, check_signed_range};
use crate::error::{CardanoError, Result};
use crate::fee::compute_deposit;
use crate::min_utxo::compute_min_utxo;
use crate::plan::{PlanRequest, TxPlanDraft};
use crate::token::{AssetId, TokenBundle};
use crate::types::{Lovelace, RedeemerTarget, TxInput, TxOutput};

fn check_output_range(output: &TxOutput) -> Result<()> {
    check_range(output.coins)?;
    output
        .token_bundle
        .iter()
        .try_for_each(|(_, quantity)| check_range(quantity))
}

/// Raises explicit outputs to their minimum, aggregates mint, deduplicates datums and
/// scripts and checks that every redeemer target exists.
pub fn build_draft(request: &PlanRequest) -> Result<TxPlanDraft> {
    let params = &request.protocol_parameters;
    params.validate()?;

    let mut additional_lovelace: Lovelace = 0;
    let mut outputs = Vec::with_capacity(request.outputs.len());
    for output in &request.outputs {
        check_output_range(output)?;
        let mut output = output.clone();
        let min = compute_min_utxo(&output, params)?;
        if output.coins < min {
            warn!(
                "output to {} raised from {} to its minimum of {} lovelace",
                output.address, output.coins, min
            );
            additional_lovelace += min - output.coins;
            output.coins = min;
        }
        outputs.push(output);
    }

    let mint: TokenBundle = request
        .mint
        .iter()
        .map(|entry| {
            (
                AssetId::new(entry.policy_id, entry.asset_name.clone()),
                entry.quantity,
            )
        })
        .collect();
    mint.iter().try_for_each(|(_, quantity)| check_signed_range(quantity))?;

    let mut datum_hashes = BTreeSet::new();
    let mut datums = Vec::new();
    for datum in &request.datums {
        if datum_hashes.insert(datum.hash()?) {
            datums.push(datum.clone());
        }
    }

    let mut script_hashes = BTreeSet::new();
    let mut scripts = Vec::new();
    for script in &request.scripts {
        if script_hashes.insert(script.hash()?) {
            scripts.push(script.clone());
        }
    }

    let required: BTreeSet<TxInput> = request.required_inputs.iter().map(|u| u.input()).collect();
    for redeemer in &request.redeemers {
        let known = match &redeemer.target {
            RedeemerTarget::Spend(input) => required.contains(input),
            RedeemerTarget::Mint(policy_id) => mint.assets().any(|a| a.policy_id == *policy_id),
            RedeemerTarget::Cert(index) => *index < request.certificates.len(),
            RedeemerTarget::Reward(address) => request
                .withdrawals
                .iter()
                .any(|w| w.reward_address == *address),
        };
        if !known {
            return Err(CardanoError::UnresolvedRedeemer(format!("{:?}", redeemer.target)));
        }
    }

    for withdrawal in &request.withdrawals {
        check_range(withdrawal.amount)?;
    }
    if let Some(metadata) = &request.metadata {
        metadata.validate()?;
    }

    let mut required_signers = request.required_signers.clone();
    required_signers.sort();
    required_signers.dedup();

    Ok(TxPlanDraft {
        outputs,
        change_address: request.change_address.clone(),
        certificates: request.certificates.clone(),
        withdrawals: request.withdrawals.clone(),
        mint,
        datums,
        scripts,
        redeemers: request.redeemers.clone(),
        required_signers,
        required_inputs: request.required_inputs.clone(),
        collateral_inputs: request.collateral_inputs.clone(),
        metadata: request.metadata.clone(),
        ttl: request.ttl,
        validity_interval_start: request.validity_interval_start,
        network_id: request.network_id,
        protocol_parameters: params.clone(),
        additional_lovelace,
        deposit: compute_deposit(&request.certificates, params),
        rewards: request.withdrawals.iter().map(|w| w.amount).sum(),
    })
}
