//! Change and collateral solver.
//!
//! The fee depends on the transaction size, which depends on the change outputs, which
//! depend on the fee. Instead of iterating to a fixed point, a fixed input set is balanced
//! by a bounded case analysis:
//!
//! 1. tokens and ADA balance exactly: no change;
//! 2. only ADA remains and it cannot fund a change output: it is folded into the fee;
//! 3. only ADA remains and it can: one ADA-only change output, fee recomputed with it;
//! 4. tokens remain: token change outputs of at most `max_output_tokens` assets each, each
//!    funded at its minimum, plus either an ADA-only change output for the leftover or the
//!    leftover folded into the first token change output.
//!
//! Collateral is topped up after every fee computation.

use std::collections::BTreeSet;

use log::debug;

use crate::arrange::{arrange, ArrangedUtxos};
use crate::config::PlannerConfig;
use crate::draft::build_draft;
use crate::error::{TxPlanError, TxPlanFailure};
use crate::fee::{collateral_input_penalty, compute_min_fee};
use crate::min_utxo::compute_min_utxo;
use crate::plan::{PlanRequest, TxPlan, TxPlanDraft, TxPlanResult};
use crate::token::TokenBundle;
use crate::types::{Lovelace, TxInput, TxOutput, Utxo};
use crate::validator::validate_plan;

/// Collateral needed to cover `fee`: `ceil(fee * percentage / 100)`.
pub fn required_collateral(fee: Lovelace, collateral_percentage: u64) -> Lovelace {
    let scaled = fee * Lovelace::from(collateral_percentage);
    (scaled + 99) / 100
}

/// Chooses collateral for a plan whose fee is `fee`.
///
/// Staged collateral that already covers the requirement is kept as is. With nothing staged,
/// the smallest single candidate that covers the requirement (including the fee of the extra
/// input) wins. Otherwise candidates are added from largest to smallest until the requirement
/// is met or the protocol limit on collateral inputs is reached.
pub fn add_collaterals_if_needed(
    plan: &TxPlan,
    fee: Lovelace,
    candidates: &[Utxo],
) -> Result<Vec<Utxo>, TxPlanError> {
    let params = &plan.protocol_parameters;
    let percentage = params.collateral_percentage;
    let mut chosen = plan.collateral_inputs.clone();
    let mut total: Lovelace = chosen.iter().map(|utxo| utxo.coins).sum();
    if !chosen.is_empty() && total >= required_collateral(fee, percentage) {
        return Ok(chosen);
    }

    let used: BTreeSet<TxInput> = plan
        .inputs
        .iter()
        .chain(chosen.iter())
        .map(Utxo::input)
        .collect();
    let mut available: Vec<&Utxo> = candidates
        .iter()
        .filter(|utxo| utxo.is_ada_only() && !used.contains(&utxo.input()))
        .collect();

    if chosen.is_empty() {
        available.sort_by_key(|utxo| utxo.coins);
        for candidate in &available {
            let penalty = collateral_input_penalty(candidate, params)?;
            if candidate.coins >= required_collateral(fee + penalty, percentage) {
                debug!("single collateral {} lovelace", candidate.coins);
                return Ok(vec![(*candidate).clone()]);
            }
        }
    }

    available.sort_by(|a, b| b.coins.cmp(&a.coins));
    let mut penalties: Lovelace = 0;
    for candidate in available {
        if chosen.len() >= params.max_collateral_inputs as usize {
            return Err(TxPlanError::TooManyCollateralInputs {
                max: params.max_collateral_inputs,
            });
        }
        penalties += collateral_input_penalty(candidate, params)?;
        total += candidate.coins;
        chosen.push(candidate.clone());
        if total >= required_collateral(fee + penalties, percentage) {
            debug!("{} collateral inputs, {} lovelace", chosen.len(), total);
            chosen.sort_by_key(Utxo::input);
            return Ok(chosen);
        }
    }
    Err(TxPlanError::InsufficientCollateral {
        required: required_collateral(fee + penalties, percentage),
    })
}

/// State shared by every balancing attempt over one input set.
struct Balancer<'a> {
    draft: &'a TxPlanDraft,
    inputs: &'a [Utxo],
    candidates: &'a [Utxo],
    input_coins: Lovelace,
    output_coins: Lovelace,
}

impl<'a> Balancer<'a> {
    fn failure(&self, error: TxPlanError, fee: Lovelace, minimal: Lovelace) -> TxPlanFailure {
        TxPlanFailure::with_context(error, fee, self.draft.deposit, minimal)
    }

    /// Plan with the given change outputs and its size-derived fee, collateral included.
    fn plan_with_fee(&self, change: Vec<TxOutput>) -> Result<TxPlan, TxPlanFailure> {
        let mut plan = TxPlan::assemble(
            self.draft,
            self.inputs.to_vec(),
            self.draft.collateral_inputs.clone(),
            change,
        )?;
        let mut fee = compute_min_fee(&plan)?;
        if plan.requires_collateral() {
            plan.collateral_inputs = add_collaterals_if_needed(&plan, fee, self.candidates)
                .map_err(|error| self.failure(error, fee, 0))?;
            fee = compute_min_fee(&plan)?;
        }
        plan.fee = fee;
        plan.base_fee = fee;
        Ok(plan)
    }

    /// Leftover ADA once `fee` and `reserved` change lovelace are paid.
    fn leftover(&self, fee: Lovelace, reserved: Lovelace) -> Lovelace {
        self.input_coins - self.output_coins - fee - reserved
    }

    /// Raises the fee by `extra` and re-checks collateral for the higher fee.
    fn fold_into_fee(&self, mut plan: TxPlan, extra: Lovelace) -> TxPlanResult {
        debug!("folding {} lovelace into the fee", extra);
        plan.fee += extra;
        if plan.requires_collateral() {
            let before = plan.collateral_inputs.len();
            let fee = plan.fee;
            plan.collateral_inputs = add_collaterals_if_needed(&plan, fee, self.candidates)
                .map_err(|error| self.failure(error, fee, 0))?;
            if plan.collateral_inputs.len() != before {
                plan.base_fee = compute_min_fee(&plan)?;
                if plan.base_fee > plan.fee {
                    return Err(self.failure(
                        TxPlanError::InsufficientFunds {
                            required: self.output_coins + plan.base_fee,
                            available: self.input_coins,
                        },
                        plan.base_fee,
                        0,
                    ));
                }
            }
        }
        Ok(plan)
    }

    fn solve(&self, config: &PlannerConfig) -> TxPlanResult {
        let draft = self.draft;
        let params = &draft.protocol_parameters;

        let mut consumed = TokenBundle::aggregate(self.inputs.iter().map(|u| &u.token_bundle));
        consumed.merge(&draft.mint);
        let produced = TokenBundle::aggregate(draft.outputs.iter().map(|o| &o.token_bundle));
        let remaining_tokens = consumed.difference(&produced);
        if let Some((asset, _)) = remaining_tokens.first_negative() {
            return Err(self.failure(TxPlanError::InsufficientTokens(asset.clone()), 0, 0));
        }

        let plan = self.plan_with_fee(Vec::new())?;
        let fee = plan.fee;
        let remaining = self.leftover(fee, 0);
        if remaining < 0 {
            return Err(self.failure(
                TxPlanError::InsufficientFunds {
                    required: self.output_coins + fee,
                    available: self.input_coins,
                },
                fee,
                0,
            ));
        }

        if remaining_tokens.is_empty() {
            if remaining == 0 {
                return Ok(plan);
            }
            let change = TxOutput::new(draft.change_address.clone(), remaining);
            let min = compute_min_utxo(&change, params)?;
            if remaining >= min {
                let mut with_change = self.plan_with_fee(vec![change])?;
                let change_coins = self.leftover(with_change.fee, 0);
                if change_coins >= min {
                    with_change.change[0].coins = change_coins;
                    return Ok(with_change);
                }
            }
            return self.fold_into_fee(plan, remaining);
        }

        let mut token_change: Vec<TxOutput> = remaining_tokens
            .chunks(config.max_output_tokens)
            .into_iter()
            .map(|bundle| TxOutput::new(draft.change_address.clone(), 0).with_tokens(bundle))
            .collect();
        let mut minimal: Lovelace = 0;
        for output in &mut token_change {
            output.coins = compute_min_utxo(output, params)?;
            minimal += output.coins;
        }

        let mut with_tokens = self.plan_with_fee(token_change.clone())?;
        let token_fee = with_tokens.fee;
        let leftover = self.leftover(token_fee, minimal);
        if leftover < 0 {
            return Err(self.failure(
                TxPlanError::InsufficientFunds {
                    required: self.output_coins + token_fee + minimal,
                    available: self.input_coins,
                },
                token_fee,
                minimal,
            ));
        }

        let ada_change = TxOutput::new(draft.change_address.clone(), leftover);
        let ada_min = compute_min_utxo(&ada_change, params)?;
        if leftover >= ada_min {
            let mut change = vec![ada_change];
            change.extend(token_change);
            let mut with_both = self.plan_with_fee(change)?;
            let ada_coins = self.leftover(with_both.fee, minimal);
            if ada_coins >= ada_min {
                with_both.change[0].coins = ada_coins;
                return Ok(with_both);
            }
        }

        debug!("folding {} lovelace into the first token change output", leftover);
        with_tokens.change[0].coins += leftover;
        Ok(with_tokens)
    }
}

/// Balances a fixed input set (required inputs included by the caller).
pub fn compute_plan(
    draft: &TxPlanDraft,
    inputs: &[Utxo],
    candidates: &[Utxo],
    config: &PlannerConfig,
) -> TxPlanResult {
    if inputs.is_empty() {
        return Err(TxPlanFailure::new(TxPlanError::NoInputs));
    }
    let balancer = Balancer {
        draft,
        inputs,
        candidates,
        input_coins: inputs.iter().map(|utxo| utxo.coins).sum::<Lovelace>() + draft.rewards,
        output_coins: draft.outputs.iter().map(|output| output.coins).sum::<Lovelace>()
            + draft.deposit,
    };
    balancer.solve(config)
}

/// Greedy mode: required inputs first, then one more arranged UTxO per attempt.
///
/// Stops at the first plan whose fee equals its size-derived fee. Otherwise, once every
/// UTxO has been tried, returns the plan with the least ADA folded into the fee (fewest
/// inputs on ties), or the last failure.
pub fn solve_greedy(
    draft: &TxPlanDraft,
    arranged: &ArrangedUtxos,
    config: &PlannerConfig,
) -> TxPlanResult {
    let mut best: Option<TxPlan> = None;
    let mut last_failure: Option<TxPlanFailure> = None;

    for count in 0..=arranged.spendable.len() {
        let mut inputs = draft.required_inputs.clone();
        inputs.extend_from_slice(&arranged.spendable[..count]);
        if inputs.is_empty() {
            continue;
        }
        match compute_plan(draft, &inputs, &arranged.collateral_candidates, config) {
            Ok(plan) if plan.fee == plan.base_fee => {
                debug!("{} inputs balance exactly, fee {}", inputs.len(), plan.fee);
                validate_plan(&plan)?;
                return Ok(plan);
            }
            Ok(plan) => {
                let slack = plan.fee - plan.base_fee;
                debug!("{} inputs leave {} lovelace of slack", inputs.len(), slack);
                let better = best
                    .as_ref()
                    .map_or(true, |current| slack < current.fee - current.base_fee);
                if better {
                    best = Some(plan);
                }
            }
            Err(failure) if failure.error.is_fatal() => return Err(failure),
            Err(failure) => {
                debug!("{} inputs: {}", inputs.len(), failure);
                last_failure = Some(failure);
            }
        }
    }

    match (best, last_failure) {
        (Some(plan), _) => {
            debug!("accepting plan with fee {} over base fee {}", plan.fee, plan.base_fee);
            validate_plan(&plan)?;
            Ok(plan)
        }
        (None, Some(failure)) => Err(failure),
        (None, None) => Err(TxPlanFailure::new(TxPlanError::NoInputs)),
    }
}

/// Strict mode: the caller fixes the inputs; only fee, change and collateral are computed.
pub fn solve_strict(
    draft: &TxPlanDraft,
    inputs: &[Utxo],
    candidates: &[Utxo],
    config: &PlannerConfig,
) -> TxPlanResult {
    let mut all_inputs = draft.required_inputs.clone();
    for utxo in inputs {
        if !all_inputs.iter().any(|existing| existing.input() == utxo.input()) {
            all_inputs.push(utxo.clone());
        }
    }
    let plan = compute_plan(draft, &all_inputs, candidates, config)?;
    validate_plan(&plan)?;
    Ok(plan)
}

/// Draft, arrange and solve greedily over `utxos`.
pub fn plan_transaction(
    request: &PlanRequest,
    utxos: &[Utxo],
    config: &PlannerConfig,
) -> TxPlanResult {
    let draft = build_draft(request)?;
    let arranged = arrange(utxos, request, config);
    solve_greedy(&draft, &arranged, config)
}

/// Draft and solve over exactly `inputs`.
pub fn plan_transaction_strict(
    request: &PlanRequest,
    inputs: &[Utxo],
    config: &PlannerConfig,
) -> TxPlanResult {
    let draft = build_draft(request)?;
    let candidates = request.potential_collaterals.clone().unwrap_or_default();
    solve_strict(&draft, inputs, &candidates, config)
}
