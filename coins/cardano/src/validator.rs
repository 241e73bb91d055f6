//! Protocol limit checks on a solved plan.

use log::debug;

use crate::cbor::{check_range, encode::value_bytes};
use crate::error::{TxPlanError, TxPlanFailure};
use crate::fee::estimate_size;
use crate::min_utxo::compute_min_utxo;
use crate::plan::TxPlan;
use crate::solver::required_collateral;
use crate::types::{Lovelace, TxOutput};

fn check_output(
    output: &TxOutput,
    plan: &TxPlan,
    too_small: fn(Lovelace, Lovelace) -> TxPlanError,
) -> Result<(), TxPlanError> {
    let params = &plan.protocol_parameters;
    check_range(output.coins)?;
    let min = compute_min_utxo(output, params)?;
    if output.coins < min {
        return Err(too_small(output.coins, min));
    }
    let size = value_bytes(output.coins, &output.token_bundle)?.len() as u64;
    if size > params.max_value_size {
        return Err(TxPlanError::OutputTooBig {
            size,
            max: params.max_value_size,
        });
    }
    Ok(())
}

fn check_collateral(plan: &TxPlan) -> Result<(), TxPlanError> {
    let params = &plan.protocol_parameters;
    if plan.collateral_inputs.iter().any(|utxo| !utxo.is_ada_only()) {
        return Err(TxPlanError::BadCollaterals);
    }
    if plan.collateral_inputs.len() > params.max_collateral_inputs as usize {
        return Err(TxPlanError::TooManyCollateralInputs {
            max: params.max_collateral_inputs,
        });
    }
    let total: Lovelace = plan.collateral_inputs.iter().map(|utxo| utxo.coins).sum();
    let required = required_collateral(plan.fee, params.collateral_percentage);
    if plan.collateral_inputs.is_empty() || total < required {
        return Err(TxPlanError::InsufficientCollateral { required });
    }
    if let Some(budget) = &params.max_tx_ex_units {
        if !plan.total_ex_units().fits_within(budget) {
            return Err(TxPlanError::ExUnitsTooBig);
        }
    }
    Ok(())
}

fn check(plan: &TxPlan) -> Result<(), TxPlanError> {
    let params = &plan.protocol_parameters;
    check_range(plan.fee)?;

    for output in &plan.outputs {
        check_output(output, plan, |coins, min| TxPlanError::OutputTooSmall { coins, min })?;
    }
    for output in &plan.change {
        check_output(output, plan, |coins, min| TxPlanError::ChangeOutputTooSmall { coins, min })?;
    }

    let size = estimate_size(plan)?;
    if size > params.max_tx_size {
        return Err(TxPlanError::TxTooBig {
            size,
            max: params.max_tx_size,
        });
    }

    if plan.requires_collateral() {
        check_collateral(plan)?;
    }

    if !plan.withdrawals.is_empty() && plan.outputs.is_empty() && plan.rewards < plan.fee {
        return Err(TxPlanError::RewardsBalanceTooLow {
            rewards: plan.rewards,
            fee: plan.fee,
        });
    }
    Ok(())
}

/// Checks a solved plan against output minimums, size limits, collateral rules and the
/// execution budget.
pub fn validate_plan(plan: &TxPlan) -> Result<(), TxPlanFailure> {
    check(plan).map_err(|error| {
        debug!("plan rejected: {}", error);
        let minimal: Lovelace = plan
            .change
            .iter()
            .filter(|output| !output.token_bundle.is_empty())
            .filter_map(|output| compute_min_utxo(output, &plan.protocol_parameters).ok())
            .sum();
        TxPlanFailure::with_context(error, plan.fee, plan.deposit, minimal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{Address, Credential};
    use crate::cbor::PlutusData;
    use crate::config::MAINNET_NETWORK_ID;
    use crate::draft::build_draft;
    use crate::plan::PlanRequest;
    use crate::protocol_params::ProtocolParameters;
    use crate::token::{AssetId, AssetName, PolicyId, TokenBundle};
    use crate::types::{ExUnits, MintEntry, Redeemer, RedeemerTarget, TxHash, Utxo, Withdrawal};

    fn address() -> Address {
        Address::enterprise(Credential::Key([1; 28]), MAINNET_NETWORK_ID)
    }

    fn utxo(hash: u8, coins: Lovelace) -> Utxo {
        Utxo::new(TxHash([hash; 32]), 0, address(), coins)
    }

    fn plan_for(request: &PlanRequest, inputs: Vec<Utxo>, fee: Lovelace) -> TxPlan {
        let draft = build_draft(request).unwrap();
        let mut plan = TxPlan::assemble(&draft, inputs, draft.collateral_inputs.clone(), vec![]).unwrap();
        plan.fee = fee;
        plan.base_fee = fee;
        plan
    }

    fn request() -> PlanRequest {
        PlanRequest::new(address(), ProtocolParameters::alonzo())
    }

    // ========================================================================
    // Output Tests
    // ========================================================================

    #[test]
    fn test_valid_plan() {
        let request = request().with_output(TxOutput::new(address(), 2_000_000));
        let plan = plan_for(&request, vec![utxo(1, 2_200_000)], 200_000);
        assert!(validate_plan(&plan).is_ok());
    }

    #[test]
    fn test_change_output_too_small() {
        let request = request().with_output(TxOutput::new(address(), 2_000_000));
        let mut plan = plan_for(&request, vec![utxo(1, 3_000_000)], 200_000);
        plan.change.push(TxOutput::new(address(), 800_000));
        let failure = validate_plan(&plan).unwrap_err();
        assert_eq!(
            failure.error,
            TxPlanError::ChangeOutputTooSmall { coins: 800_000, min: 999_978 }
        );
        assert_eq!(failure.estimated_fee, 200_000);
    }

    #[test]
    fn test_output_value_too_big() {
        let bundle: TokenBundle = (0..200u32)
            .map(|i| {
                let mut policy = [0u8; 28];
                policy[..4].copy_from_slice(&i.to_be_bytes());
                (AssetId::new(PolicyId(policy), AssetName::new(b"token".to_vec()).unwrap()), 1)
            })
            .collect();
        let request = request().with_output(TxOutput::new(address(), 2_000_000));
        let mut plan = plan_for(&request, vec![utxo(1, 100_000_000)], 200_000);
        plan.change.push(TxOutput::new(address(), 90_000_000).with_tokens(bundle));
        let failure = validate_plan(&plan).unwrap_err();
        assert!(matches!(failure.error, TxPlanError::OutputTooBig { max: 5000, .. }));
    }

    #[test]
    fn test_tx_too_big() {
        let mut params = ProtocolParameters::alonzo();
        params.max_tx_size = 150;
        let request = PlanRequest::new(address(), params).with_output(TxOutput::new(address(), 2_000_000));
        let plan = plan_for(&request, vec![utxo(1, 2_200_000)], 200_000);
        let failure = validate_plan(&plan).unwrap_err();
        assert!(matches!(failure.error, TxPlanError::TxTooBig { max: 150, .. }));
    }

    // ========================================================================
    // Collateral Tests
    // ========================================================================

    fn script_request() -> PlanRequest {
        request()
            .with_output(TxOutput::new(address(), 2_000_000))
            .with_mint(MintEntry {
                policy_id: PolicyId([5; 28]),
                asset_name: AssetName::new(b"nft".to_vec()).unwrap(),
                quantity: 1,
            })
            .with_redeemer(Redeemer {
                target: RedeemerTarget::Mint(PolicyId([5; 28])),
                data: PlutusData::Integer(0),
                ex_units: ExUnits::new(1_000, 1_000),
            })
    }

    #[test]
    fn test_missing_collateral() {
        let plan = plan_for(&script_request(), vec![utxo(1, 2_300_000)], 300_000);
        let failure = validate_plan(&plan).unwrap_err();
        assert_eq!(failure.error, TxPlanError::InsufficientCollateral { required: 450_000 });
    }

    #[test]
    fn test_token_collateral_rejected() {
        let mut plan = plan_for(&script_request(), vec![utxo(1, 2_300_000)], 300_000);
        let bundle = TokenBundle::from_entries(vec![(
            AssetId::new(PolicyId([9; 28]), AssetName::new(b"x".to_vec()).unwrap()),
            1,
        )]);
        plan.collateral_inputs.push(utxo(2, 5_000_000).with_tokens(bundle));
        assert_eq!(validate_plan(&plan).unwrap_err().error, TxPlanError::BadCollaterals);
    }

    #[test]
    fn test_ex_units_over_budget() {
        let mut params = ProtocolParameters::alonzo();
        params.max_tx_ex_units = Some(ExUnits::new(500, 500));
        let mut request = script_request();
        request.protocol_parameters = params;
        let mut plan = plan_for(&request, vec![utxo(1, 2_300_000)], 300_000);
        plan.collateral_inputs.push(utxo(2, 5_000_000));
        assert_eq!(validate_plan(&plan).unwrap_err().error, TxPlanError::ExUnitsTooBig);
    }

    // ========================================================================
    // Withdrawal Tests
    // ========================================================================

    #[test]
    fn test_rewards_balance_too_low() {
        let stake = Credential::Key([4; 28]);
        let request = request().with_withdrawal(Withdrawal {
            reward_address: Address::reward(stake, MAINNET_NETWORK_ID),
            amount: 100_000,
        });
        let mut plan = plan_for(&request, vec![utxo(1, 5_000_000)], 180_000);
        plan.change.push(TxOutput::new(address(), 4_920_000));
        assert_eq!(
            validate_plan(&plan).unwrap_err().error,
            TxPlanError::RewardsBalanceTooLow { rewards: 100_000, fee: 180_000 }
        );
    }
}
