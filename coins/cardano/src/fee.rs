//! Transaction size estimation and the linear fee function.
//!
//! The estimate serializes the whole transaction with not-yet-fixed scalars (output coins,
//! fee, ttl, validity start) at their worst-case width and with dummy witnesses for every
//! distinct signer, so the result never undershoots the signed size.

use std::collections::BTreeSet;

use log::trace;

use crate::address::{Address, KeyHash};
use crate::cbor::encode::{self, input_size, BootstrapWitness, Scalars};
use crate::error::Result;
use crate::plan::TxPlan;
use crate::protocol_params::ProtocolParameters;
use crate::types::{Certificate, ExUnits, Lovelace, Script, Utxo};

/// Size of one `[vkey, signature]` witness.
pub const VKEY_WITNESS_SIZE: u64 = 101;

/// Distinct parties that must sign the transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signers {
    pub shelley: BTreeSet<KeyHash>,
    pub byron: BTreeSet<Address>,
}

impl Signers {
    fn add_address(&mut self, address: &Address) {
        if address.is_byron() {
            self.byron.insert(address.clone());
        } else if let Some(hash) = address.payment_credential().and_then(|c| c.key_hash().copied()) {
            self.shelley.insert(hash);
        }
    }

    pub fn len(&self) -> usize {
        self.shelley.len() + self.byron.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Signers of inputs, collateral, certificates, withdrawals, required signers and native
/// script keys.
pub fn collect_signers(plan: &TxPlan) -> Signers {
    let mut signers = Signers::default();
    for utxo in plan.inputs.iter().chain(plan.collateral_inputs.iter()) {
        signers.add_address(&utxo.address);
    }
    for certificate in plan.certificates.iter().filter(|c| c.requires_witness()) {
        if let Some(hash) = certificate.credential().key_hash() {
            signers.shelley.insert(*hash);
        }
    }
    for withdrawal in &plan.withdrawals {
        if let Some(hash) = withdrawal
            .reward_address
            .stake_credential()
            .and_then(|c| c.key_hash().copied())
        {
            signers.shelley.insert(hash);
        }
    }
    signers.shelley.extend(plan.required_signers.iter().copied());
    for script in &plan.scripts {
        if let Script::Native(native) = script {
            signers.shelley.extend(native.key_hashes());
        }
    }
    signers
}

/// Witness set with placeholder signatures for every signer.
fn estimated_witness_set(plan: &TxPlan) -> Result<Vec<u8>> {
    let signers = collect_signers(plan);
    let mut set = plan.witness_skeleton();
    set.vkey_witnesses = signers.shelley.iter().map(|_| ([0u8; 32], [0u8; 64])).collect();
    set.bootstrap_witnesses = signers
        .byron
        .iter()
        .map(|address| {
            Ok(BootstrapWitness {
                public_key: [0u8; 32],
                signature: [0u8; 64],
                chain_code: [0u8; 32],
                attributes: address.byron_attributes()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    encode::witness_set_bytes(&set)
}

/// Conservative size of the signed transaction in bytes.
pub fn estimate_size(plan: &TxPlan) -> Result<u64> {
    let body = encode::body_bytes(&plan.body()?, Scalars::WorstCase)?;
    let witnesses = estimated_witness_set(plan)?;
    let aux = plan.auxiliary_data_bytes()?;
    let size = encode::transaction_bytes(&body, &witnesses, aux.as_deref())?.len() as u64;
    trace!(
        "estimated tx size {} bytes (body {}, witnesses {}, {} inputs)",
        size,
        body.len(),
        witnesses.len(),
        plan.inputs.len()
    );
    Ok(size)
}

fn ceil_div(numerator: i128, denominator: i128) -> i128 {
    (numerator + denominator - 1) / denominator
}

/// Execution cost `Σ mem * priceMem + Σ steps * priceStep`, rounded up once.
pub fn script_fee(params: &ProtocolParameters, ex_units: &[ExUnits]) -> Lovelace {
    let memory: i128 = ex_units.iter().map(|units| i128::from(units.memory)).sum();
    let steps: i128 = ex_units.iter().map(|units| i128::from(units.steps)).sum();
    let mem_num = i128::from(params.price_mem.numerator);
    let mem_den = i128::from(params.price_mem.denominator);
    let step_num = i128::from(params.price_step.numerator);
    let step_den = i128::from(params.price_step.denominator);
    let numerator = memory * mem_num * step_den + steps * step_num * mem_den;
    ceil_div(numerator, mem_den * step_den)
}

/// `minFeeB + size * minFeeA + scriptFee`
pub fn tx_fee_function(size: u64, params: &ProtocolParameters, ex_units: &[ExUnits]) -> Lovelace {
    Lovelace::from(params.min_fee_b)
        + Lovelace::from(size) * Lovelace::from(params.min_fee_a)
        + script_fee(params, ex_units)
}

/// Fee the plan needs given its current shape.
pub fn compute_min_fee(plan: &TxPlan) -> Result<Lovelace> {
    let size = estimate_size(plan)?;
    let ex_units: Vec<ExUnits> = plan.redeemers.iter().map(|r| r.ex_units).collect();
    Ok(tx_fee_function(size, &plan.protocol_parameters, &ex_units))
}

/// Net key deposit: registrations pay it, deregistrations refund it.
pub fn compute_deposit(certificates: &[Certificate], params: &ProtocolParameters) -> Lovelace {
    let key_deposit = Lovelace::from(params.key_deposit);
    certificates
        .iter()
        .map(|certificate| match certificate {
            Certificate::StakeRegistration(_) => key_deposit,
            Certificate::StakeDeregistration(_) => -key_deposit,
            Certificate::StakeDelegation { .. } => 0,
        })
        .sum()
}

/// Fee increase caused by one more collateral input: its body bytes plus a witness.
pub fn collateral_input_penalty(utxo: &Utxo, params: &ProtocolParameters) -> Result<Lovelace> {
    let bytes = input_size(&utxo.input())? as u64 + VKEY_WITNESS_SIZE;
    Ok(Lovelace::from(bytes) * Lovelace::from(params.min_fee_a))
}
