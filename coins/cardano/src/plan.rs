//! Spending requests, normalized drafts and solved plans.

use std::collections::BTreeSet;

use crate::address::{Address, KeyHash};
use crate::cbor::encode::{self, Scalars, TxBody, WitnessSet};
use crate::cbor::PlutusData;
use crate::error::{CardanoError, Result, TxPlanFailure};
use crate::protocol_params::ProtocolParameters;
use crate::script_integrity::hash_script_integrity;
use crate::token::{PolicyId, TokenBundle};
use crate::types::{
    AuxiliaryData, Certificate, ExUnits, Language, Lovelace, MintEntry, Redeemer, RedeemerTarget,
    ResolvedRedeemer, Script, TxInput, TxOutput, Utxo, Withdrawal,
};

pub type TxPlanResult = std::result::Result<TxPlan, TxPlanFailure>;

/// Everything the caller wants the transaction to do.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub outputs: Vec<TxOutput>,
    pub change_address: Address,
    pub certificates: Vec<Certificate>,
    pub withdrawals: Vec<Withdrawal>,
    pub mint: Vec<MintEntry>,
    /// Datums placed in the witness set.
    pub datums: Vec<PlutusData>,
    pub scripts: Vec<Script>,
    pub redeemers: Vec<Redeemer>,
    pub required_signers: Vec<KeyHash>,
    /// Inputs that must be spent, such as script UTxOs targeted by spend redeemers.
    pub required_inputs: Vec<Utxo>,
    /// Collateral already chosen by the caller.
    pub collateral_inputs: Vec<Utxo>,
    /// Candidates to pick collateral from. `None` lets the arranger reserve them.
    pub potential_collaterals: Option<Vec<Utxo>>,
    pub metadata: Option<AuxiliaryData>,
    pub ttl: Option<u64>,
    pub validity_interval_start: Option<u64>,
    pub network_id: Option<u8>,
    pub protocol_parameters: ProtocolParameters,
}

impl PlanRequest {
    pub fn new(change_address: Address, protocol_parameters: ProtocolParameters) -> Self {
        Self {
            outputs: Vec::new(),
            change_address,
            certificates: Vec::new(),
            withdrawals: Vec::new(),
            mint: Vec::new(),
            datums: Vec::new(),
            scripts: Vec::new(),
            redeemers: Vec::new(),
            required_signers: Vec::new(),
            required_inputs: Vec::new(),
            collateral_inputs: Vec::new(),
            potential_collaterals: None,
            metadata: None,
            ttl: None,
            validity_interval_start: None,
            network_id: None,
            protocol_parameters,
        }
    }

    pub fn with_output(mut self, output: TxOutput) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn with_certificate(mut self, certificate: Certificate) -> Self {
        self.certificates.push(certificate);
        self
    }

    pub fn with_withdrawal(mut self, withdrawal: Withdrawal) -> Self {
        self.withdrawals.push(withdrawal);
        self
    }

    pub fn with_mint(mut self, entry: MintEntry) -> Self {
        self.mint.push(entry);
        self
    }

    pub fn with_datum(mut self, datum: PlutusData) -> Self {
        self.datums.push(datum);
        self
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.scripts.push(script);
        self
    }

    pub fn with_redeemer(mut self, redeemer: Redeemer) -> Self {
        self.redeemers.push(redeemer);
        self
    }

    pub fn with_required_signer(mut self, key_hash: KeyHash) -> Self {
        self.required_signers.push(key_hash);
        self
    }

    pub fn with_required_input(mut self, utxo: Utxo) -> Self {
        self.required_inputs.push(utxo);
        self
    }

    pub fn with_collateral_input(mut self, utxo: Utxo) -> Self {
        self.collateral_inputs.push(utxo);
        self
    }

    pub fn with_potential_collaterals(mut self, candidates: Vec<Utxo>) -> Self {
        self.potential_collaterals = Some(candidates);
        self
    }

    pub fn with_metadata(mut self, metadata: AuxiliaryData) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_validity_interval_start(mut self, slot: u64) -> Self {
        self.validity_interval_start = Some(slot);
        self
    }

    pub fn with_network_id(mut self, network_id: u8) -> Self {
        self.network_id = Some(network_id);
        self
    }

    /// Plutus scripts or redeemers make the transaction phase-2 validated, which needs
    /// collateral.
    pub fn requires_collateral(&self) -> bool {
        !self.redeemers.is_empty() || self.scripts.iter().any(Script::is_plutus)
    }
}

/// Normalized request: outputs at their minimum, mint aggregated, witnesses deduplicated.
#[derive(Debug, Clone)]
pub struct TxPlanDraft {
    pub outputs: Vec<TxOutput>,
    pub change_address: Address,
    pub certificates: Vec<Certificate>,
    pub withdrawals: Vec<Withdrawal>,
    pub mint: TokenBundle,
    pub datums: Vec<PlutusData>,
    pub scripts: Vec<Script>,
    /// Redeemers whose index is only known once the input order is fixed.
    pub redeemers: Vec<Redeemer>,
    pub required_signers: Vec<KeyHash>,
    pub required_inputs: Vec<Utxo>,
    pub collateral_inputs: Vec<Utxo>,
    pub metadata: Option<AuxiliaryData>,
    pub ttl: Option<u64>,
    pub validity_interval_start: Option<u64>,
    pub network_id: Option<u8>,
    pub protocol_parameters: ProtocolParameters,
    /// Lovelace added to explicit outputs to reach their minimum.
    pub additional_lovelace: Lovelace,
    /// Net key deposit (refunds negative).
    pub deposit: Lovelace,
    /// Sum of withdrawn rewards.
    pub rewards: Lovelace,
}

impl TxPlanDraft {
    pub fn requires_collateral(&self) -> bool {
        !self.redeemers.is_empty() || self.scripts.iter().any(Script::is_plutus)
    }
}

/// A balanced transaction ready for signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPlan {
    /// Sorted by `(tx_hash, output_index)`, the order used on the wire.
    pub inputs: Vec<Utxo>,
    pub collateral_inputs: Vec<Utxo>,
    pub outputs: Vec<TxOutput>,
    pub change: Vec<TxOutput>,
    pub fee: Lovelace,
    /// Fee derived from the size estimate alone. Lower than `fee` when leftover ADA was
    /// folded into the fee.
    pub base_fee: Lovelace,
    pub deposit: Lovelace,
    pub rewards: Lovelace,
    pub additional_lovelace: Lovelace,
    pub certificates: Vec<Certificate>,
    pub withdrawals: Vec<Withdrawal>,
    pub mint: TokenBundle,
    pub datums: Vec<PlutusData>,
    pub scripts: Vec<Script>,
    pub redeemers: Vec<ResolvedRedeemer>,
    pub required_signers: Vec<KeyHash>,
    pub metadata: Option<AuxiliaryData>,
    pub ttl: Option<u64>,
    pub validity_interval_start: Option<u64>,
    pub network_id: Option<u8>,
    pub script_data_hash: Option<[u8; 32]>,
    pub protocol_parameters: ProtocolParameters,
}

impl TxPlan {
    /// Fixes the input order, resolves redeemer pointers and the script data hash.
    /// Fee and change are filled in by the solver.
    pub fn assemble(
        draft: &TxPlanDraft,
        inputs: Vec<Utxo>,
        collateral_inputs: Vec<Utxo>,
        change: Vec<TxOutput>,
    ) -> Result<Self> {
        let mut inputs = inputs;
        inputs.sort_by_key(Utxo::input);
        let mut collateral_inputs = collateral_inputs;
        collateral_inputs.sort_by_key(Utxo::input);

        let redeemers = resolve_redeemers(draft, &inputs)?;
        let languages = used_languages(&draft.scripts);
        let script_data_hash = hash_script_integrity(
            &redeemers,
            &draft.datums,
            &draft.protocol_parameters.cost_models,
            &languages,
        )?;

        Ok(Self {
            inputs,
            collateral_inputs,
            outputs: draft.outputs.clone(),
            change,
            fee: 0,
            base_fee: 0,
            deposit: draft.deposit,
            rewards: draft.rewards,
            additional_lovelace: draft.additional_lovelace,
            certificates: draft.certificates.clone(),
            withdrawals: draft.withdrawals.clone(),
            mint: draft.mint.clone(),
            datums: draft.datums.clone(),
            scripts: draft.scripts.clone(),
            redeemers,
            required_signers: draft.required_signers.clone(),
            metadata: draft.metadata.clone(),
            ttl: draft.ttl,
            validity_interval_start: draft.validity_interval_start,
            network_id: draft.network_id,
            script_data_hash,
            protocol_parameters: draft.protocol_parameters.clone(),
        })
    }

    /// Explicit outputs followed by change outputs.
    pub fn all_outputs(&self) -> impl Iterator<Item = &TxOutput> {
        self.outputs.iter().chain(self.change.iter())
    }

    pub fn input_refs(&self) -> Vec<TxInput> {
        self.inputs.iter().map(Utxo::input).collect()
    }

    pub fn body(&self) -> Result<TxBody<'_>> {
        let auxiliary_data_hash = match &self.metadata {
            Some(aux) => Some(aux.hash()?),
            None => None,
        };
        Ok(TxBody {
            inputs: self.input_refs(),
            outputs: self.all_outputs().collect(),
            fee: self.fee,
            ttl: self.ttl,
            certificates: &self.certificates,
            withdrawals: &self.withdrawals,
            auxiliary_data_hash,
            validity_interval_start: self.validity_interval_start,
            mint: &self.mint,
            script_data_hash: self.script_data_hash,
            collateral_inputs: self.collateral_inputs.iter().map(Utxo::input).collect(),
            required_signers: &self.required_signers,
            network_id: self.network_id,
        })
    }

    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        encode::body_bytes(&self.body()?, Scalars::Exact)
    }

    pub fn tx_id(&self) -> Result<[u8; 32]> {
        encode::tx_id(&self.body()?)
    }

    /// Script, datum and redeemer witnesses, without signatures.
    pub fn witness_skeleton(&self) -> WitnessSet<'_> {
        WitnessSet::with_scripts(&self.scripts, &self.datums, &self.redeemers)
    }

    pub fn auxiliary_data_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.metadata.as_ref().map(AuxiliaryData::to_bytes).transpose()
    }

    /// The transaction without signatures, as handed to a script evaluator.
    pub fn unsigned_tx_bytes(&self) -> Result<Vec<u8>> {
        let body = self.body_bytes()?;
        let witnesses = encode::witness_set_bytes(&self.witness_skeleton())?;
        let aux = self.auxiliary_data_bytes()?;
        encode::transaction_bytes(&body, &witnesses, aux.as_deref())
    }

    pub fn languages(&self) -> BTreeSet<Language> {
        used_languages(&self.scripts)
    }

    pub fn total_ex_units(&self) -> ExUnits {
        self.redeemers
            .iter()
            .fold(ExUnits::ZERO, |total, redeemer| total.saturating_add(redeemer.ex_units))
    }

    pub fn requires_collateral(&self) -> bool {
        !self.redeemers.is_empty() || self.scripts.iter().any(Script::is_plutus)
    }

    /// Checks `inputs + mint + rewards = outputs + change + fee + deposit` for ADA and every
    /// asset.
    pub fn is_balanced(&self) -> bool {
        let input_coins: Lovelace = self.inputs.iter().map(|utxo| utxo.coins).sum();
        let output_coins: Lovelace = self.all_outputs().map(|output| output.coins).sum();
        if input_coins + self.rewards != output_coins + self.fee + self.deposit {
            return false;
        }
        let produced = TokenBundle::aggregate(self.all_outputs().map(|o| &o.token_bundle));
        let mut consumed = TokenBundle::aggregate(self.inputs.iter().map(|u| &u.token_bundle));
        consumed.merge(&self.mint);
        consumed == produced
    }
}

fn used_languages(scripts: &[Script]) -> BTreeSet<Language> {
    scripts.iter().filter_map(Script::language).collect()
}

fn resolve_redeemers(draft: &TxPlanDraft, inputs: &[Utxo]) -> Result<Vec<ResolvedRedeemer>> {
    let policies: Vec<&PolicyId> = draft.mint.by_policy().into_keys().collect();
    let mut reward_addresses: Vec<&Address> =
        draft.withdrawals.iter().map(|w| &w.reward_address).collect();
    reward_addresses.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));

    draft
        .redeemers
        .iter()
        .map(|redeemer| {
            let index = match &redeemer.target {
                RedeemerTarget::Spend(input) => {
                    inputs.iter().position(|utxo| utxo.input() == *input)
                }
                RedeemerTarget::Mint(policy_id) => {
                    policies.iter().position(|policy| *policy == policy_id)
                }
                RedeemerTarget::Cert(index) => {
                    (*index < draft.certificates.len()).then_some(*index)
                }
                RedeemerTarget::Reward(address) => {
                    reward_addresses.iter().position(|reward| *reward == address)
                }
            };
            let index = index.ok_or_else(|| {
                CardanoError::UnresolvedRedeemer(format!("{:?}", redeemer.target))
            })?;
            Ok(ResolvedRedeemer {
                tag: redeemer.target.tag(),
                index: index as u32,
                data: redeemer.data.clone(),
                ex_units: redeemer.ex_units,
            })
        })
        .collect()
}
