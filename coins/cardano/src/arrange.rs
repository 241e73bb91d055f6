//! Ordering and classification of the spendable UTxO pool.

use std::collections::BTreeSet;

use log::debug;

use crate::config::PlannerConfig;
use crate::plan::PlanRequest;
use crate::token::AssetId;
use crate::types::{TxInput, Utxo};

/// Spendable UTxOs in the order the greedy solver tries them, and the UTxOs set aside as
/// collateral candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrangedUtxos {
    pub spendable: Vec<Utxo>,
    pub collateral_candidates: Vec<Utxo>,
}

/// Canonical order: transaction hash bytes, then output index.
pub fn sort_utxos(utxos: &mut [Utxo]) {
    utxos.sort_by_key(Utxo::input);
}

/// Assets the request pays out or burns.
fn needed_assets(request: &PlanRequest) -> BTreeSet<AssetId> {
    let mut assets: BTreeSet<AssetId> = request
        .outputs
        .iter()
        .flat_map(|output| output.token_bundle.assets().cloned())
        .collect();
    for entry in request.mint.iter().filter(|entry| entry.quantity < 0) {
        assets.insert(AssetId::new(entry.policy_id, entry.asset_name.clone()));
    }
    assets
}

fn rank(utxo: &Utxo, needed: &BTreeSet<AssetId>) -> u8 {
    if utxo.is_script_utxo() {
        4
    } else if utxo.is_ada_only() {
        if utxo.address.has_staking_part() {
            1
        } else {
            0
        }
    } else if utxo.token_bundle.assets().any(|asset| needed.contains(asset)) {
        2
    } else {
        3
    }
}

fn is_collateral_eligible(utxo: &Utxo, config: &PlannerConfig) -> bool {
    utxo.is_ada_only()
        && !utxo.is_script_utxo()
        && !utxo.address.is_byron()
        && utxo.coins >= config.min_collateral_lovelace
        && utxo.coins <= config.max_collateral_lovelace
}

/// Splits `utxos` into spendable inputs and collateral candidates.
///
/// Required inputs and staged collateral are never offered again. When the request needs
/// collateral and the caller supplied no candidates, ADA-only UTxOs inside the collateral
/// band are reserved, smallest first, up to the configured count.
pub fn arrange(utxos: &[Utxo], request: &PlanRequest, config: &PlannerConfig) -> ArrangedUtxos {
    let excluded: BTreeSet<TxInput> = request
        .required_inputs
        .iter()
        .chain(request.collateral_inputs.iter())
        .map(Utxo::input)
        .collect();

    let mut pool: Vec<Utxo> = utxos
        .iter()
        .filter(|utxo| !excluded.contains(&utxo.input()))
        .cloned()
        .collect();
    sort_utxos(&mut pool);

    let collateral_candidates = match &request.potential_collaterals {
        Some(candidates) => candidates
            .iter()
            .filter(|utxo| !excluded.contains(&utxo.input()))
            .cloned()
            .collect(),
        None if request.requires_collateral() => {
            let mut eligible: Vec<Utxo> = pool
                .iter()
                .filter(|utxo| is_collateral_eligible(utxo, config))
                .cloned()
                .collect();
            eligible.sort_by_key(|utxo| utxo.coins);
            eligible.truncate(config.max_reserved_collaterals);
            eligible
        }
        None => Vec::new(),
    };

    let reserved: BTreeSet<TxInput> = collateral_candidates.iter().map(Utxo::input).collect();
    pool.retain(|utxo| !reserved.contains(&utxo.input()));

    let needed = needed_assets(request);
    pool.sort_by_key(|utxo| rank(utxo, &needed));

    debug!(
        "arranged {} spendable utxos, {} collateral candidates",
        pool.len(),
        collateral_candidates.len()
    );
    ArrangedUtxos {
        spendable: pool,
        collateral_candidates,
    }
}
