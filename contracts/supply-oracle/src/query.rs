//! Query handlers for the supply oracle contract.

use cosmwasm_std::{Binary, Deps, Order, StdResult, Uint128};

use common::deviation_bps;

use crate::msg::{
    ChainSuppliesResponse, ConfigResponse, EmergencyStatusResponse, GlobalSupplyResponse,
    ReportersResponse,
};
use crate::state::{
    ChainSupply, PendingUpdate, CHAIN_SUPPLIES, CONFIG, EMERGENCY, MONITORED_CHAINS,
    PENDING_UPDATES, REPORTERS,
};

fn monitored_chains(deps: Deps) -> StdResult<Vec<u64>> {
    MONITORED_CHAINS
        .keys(deps.storage, None, None, Order::Ascending)
        .collect()
}

pub fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        admin: config.admin,
        required_signatures: config.required_signatures,
        tolerance_bps: config.tolerance_bps,
        reconciliation_period: config.reconciliation_period,
        expected_total_supply: config.expected_total_supply,
        chains: monitored_chains(deps)?,
    })
}

pub fn query_emergency_status(deps: Deps) -> StdResult<EmergencyStatusResponse> {
    let state = EMERGENCY.may_load(deps.storage)?.unwrap_or_default();
    Ok(EmergencyStatusResponse {
        emergency_mode: state.active,
        activated_at: state.activated_at,
        reason: state.reason,
    })
}

pub fn query_chain_supply(deps: Deps, chain_id: u64) -> StdResult<Option<ChainSupply>> {
    CHAIN_SUPPLIES.may_load(deps.storage, chain_id)
}

pub fn query_chain_supplies(deps: Deps) -> StdResult<ChainSuppliesResponse> {
    let supplies = CHAIN_SUPPLIES
        .range(deps.storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, supply)| supply))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(ChainSuppliesResponse { supplies })
}

pub fn query_pending_update(deps: Deps, update_id: Binary) -> StdResult<Option<PendingUpdate>> {
    PENDING_UPDATES.may_load(deps.storage, update_id.as_slice())
}

pub fn query_reporters(deps: Deps) -> StdResult<ReportersResponse> {
    let reporters = REPORTERS
        .keys(deps.storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    Ok(ReportersResponse { reporters })
}

pub fn query_global_supply(deps: Deps) -> StdResult<GlobalSupplyResponse> {
    let config = CONFIG.load(deps.storage)?;
    let chains = monitored_chains(deps)?;

    let mut circulating_supply = Uint128::zero();
    let mut chains_reported = 0u32;
    for chain_id in &chains {
        if let Some(supply) = CHAIN_SUPPLIES.may_load(deps.storage, *chain_id)? {
            circulating_supply = circulating_supply.checked_add(supply.circulating_supply)?;
            chains_reported += 1;
        }
    }

    Ok(GlobalSupplyResponse {
        circulating_supply,
        expected_total_supply: config.expected_total_supply,
        deviation_bps: deviation_bps(circulating_supply, config.expected_total_supply)
            .map(|d| u64::try_from(d).unwrap_or(u64::MAX)),
        chains_reported,
        chains_monitored: chains.len() as u32,
    })
}
