//! Supply Oracle Contract - Entry Points

use std::collections::BTreeSet;

use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
};
use cw2::{get_contract_version, set_contract_version};

use crate::error::ContractError;
use crate::execute::{
    execute_add_chain, execute_add_reporter, execute_clear_emergency_mode,
    execute_remove_chain, execute_remove_reporter, execute_set_expected_total_supply,
    execute_set_reconciliation_period, execute_set_required_signatures, execute_set_tolerance,
    execute_submit_report, execute_trigger_emergency,
};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query::{
    query_chain_supplies, query_chain_supply, query_config, query_emergency_status,
    query_global_supply, query_pending_update, query_reporters,
};
use crate::reconcile::default_required_signatures;
use crate::state::{
    Config, EmergencyState, CONFIG, CONTRACT_NAME, CONTRACT_VERSION,
    DEFAULT_RECONCILIATION_PERIOD, DEFAULT_TOLERANCE_BPS, EMERGENCY, MONITORED_CHAINS, REPORTERS,
};

// ============================================================================
// Instantiate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let admin = deps.api.addr_validate(&msg.admin)?;

    if msg.reporters.is_empty() {
        return Err(ContractError::invalid("at least one reporter is required"));
    }
    let mut reporters = BTreeSet::new();
    for reporter in &msg.reporters {
        let addr = deps.api.addr_validate(reporter)?;
        if !reporters.insert(addr) {
            return Err(ContractError::invalid(format!(
                "duplicate reporter {}",
                reporter
            )));
        }
    }

    let required_signatures = msg
        .required_signatures
        .unwrap_or_else(|| default_required_signatures(reporters.len()));
    if required_signatures == 0 || required_signatures as usize > reporters.len() {
        return Err(ContractError::invalid(format!(
            "required_signatures must be 1-{}",
            reporters.len()
        )));
    }

    let tolerance_bps = msg.tolerance_bps.unwrap_or(DEFAULT_TOLERANCE_BPS);
    if tolerance_bps as u128 > common::BPS_DENOMINATOR {
        return Err(ContractError::invalid(format!(
            "tolerance {} bps exceeds 10000",
            tolerance_bps
        )));
    }

    let reconciliation_period = msg
        .reconciliation_period
        .unwrap_or(DEFAULT_RECONCILIATION_PERIOD);
    if reconciliation_period == 0 {
        return Err(ContractError::invalid(
            "reconciliation period must be positive",
        ));
    }

    let config = Config {
        admin,
        required_signatures,
        tolerance_bps,
        reconciliation_period,
        expected_total_supply: msg.expected_total_supply,
    };
    CONFIG.save(deps.storage, &config)?;

    for reporter in &reporters {
        REPORTERS.save(deps.storage, reporter, &true)?;
    }
    for chain_id in &msg.chains {
        MONITORED_CHAINS.save(deps.storage, *chain_id, &true)?;
    }
    EMERGENCY.save(deps.storage, &EmergencyState::default())?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("admin", config.admin)
        .add_attribute("reporters", reporters.len().to_string())
        .add_attribute("required_signatures", required_signatures.to_string()))
}

// ============================================================================
// Execute
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::SubmitReport {
            chain_id,
            total_supply,
            locked_supply,
            circulating_supply,
        } => execute_submit_report(
            deps,
            env,
            info,
            chain_id,
            total_supply,
            locked_supply,
            circulating_supply,
        ),
        ExecuteMsg::TriggerEmergency { reason } => {
            execute_trigger_emergency(deps, env, info, reason)
        }
        ExecuteMsg::ClearEmergencyMode {} => execute_clear_emergency_mode(deps, info),

        // Admin
        ExecuteMsg::AddReporter { address } => execute_add_reporter(deps, info, address),
        ExecuteMsg::RemoveReporter { address } => execute_remove_reporter(deps, info, address),
        ExecuteMsg::SetRequiredSignatures {
            required_signatures,
        } => execute_set_required_signatures(deps, info, required_signatures),
        ExecuteMsg::SetTolerance { tolerance_bps } => {
            execute_set_tolerance(deps, info, tolerance_bps)
        }
        ExecuteMsg::SetReconciliationPeriod { seconds } => {
            execute_set_reconciliation_period(deps, info, seconds)
        }
        ExecuteMsg::SetExpectedTotalSupply { amount } => {
            execute_set_expected_total_supply(deps, info, amount)
        }
        ExecuteMsg::AddChain { chain_id } => execute_add_chain(deps, info, chain_id),
        ExecuteMsg::RemoveChain { chain_id } => execute_remove_chain(deps, info, chain_id),
    }
}

// ============================================================================
// Query
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::EmergencyStatus {} => to_json_binary(&query_emergency_status(deps)?),
        QueryMsg::ChainSupply { chain_id } => to_json_binary(&query_chain_supply(deps, chain_id)?),
        QueryMsg::ChainSupplies {} => to_json_binary(&query_chain_supplies(deps)?),
        QueryMsg::PendingUpdate { update_id } => {
            to_json_binary(&query_pending_update(deps, update_id)?)
        }
        QueryMsg::Reporters {} => to_json_binary(&query_reporters(deps)?),
        QueryMsg::GlobalSupply {} => to_json_binary(&query_global_supply(deps)?),
    }
}

// ============================================================================
// Migrate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::invalid(format!(
            "cannot migrate from {}",
            stored.contract
        )));
    }
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("method", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
