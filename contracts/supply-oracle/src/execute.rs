//! Execute handlers for the supply oracle contract.
//!
//! Reports accumulate per update id until `required_signatures` distinct
//! reporters agree. A reporter that changes its numbers before quorum moves
//! its vote: it is withdrawn from the previous tuple and counted for the new
//! one. Repeating the same report is a no-op.

use cosmwasm_std::{
    Addr, Binary, DepsMut, Env, Event, MessageInfo, Order, Response, StdResult, Storage,
    Timestamp, Uint128,
};

use crate::error::ContractError;
use crate::reconcile::{
    check_report, compute_update_id, quorum_reached, reconcile, Reconciliation,
};
use crate::state::{
    ChainSupply, Config, EmergencyState, PendingUpdate, ReporterVote, CHAIN_EPOCHS,
    CHAIN_SUPPLIES, CONFIG, EMERGENCY, MAX_REASON_LEN, MONITORED_CHAINS, PENDING_UPDATES,
    REPORTERS, REPORTER_VOTES,
};

fn load_config_as_admin(storage: &dyn Storage, sender: &Addr) -> Result<Config, ContractError> {
    let config = CONFIG.load(storage)?;
    if *sender != config.admin {
        return Err(ContractError::Unauthorized);
    }
    Ok(config)
}

fn ensure_reporter(storage: &dyn Storage, sender: &Addr) -> Result<(), ContractError> {
    if !REPORTERS.has(storage, sender) {
        return Err(ContractError::NotReporter {
            address: sender.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn reporter_count(storage: &dyn Storage) -> usize {
    REPORTERS
        .keys(storage, None, None, Order::Ascending)
        .count()
}

// ============================================================================
// Reports
// ============================================================================

pub fn execute_submit_report(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    chain_id: u64,
    total_supply: Uint128,
    locked_supply: Uint128,
    circulating_supply: Uint128,
) -> Result<Response, ContractError> {
    let reporter = info.sender;
    ensure_reporter(deps.storage, &reporter)?;
    if !MONITORED_CHAINS.has(deps.storage, chain_id) {
        return Err(ContractError::invalid(format!(
            "chain {} is not monitored",
            chain_id
        )));
    }
    check_report(total_supply, locked_supply, circulating_supply)?;

    let config = CONFIG.load(deps.storage)?;
    let now = env.block.time;
    let epoch = CHAIN_EPOCHS.may_load(deps.storage, chain_id)?.unwrap_or(0);
    let update_id = compute_update_id(chain_id, total_supply, locked_supply, epoch);
    let update_id_hex = hex::encode(update_id);

    let mut pending = match PENDING_UPDATES.may_load(deps.storage, &update_id)? {
        Some(pending) if !is_expired(pending.first_seen, now, config.reconciliation_period) => {
            pending
        }
        _ => PendingUpdate {
            update_id: Binary::from(update_id.to_vec()),
            chain_id,
            total_supply,
            locked_supply,
            circulating_supply,
            epoch,
            first_seen: now,
            reporters: vec![],
        },
    };

    if let Some(vote) = REPORTER_VOTES.may_load(deps.storage, (&reporter, chain_id))? {
        if vote.epoch == epoch {
            if vote.update_id.as_slice() == update_id.as_slice() {
                if pending.reporters.contains(&reporter) {
                    return Ok(Response::new()
                        .add_attribute("method", "submit_report")
                        .add_attribute("update_id", update_id_hex)
                        .add_attribute("duplicate", "true"));
                }
            } else {
                withdraw_vote(deps.storage, vote.update_id.as_slice(), &reporter)?;
            }
        }
    }
    pending.reporters.push(reporter.clone());

    let response = Response::new()
        .add_attribute("method", "submit_report")
        .add_attribute("reporter", reporter.as_str())
        .add_attribute("chain_id", chain_id.to_string())
        .add_attribute("update_id", &update_id_hex)
        .add_attribute(
            "signatures",
            format!("{}/{}", pending.reporters.len(), config.required_signatures),
        );

    if !quorum_reached(pending.reporters.len(), config.required_signatures) {
        PENDING_UPDATES.save(deps.storage, &update_id, &pending)?;
        REPORTER_VOTES.save(
            deps.storage,
            (&reporter, chain_id),
            &ReporterVote {
                update_id: pending.update_id,
                epoch,
            },
        )?;
        return Ok(response.add_attribute("committed", "false"));
    }

    // Commit
    let snapshot = ChainSupply {
        chain_id,
        total_supply,
        locked_supply,
        circulating_supply,
        epoch,
        updated_at: now,
        reporters: pending.reporters,
    };
    CHAIN_SUPPLIES.save(deps.storage, chain_id, &snapshot)?;
    CHAIN_EPOCHS.save(deps.storage, chain_id, &(epoch + 1))?;
    let pruned = prune_pending(deps.storage, chain_id, epoch)?;

    let event = Event::new("supply_updated")
        .add_attribute("chain_id", chain_id.to_string())
        .add_attribute("total_supply", total_supply)
        .add_attribute("locked_supply", locked_supply)
        .add_attribute("circulating_supply", circulating_supply)
        .add_attribute("epoch", epoch.to_string())
        .add_attribute("update_id", update_id_hex)
        .add_attribute("reporters", snapshot.reporters.len().to_string())
        .add_attribute("pruned_pending", pruned.to_string());

    let response = response
        .add_attribute("committed", "true")
        .add_event(event);
    run_reconciliation(deps.storage, &config, now, response)
}

fn is_expired(first_seen: Timestamp, now: Timestamp, period: u64) -> bool {
    now.seconds().saturating_sub(first_seen.seconds()) > period
}

/// Drop every pending update of `chain_id` up to `epoch`, the winner included.
/// Their ids embed a closed epoch, so no report can reach them again.
fn prune_pending(storage: &mut dyn Storage, chain_id: u64, epoch: u64) -> StdResult<usize> {
    let closed = PENDING_UPDATES
        .range(storage, None, None, Order::Ascending)
        .filter_map(|item| match item {
            Ok((id, pending)) if pending.chain_id == chain_id && pending.epoch <= epoch => {
                Some(Ok(id))
            }
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<StdResult<Vec<_>>>()?;
    for id in &closed {
        PENDING_UPDATES.remove(storage, id);
    }
    Ok(closed.len())
}

/// Remove `reporter` from a pending update, dropping the update once empty.
fn withdraw_vote(
    storage: &mut dyn Storage,
    update_id: &[u8],
    reporter: &Addr,
) -> StdResult<()> {
    if let Some(mut pending) = PENDING_UPDATES.may_load(storage, update_id)? {
        pending.reporters.retain(|r| r != reporter);
        if pending.reporters.is_empty() {
            PENDING_UPDATES.remove(storage, update_id);
        } else {
            PENDING_UPDATES.save(storage, update_id, &pending)?;
        }
    }
    Ok(())
}

/// Reconcile the monitored chains and raise emergency mode on a breach.
fn run_reconciliation(
    storage: &mut dyn Storage,
    config: &Config,
    now: Timestamp,
    response: Response,
) -> Result<Response, ContractError> {
    let emergency = EMERGENCY.may_load(storage)?.unwrap_or_default();
    if emergency.active {
        return Ok(response.add_attribute("reconciliation", "emergency_active"));
    }

    let chains = MONITORED_CHAINS
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<u64>>>()?;
    let snapshots = chains
        .into_iter()
        .map(|chain_id| -> StdResult<_> {
            Ok((chain_id, CHAIN_SUPPLIES.may_load(storage, chain_id)?))
        })
        .collect::<StdResult<Vec<_>>>()?;

    let outcome = reconcile(
        &snapshots,
        config.expected_total_supply,
        config.tolerance_bps,
        now,
        config.reconciliation_period,
    )?;

    match outcome {
        Reconciliation::Skipped { reason } => Ok(response
            .add_attribute("reconciliation", "skipped")
            .add_attribute("reconciliation_note", reason)),
        Reconciliation::WithinTolerance {
            circulating,
            deviation_bps,
        } => Ok(response
            .add_attribute("reconciliation", "ok")
            .add_attribute("global_circulating", circulating)
            .add_attribute("deviation_bps", deviation_bps.to_string())),
        Reconciliation::Breach {
            circulating,
            deviation_bps,
        } => {
            let reason = format!(
                "supply deviation {} bps exceeds tolerance {} bps",
                deviation_bps, config.tolerance_bps
            );
            EMERGENCY.save(
                storage,
                &EmergencyState {
                    active: true,
                    activated_at: Some(now),
                    reason: Some(reason.clone()),
                },
            )?;
            let event = Event::new("emergency_mode_activated")
                .add_attribute("reason", reason)
                .add_attribute("global_circulating", circulating)
                .add_attribute("expected_total_supply", config.expected_total_supply)
                .add_attribute("deviation_bps", deviation_bps.to_string());
            Ok(response
                .add_attribute("reconciliation", "breach")
                .add_event(event))
        }
    }
}

// ============================================================================
// Emergency Mode
// ============================================================================

pub fn execute_trigger_emergency(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    reason: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        ensure_reporter(deps.storage, &info.sender)?;
    }
    if reason.trim().is_empty() || reason.len() > MAX_REASON_LEN {
        return Err(ContractError::invalid(format!(
            "reason must be 1-{} bytes",
            MAX_REASON_LEN
        )));
    }
    if EMERGENCY.may_load(deps.storage)?.unwrap_or_default().active {
        return Err(ContractError::invalid("emergency mode already active"));
    }

    EMERGENCY.save(
        deps.storage,
        &EmergencyState {
            active: true,
            activated_at: Some(env.block.time),
            reason: Some(reason.clone()),
        },
    )?;

    Ok(Response::new()
        .add_event(
            Event::new("emergency_mode_activated")
                .add_attribute("reason", reason)
                .add_attribute("triggered_by", info.sender.as_str()),
        )
        .add_attribute("method", "trigger_emergency"))
}

pub fn execute_clear_emergency_mode(
    deps: DepsMut,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    if !EMERGENCY.may_load(deps.storage)?.unwrap_or_default().active {
        return Err(ContractError::invalid("emergency mode is not active"));
    }
    EMERGENCY.save(deps.storage, &EmergencyState::default())?;

    Ok(Response::new()
        .add_event(
            Event::new("emergency_mode_cleared").add_attribute("cleared_by", info.sender.as_str()),
        )
        .add_attribute("method", "clear_emergency_mode"))
}

// ============================================================================
// Admin
// ============================================================================

pub fn execute_add_reporter(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    let reporter = deps.api.addr_validate(&address)?;
    if REPORTERS.has(deps.storage, &reporter) {
        return Err(ContractError::invalid(format!(
            "{} is already a reporter",
            reporter
        )));
    }
    REPORTERS.save(deps.storage, &reporter, &true)?;

    Ok(Response::new()
        .add_attribute("method", "add_reporter")
        .add_attribute("reporter", reporter))
}

pub fn execute_remove_reporter(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> Result<Response, ContractError> {
    let config = load_config_as_admin(deps.storage, &info.sender)?;

    let reporter = deps.api.addr_validate(&address)?;
    if !REPORTERS.has(deps.storage, &reporter) {
        return Err(ContractError::invalid(format!(
            "{} is not a reporter",
            reporter
        )));
    }
    if reporter_count(deps.storage) - 1 < config.required_signatures as usize {
        return Err(ContractError::invalid(
            "removing this reporter would make quorum unreachable",
        ));
    }
    REPORTERS.remove(deps.storage, &reporter);

    // Votes of a removed reporter no longer count
    let pending_ids = PENDING_UPDATES
        .keys(deps.storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    for update_id in pending_ids {
        withdraw_vote(deps.storage, &update_id, &reporter)?;
    }
    let voted_chains = REPORTER_VOTES
        .prefix(&reporter)
        .keys(deps.storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    for chain_id in voted_chains {
        REPORTER_VOTES.remove(deps.storage, (&reporter, chain_id));
    }

    Ok(Response::new()
        .add_attribute("method", "remove_reporter")
        .add_attribute("reporter", reporter))
}

pub fn execute_set_required_signatures(
    deps: DepsMut,
    info: MessageInfo,
    required_signatures: u32,
) -> Result<Response, ContractError> {
    let mut config = load_config_as_admin(deps.storage, &info.sender)?;

    let reporters = reporter_count(deps.storage);
    if required_signatures == 0 || required_signatures as usize > reporters {
        return Err(ContractError::invalid(format!(
            "required_signatures must be 1-{}",
            reporters
        )));
    }
    config.required_signatures = required_signatures;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "set_required_signatures")
        .add_attribute("required_signatures", required_signatures.to_string()))
}

pub fn execute_set_tolerance(
    deps: DepsMut,
    info: MessageInfo,
    tolerance_bps: u64,
) -> Result<Response, ContractError> {
    let mut config = load_config_as_admin(deps.storage, &info.sender)?;

    if tolerance_bps as u128 > common::BPS_DENOMINATOR {
        return Err(ContractError::invalid(format!(
            "tolerance_bps {} exceeds {}",
            tolerance_bps,
            common::BPS_DENOMINATOR
        )));
    }
    config.tolerance_bps = tolerance_bps;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "set_tolerance")
        .add_attribute("tolerance_bps", tolerance_bps.to_string()))
}

pub fn execute_set_reconciliation_period(
    deps: DepsMut,
    info: MessageInfo,
    seconds: u64,
) -> Result<Response, ContractError> {
    let mut config = load_config_as_admin(deps.storage, &info.sender)?;

    if seconds == 0 {
        return Err(ContractError::invalid("reconciliation period must be positive"));
    }
    config.reconciliation_period = seconds;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "set_reconciliation_period")
        .add_attribute("seconds", seconds.to_string()))
}

pub fn execute_set_expected_total_supply(
    deps: DepsMut,
    info: MessageInfo,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let mut config = load_config_as_admin(deps.storage, &info.sender)?;

    config.expected_total_supply = amount;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "set_expected_total_supply")
        .add_attribute("amount", amount))
}

pub fn execute_add_chain(
    deps: DepsMut,
    info: MessageInfo,
    chain_id: u64,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    if MONITORED_CHAINS.has(deps.storage, chain_id) {
        return Err(ContractError::invalid(format!(
            "chain {} is already monitored",
            chain_id
        )));
    }
    MONITORED_CHAINS.save(deps.storage, chain_id, &true)?;

    Ok(Response::new()
        .add_attribute("method", "add_chain")
        .add_attribute("chain_id", chain_id.to_string()))
}

pub fn execute_remove_chain(
    deps: DepsMut,
    info: MessageInfo,
    chain_id: u64,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    if !MONITORED_CHAINS.has(deps.storage, chain_id) {
        return Err(ContractError::invalid(format!(
            "chain {} is not monitored",
            chain_id
        )));
    }
    MONITORED_CHAINS.remove(deps.storage, chain_id);

    Ok(Response::new()
        .add_attribute("method", "remove_chain")
        .add_attribute("chain_id", chain_id.to_string()))
}
