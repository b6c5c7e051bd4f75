//! Pause switch and timelocked admin handover.

use cosmwasm_std::{DepsMut, Env, Event, MessageInfo, Response};

use super::load_config_as_admin;
use crate::error::ContractError;
use crate::state::{PendingAdmin, ADMIN_TIMELOCK_DURATION, CONFIG, PENDING_ADMIN};

// ============================================================================
// Pause Switch
// ============================================================================

/// Halts transfers, deliveries and refunds on every transport.
pub fn execute_pause(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    set_paused(deps, info, true)
}

pub fn execute_unpause(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    set_paused(deps, info, false)
}

fn set_paused(deps: DepsMut, info: MessageInfo, paused: bool) -> Result<Response, ContractError> {
    let mut config = load_config_as_admin(deps.storage, &info.sender)?;
    let was_paused = config.paused;
    config.paused = paused;
    CONFIG.save(deps.storage, &config)?;

    let method = if paused { "pause" } else { "unpause" };
    let mut response = Response::new().add_attribute("method", method);
    if was_paused != paused {
        response = response.add_event(
            Event::new("bridge_pause_changed")
                .add_attribute("paused", paused.to_string())
                .add_attribute("by", info.sender.as_str()),
        );
    }
    Ok(response)
}

// ============================================================================
// Admin Handover
// ============================================================================

/// Nominate a successor; it may accept once `ADMIN_TIMELOCK_DURATION` has
/// passed. A new proposal replaces the previous one.
pub fn execute_propose_admin(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    new_admin: String,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    let proposal = PendingAdmin {
        new_address: deps.api.addr_validate(&new_admin)?,
        execute_after: env.block.time.plus_seconds(ADMIN_TIMELOCK_DURATION),
    };
    PENDING_ADMIN.save(deps.storage, &proposal)?;

    Ok(Response::new()
        .add_attribute("method", "propose_admin")
        .add_attribute("new_admin", proposal.new_address)
        .add_attribute("execute_after", proposal.execute_after.seconds().to_string()))
}

pub fn execute_accept_admin(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let Some(proposal) = PENDING_ADMIN.may_load(deps.storage)? else {
        return Err(ContractError::NoPendingAdmin);
    };
    if info.sender != proposal.new_address {
        return Err(ContractError::UnauthorizedPendingAdmin);
    }

    let now = env.block.time.seconds();
    let ready_at = proposal.execute_after.seconds();
    if now < ready_at {
        return Err(ContractError::TimelockNotExpired {
            remaining_seconds: ready_at - now,
        });
    }

    CONFIG.update(deps.storage, |mut config| -> Result<_, ContractError> {
        config.admin = proposal.new_address.clone();
        Ok(config)
    })?;
    PENDING_ADMIN.remove(deps.storage);

    Ok(Response::new()
        .add_attribute("method", "accept_admin")
        .add_attribute("new_admin", proposal.new_address))
}

pub fn execute_cancel_admin_proposal(
    deps: DepsMut,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    let Some(proposal) = PENDING_ADMIN.may_load(deps.storage)? else {
        return Err(ContractError::NoPendingAdmin);
    };
    PENDING_ADMIN.remove(deps.storage);

    Ok(Response::new()
        .add_attribute("method", "cancel_admin_proposal")
        .add_attribute("cancelled", proposal.new_address))
}
