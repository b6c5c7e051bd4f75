//! Bridge Router Contract - Entry Points
//!
//! The implementation is modularized into:
//! - `execute/` - Execute message handlers
//! - `query` - Query message handlers

use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
};
use cw2::{get_contract_version, set_contract_version};

use crate::error::ContractError;
use crate::execute::{
    execute_accept_admin, execute_bridge, execute_cancel_admin_proposal,
    execute_deliver_transfer, execute_handle_packet, execute_pause, execute_propose_admin,
    execute_refund_timed_out, execute_register_transport, execute_remove_account_discount,
    execute_remove_route, execute_set_account_discount, execute_set_chain_fee_override,
    execute_set_daily_cap, execute_set_fee_config, execute_set_gas_price,
    execute_set_protocol_rate_cap, execute_set_rate_limits, execute_set_route,
    execute_set_supply_oracle, execute_set_transport_active, execute_set_user_tier,
    execute_set_validator_set, execute_set_volume_tiers, execute_unpause, execute_update_limits,
};
use crate::fee_manager::{FeeOverride, TransportFee};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query::{
    query_compute_packet_hash, query_config, query_daily_usage, query_escrow_balance,
    query_estimate_fee, query_is_processed, query_outbound_transfer, query_packet_signers,
    query_pending_admin, query_protocol_usage, query_rate_limits, query_route, query_stats,
    query_status, query_transport, query_transports, query_user_usage, query_validator_set,
};
use crate::rate_limiter::{RateLimitSettings, RATE_LIMIT_SETTINGS};
use crate::state::{
    Config, Stats, CONFIG, CONTRACT_NAME, CONTRACT_VERSION, DEFAULT_MIN_VALIDATORS,
    OUTGOING_NONCE, STATS,
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
    let token = deps.api.addr_validate(&msg.token)?;
    let fee_collector = deps.api.addr_validate(&msg.fee_collector)?;
    let supply_oracle = msg
        .supply_oracle
        .map(|addr| deps.api.addr_validate(&addr))
        .transpose()?;

    if msg.this_chain_id == 0 {
        return Err(ContractError::invalid("this_chain_id 0 is reserved"));
    }
    if msg.fee_denom.is_empty() {
        return Err(ContractError::invalid("fee_denom is empty"));
    }
    if msg.min_bridge_amount > msg.max_bridge_amount {
        return Err(ContractError::invalid(
            "min_bridge_amount exceeds max_bridge_amount",
        ));
    }
    let min_validators = msg.min_validators.unwrap_or(DEFAULT_MIN_VALIDATORS);
    if min_validators == 0 {
        return Err(ContractError::invalid("min_validators must be positive"));
    }

    let config = Config {
        admin,
        paused: false,
        this_chain_id: msg.this_chain_id,
        token,
        fee_denom: msg.fee_denom,
        fee_collector,
        supply_oracle,
        min_bridge_amount: msg.min_bridge_amount,
        max_bridge_amount: msg.max_bridge_amount,
        min_validators,
    };
    CONFIG.save(deps.storage, &config)?;

    STATS.save(deps.storage, &Stats::default())?;
    OUTGOING_NONCE.save(deps.storage, &0u64)?;
    RATE_LIMIT_SETTINGS.save(deps.storage, &RateLimitSettings::default())?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("admin", config.admin)
        .add_attribute("this_chain_id", config.this_chain_id.to_string())
        .add_attribute("token", config.token))
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
        // Transfers
        ExecuteMsg::Bridge {
            transport_id,
            dest_chain,
            recipient,
            amount,
            extra_data,
        } => execute_bridge(
            deps,
            env,
            info,
            transport_id,
            dest_chain,
            recipient,
            amount,
            extra_data,
        ),
        ExecuteMsg::DeliverTransfer {
            transport_id,
            source_chain,
            sender_proof,
            recipient,
            amount,
            transfer_id,
        } => execute_deliver_transfer(
            deps,
            env,
            info,
            transport_id,
            source_chain,
            sender_proof,
            recipient,
            amount,
            transfer_id,
        ),
        ExecuteMsg::HandlePacket {
            transport_id,
            packet,
            signatures,
        } => execute_handle_packet(deps, env, info, transport_id, packet, signatures),
        ExecuteMsg::RefundTimedOut {
            transfer_id,
            signatures,
        } => execute_refund_timed_out(deps, env, info, transfer_id, signatures),

        // Transport registry
        ExecuteMsg::RegisterTransport {
            transport_id,
            kind,
            relayer,
            packet_timeout_seconds,
        } => execute_register_transport(
            deps,
            info,
            transport_id,
            kind,
            relayer,
            packet_timeout_seconds,
        ),
        ExecuteMsg::SetTransportActive {
            transport_id,
            active,
        } => execute_set_transport_active(deps, info, transport_id, active),
        ExecuteMsg::SetRoute {
            transport_id,
            chain_id,
            trusted_sender,
            enabled,
        } => execute_set_route(deps, info, transport_id, chain_id, trusted_sender, enabled),
        ExecuteMsg::RemoveRoute {
            transport_id,
            chain_id,
        } => execute_remove_route(deps, info, transport_id, chain_id),

        // Fees
        ExecuteMsg::SetFeeConfig {
            transport_id,
            base_fee,
            percentage_fee_bps,
            gas_estimate,
        } => execute_set_fee_config(
            deps,
            info,
            transport_id,
            TransportFee {
                base_fee,
                percentage_fee_bps,
                gas_estimate,
            },
        ),
        ExecuteMsg::SetChainFeeOverride {
            transport_id,
            chain_id,
            base_fee,
            gas_estimate,
        } => execute_set_chain_fee_override(
            deps,
            info,
            transport_id,
            chain_id,
            FeeOverride {
                base_fee,
                gas_estimate,
            },
        ),
        ExecuteMsg::SetGasPrice {
            chain_id,
            gas_price,
        } => execute_set_gas_price(deps, info, chain_id, gas_price),
        ExecuteMsg::SetAccountDiscount {
            account,
            discount_bps,
        } => execute_set_account_discount(deps, info, account, discount_bps),
        ExecuteMsg::RemoveAccountDiscount { account } => {
            execute_remove_account_discount(deps, info, account)
        }
        ExecuteMsg::SetVolumeTiers { tiers } => execute_set_volume_tiers(deps, info, tiers),

        // Rate limits & security
        ExecuteMsg::SetRateLimits {
            window_seconds,
            user_cap,
            protocol_cap,
            elevated_multiplier,
        } => execute_set_rate_limits(
            deps,
            info,
            RateLimitSettings {
                window_seconds,
                user_cap,
                protocol_cap,
                elevated_multiplier,
            },
        ),
        ExecuteMsg::SetProtocolRateCap { transport_id, cap } => {
            execute_set_protocol_rate_cap(deps, info, transport_id, cap)
        }
        ExecuteMsg::SetUserTier { account, tier } => {
            execute_set_user_tier(deps, info, account, tier)
        }
        ExecuteMsg::SetDailyCap { cap } => execute_set_daily_cap(deps, info, cap),
        ExecuteMsg::SetValidatorSet {
            transport_id,
            validators,
            threshold,
        } => execute_set_validator_set(deps, info, transport_id, validators, threshold),
        ExecuteMsg::SetSupplyOracle { oracle } => execute_set_supply_oracle(deps, info, oracle),
        ExecuteMsg::UpdateLimits {
            min_bridge_amount,
            max_bridge_amount,
        } => execute_update_limits(deps, info, min_bridge_amount, max_bridge_amount),
        ExecuteMsg::Pause {} => execute_pause(deps, info),
        ExecuteMsg::Unpause {} => execute_unpause(deps, info),

        // Admin handover
        ExecuteMsg::ProposeAdmin { new_admin } => {
            execute_propose_admin(deps, env, info, new_admin)
        }
        ExecuteMsg::AcceptAdmin {} => execute_accept_admin(deps, env, info),
        ExecuteMsg::CancelAdminProposal {} => execute_cancel_admin_proposal(deps, info),
    }
}

// ============================================================================
// Query
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::Status {} => to_json_binary(&query_status(deps)?),
        QueryMsg::Stats {} => to_json_binary(&query_stats(deps)?),
        QueryMsg::Transport { transport_id } => {
            to_json_binary(&query_transport(deps, transport_id)?)
        }
        QueryMsg::Transports { start_after, limit } => {
            to_json_binary(&query_transports(deps, start_after, limit)?)
        }
        QueryMsg::Route {
            transport_id,
            chain_id,
        } => to_json_binary(&query_route(deps, transport_id, chain_id)?),
        QueryMsg::EstimateFee {
            transport_id,
            dest_chain,
            amount,
            payer,
        } => to_json_binary(&query_estimate_fee(
            deps,
            transport_id,
            dest_chain,
            amount,
            payer,
        )?),
        QueryMsg::RateLimits {} => to_json_binary(&query_rate_limits(deps)?),
        QueryMsg::UserUsage { account } => to_json_binary(&query_user_usage(deps, env, account)?),
        QueryMsg::ProtocolUsage { transport_id } => {
            to_json_binary(&query_protocol_usage(deps, env, transport_id)?)
        }
        QueryMsg::DailyUsage {} => to_json_binary(&query_daily_usage(deps, env)?),
        QueryMsg::OutboundTransfer { transfer_id } => {
            to_json_binary(&query_outbound_transfer(deps, transfer_id)?)
        }
        QueryMsg::IsProcessed {
            transport_id,
            source_chain,
            transfer_id,
        } => to_json_binary(&query_is_processed(
            deps,
            transport_id,
            source_chain,
            transfer_id,
        )?),
        QueryMsg::EscrowBalance { transport_id } => {
            to_json_binary(&query_escrow_balance(deps, transport_id)?)
        }
        QueryMsg::ValidatorSet { transport_id } => {
            to_json_binary(&query_validator_set(deps, transport_id)?)
        }
        QueryMsg::PacketSigners { packet_hash } => {
            to_json_binary(&query_packet_signers(deps, packet_hash)?)
        }
        QueryMsg::ComputePacketHash { packet } => {
            to_json_binary(&query_compute_packet_hash(packet)?)
        }
        QueryMsg::PendingAdmin {} => to_json_binary(&query_pending_admin(deps)?),
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
