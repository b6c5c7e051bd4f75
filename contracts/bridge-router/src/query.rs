//! Query handlers for the bridge router contract.

use cosmwasm_std::{Binary, Deps, Env, Order, StdError, StdResult, Uint128};
use cw_storage_plus::Bound;

use crate::fee_manager::{self, FeeQuote, TRANSPORT_FEES};
use crate::hash::compute_packet_hash;
use crate::msg::{
    ComputeHashResponse, ConfigResponse, DailyUsageResponse, EscrowBalanceResponse,
    IsProcessedResponse, Packet, PacketSignersResponse, PendingAdminResponse,
    RateLimitsResponse, RouteResponse, StatsResponse, StatusResponse, TransportResponse,
    TransportsResponse, UsageResponse,
};
use crate::rate_limiter::{self, RateWindow, USER_TIERS};
use crate::security::{self, DAILY_CAP};
use crate::state::{
    OutboundTransfer, TransportConfig, CONFIG, ESCROW_BALANCES, OUTBOUND_TRANSFERS,
    OUTGOING_NONCE, PENDING_ADMIN, PROCESSED_TRANSFERS, ROUTES, STATS, TRANSPORTS,
};
use crate::transport::{adapter_for, load_active_transport};
use crate::validator_quorum::{ValidatorSet, PACKET_SIGNERS, VALIDATOR_SETS};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 30;

// ============================================================================
// Core Queries
// ============================================================================

pub fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        admin: config.admin,
        this_chain_id: config.this_chain_id,
        token: config.token,
        fee_denom: config.fee_denom,
        fee_collector: config.fee_collector,
        supply_oracle: config.supply_oracle,
        min_bridge_amount: config.min_bridge_amount,
        max_bridge_amount: config.max_bridge_amount,
        min_validators: config.min_validators,
    })
}

pub fn query_status(deps: Deps) -> StdResult<StatusResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(StatusResponse {
        paused: config.paused,
        emergency_mode: security::is_emergency(&deps.querier, &config)?,
        outgoing_nonce: OUTGOING_NONCE.may_load(deps.storage)?.unwrap_or(0),
    })
}

pub fn query_stats(deps: Deps) -> StdResult<StatsResponse> {
    let stats = STATS.load(deps.storage)?;
    Ok(StatsResponse {
        total_outgoing_txs: stats.total_outgoing_txs,
        total_incoming_txs: stats.total_incoming_txs,
        total_refunds: stats.total_refunds,
        total_fees_collected: stats.total_fees_collected,
    })
}

pub fn query_pending_admin(deps: Deps) -> StdResult<Option<PendingAdminResponse>> {
    Ok(PENDING_ADMIN
        .may_load(deps.storage)?
        .map(|pending| PendingAdminResponse {
            new_address: pending.new_address,
            execute_after: pending.execute_after,
        }))
}

// ============================================================================
// Transport Queries
// ============================================================================

fn transport_response(deps: Deps, transport: TransportConfig) -> StdResult<TransportResponse> {
    let fee = TRANSPORT_FEES
        .may_load(deps.storage, &transport.transport_id)?
        .unwrap_or_default();
    Ok(TransportResponse {
        settlement: adapter_for(transport.kind).settlement(),
        transport_id: transport.transport_id,
        kind: transport.kind,
        relayer: transport.relayer,
        active: transport.active,
        packet_timeout_seconds: transport.packet_timeout_seconds,
        fee,
    })
}

pub fn query_transport(deps: Deps, transport_id: String) -> StdResult<TransportResponse> {
    let transport = TRANSPORTS.load(deps.storage, &transport_id)?;
    transport_response(deps, transport)
}

pub fn query_transports(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<TransportsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.as_deref().map(Bound::exclusive);

    let transports = TRANSPORTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.and_then(|(_, transport)| transport_response(deps, transport)))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(TransportsResponse { transports })
}

pub fn query_route(
    deps: Deps,
    transport_id: String,
    chain_id: u64,
) -> StdResult<Option<RouteResponse>> {
    Ok(ROUTES
        .may_load(deps.storage, (transport_id.as_str(), chain_id))?
        .map(|route| RouteResponse {
            transport_id,
            chain_id,
            trusted_sender: route.trusted_sender,
            enabled: route.enabled,
        }))
}

// ============================================================================
// Fee & Limit Queries
// ============================================================================

pub fn query_estimate_fee(
    deps: Deps,
    transport_id: String,
    dest_chain: u64,
    amount: Uint128,
    payer: Option<String>,
) -> StdResult<FeeQuote> {
    let payer = payer.map(|p| deps.api.addr_validate(&p)).transpose()?;

    load_active_transport(deps.storage, &transport_id)
        .and_then(|_| {
            fee_manager::estimate(deps.storage, &transport_id, dest_chain, amount, payer.as_ref())
        })
        .map_err(|err| StdError::generic_err(err.to_string()))
}

pub fn query_rate_limits(deps: Deps) -> StdResult<RateLimitsResponse> {
    let settings = rate_limiter::load_settings(deps.storage)?;
    Ok(RateLimitsResponse {
        window_seconds: settings.window_seconds,
        user_cap: settings.user_cap,
        protocol_cap: settings.protocol_cap,
        elevated_multiplier: settings.elevated_multiplier,
        daily_cap: DAILY_CAP.may_load(deps.storage)?.unwrap_or_default(),
    })
}

fn usage_response(
    window: RateWindow,
    cap: Uint128,
    window_seconds: u64,
    tier: Option<rate_limiter::RateTier>,
) -> UsageResponse {
    UsageResponse {
        cap,
        consumed: window.consumed,
        window_start: window.window_start,
        window_end: window.window_start + window_seconds,
        tier,
    }
}

pub fn query_user_usage(deps: Deps, env: Env, account: String) -> StdResult<UsageResponse> {
    let account = deps.api.addr_validate(&account)?;
    let settings = rate_limiter::load_settings(deps.storage)?;
    let window = rate_limiter::user_usage(deps.storage, &account, env.block.time.seconds())?;
    let cap = rate_limiter::user_cap(deps.storage, &account)
        .map_err(|err| StdError::generic_err(err.to_string()))?;
    let tier = USER_TIERS.may_load(deps.storage, &account)?.unwrap_or_default();

    Ok(usage_response(window, cap, settings.window_seconds, Some(tier)))
}

pub fn query_protocol_usage(
    deps: Deps,
    env: Env,
    transport_id: String,
) -> StdResult<UsageResponse> {
    let settings = rate_limiter::load_settings(deps.storage)?;
    let window =
        rate_limiter::protocol_usage(deps.storage, &transport_id, env.block.time.seconds())?;
    let cap = rate_limiter::protocol_cap(deps.storage, &transport_id)?;

    Ok(usage_response(window, cap, settings.window_seconds, None))
}

pub fn query_daily_usage(deps: Deps, env: Env) -> StdResult<DailyUsageResponse> {
    let volume = security::daily_usage(deps.storage, env.block.time.seconds())?;
    Ok(DailyUsageResponse {
        cap: DAILY_CAP.may_load(deps.storage)?.unwrap_or_default(),
        used: volume.used,
        window_start: volume.window_start,
    })
}

// ============================================================================
// Transfer Queries
// ============================================================================

pub fn query_outbound_transfer(
    deps: Deps,
    transfer_id: Binary,
) -> StdResult<Option<OutboundTransfer>> {
    OUTBOUND_TRANSFERS.may_load(deps.storage, transfer_id.as_slice())
}

pub fn query_is_processed(
    deps: Deps,
    transport_id: String,
    source_chain: u64,
    transfer_id: Binary,
) -> StdResult<IsProcessedResponse> {
    let record = PROCESSED_TRANSFERS.may_load(
        deps.storage,
        (transport_id.as_str(), source_chain, transfer_id.as_slice()),
    )?;
    Ok(IsProcessedResponse {
        processed: record.is_some(),
        record,
    })
}

pub fn query_escrow_balance(
    deps: Deps,
    transport_id: Option<String>,
) -> StdResult<EscrowBalanceResponse> {
    let amount = match transport_id {
        Some(id) => ESCROW_BALANCES
            .may_load(deps.storage, &id)?
            .unwrap_or_default(),
        None => ESCROW_BALANCES
            .range(deps.storage, None, None, Order::Ascending)
            .try_fold(Uint128::zero(), |total, item| -> StdResult<_> {
                let (_, balance) = item?;
                Ok(total.checked_add(balance)?)
            })?,
    };
    Ok(EscrowBalanceResponse { amount })
}

// ============================================================================
// Validator Quorum Queries
// ============================================================================

pub fn query_validator_set(deps: Deps, transport_id: String) -> StdResult<Option<ValidatorSet>> {
    VALIDATOR_SETS.may_load(deps.storage, &transport_id)
}

pub fn query_packet_signers(deps: Deps, packet_hash: Binary) -> StdResult<PacketSignersResponse> {
    Ok(PacketSignersResponse {
        signers: PACKET_SIGNERS
            .may_load(deps.storage, packet_hash.as_slice())?
            .unwrap_or_default(),
    })
}

pub fn query_compute_packet_hash(packet: Packet) -> StdResult<ComputeHashResponse> {
    Ok(ComputeHashResponse {
        hash: Binary::from(compute_packet_hash(&packet).to_vec()),
    })
}
