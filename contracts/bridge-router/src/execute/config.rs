//! Configuration handlers.
//!
//! All handlers here are admin-only.

use cosmwasm_std::{Binary, DepsMut, HexBinary, MessageInfo, Response, Uint128};

use super::load_config_as_admin;
use crate::error::ContractError;
use crate::fee_manager::{
    validate_bps, validate_volume_tiers, FeeOverride, TransportFee, VolumeTier,
    ACCOUNT_DISCOUNTS, DEFAULT_GAS_PRICE, FEE_OVERRIDES, GAS_PRICES, TRANSPORT_FEES,
    VOLUME_TIERS,
};
use crate::rate_limiter::{
    RateLimitSettings, RateTier, PROTOCOL_CAPS, RATE_LIMIT_SETTINGS, USER_TIERS,
};
use crate::security::DAILY_CAP;
use crate::state::{RouteConfig, TransportConfig, CONFIG, ROUTES, TRANSPORTS};
use crate::transport::{adapter_for, load_transport, TransportKind};
use crate::validator_quorum::{new_validator_set, VALIDATOR_SETS};

/// Longest accepted transport id
const MAX_TRANSPORT_ID_LEN: usize = 64;

// ============================================================================
// Transport Registry
// ============================================================================

pub fn execute_register_transport(
    deps: DepsMut,
    info: MessageInfo,
    transport_id: String,
    kind: TransportKind,
    relayer: String,
    packet_timeout_seconds: Option<u64>,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    if transport_id.is_empty() || transport_id.len() > MAX_TRANSPORT_ID_LEN {
        return Err(ContractError::invalid(format!(
            "transport id must be 1-{} bytes",
            MAX_TRANSPORT_ID_LEN
        )));
    }
    if TRANSPORTS.has(deps.storage, &transport_id) {
        return Err(ContractError::invalid(format!(
            "transport {} already registered",
            transport_id
        )));
    }

    let relayer = deps.api.addr_validate(&relayer)?;
    let packet_timeout_seconds = match (kind, packet_timeout_seconds) {
        (TransportKind::ValidatorQuorum, Some(timeout)) if timeout > 0 => timeout,
        (TransportKind::ValidatorQuorum, _) => {
            return Err(ContractError::invalid(
                "validator_quorum transports need a positive packet timeout",
            ))
        }
        _ => 0,
    };

    TRANSPORTS.save(
        deps.storage,
        &transport_id,
        &TransportConfig {
            transport_id: transport_id.clone(),
            kind,
            relayer: relayer.clone(),
            active: true,
            packet_timeout_seconds,
        },
    )?;

    Ok(Response::new()
        .add_attribute("method", "register_transport")
        .add_attribute("transport_id", transport_id)
        .add_attribute("kind", kind.as_str())
        .add_attribute("relayer", relayer))
}

pub fn execute_set_transport_active(
    deps: DepsMut,
    info: MessageInfo,
    transport_id: String,
    active: bool,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    let mut transport = load_transport(deps.storage, &transport_id)?;
    transport.active = active;
    TRANSPORTS.save(deps.storage, &transport_id, &transport)?;

    Ok(Response::new()
        .add_attribute("method", "set_transport_active")
        .add_attribute("transport_id", transport_id)
        .add_attribute("active", active.to_string()))
}

pub fn execute_set_route(
    deps: DepsMut,
    info: MessageInfo,
    transport_id: String,
    chain_id: u64,
    trusted_sender: Binary,
    enabled: bool,
) -> Result<Response, ContractError> {
    let config = load_config_as_admin(deps.storage, &info.sender)?;

    let transport = load_transport(deps.storage, &transport_id)?;
    if chain_id == config.this_chain_id {
        return Err(ContractError::invalid("cannot route to this chain"));
    }
    adapter_for(transport.kind).validate_trusted_sender(trusted_sender.as_slice())?;

    ROUTES.save(
        deps.storage,
        (transport_id.as_str(), chain_id),
        &RouteConfig {
            trusted_sender: trusted_sender.clone(),
            enabled,
        },
    )?;

    Ok(Response::new()
        .add_attribute("method", "set_route")
        .add_attribute("transport_id", transport_id)
        .add_attribute("chain_id", chain_id.to_string())
        .add_attribute("trusted_sender", trusted_sender.to_base64())
        .add_attribute("enabled", enabled.to_string()))
}

pub fn execute_remove_route(
    deps: DepsMut,
    info: MessageInfo,
    transport_id: String,
    chain_id: u64,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    if !ROUTES.has(deps.storage, (transport_id.as_str(), chain_id)) {
        return Err(ContractError::invalid(format!(
            "no route for {} to chain {}",
            transport_id, chain_id
        )));
    }
    ROUTES.remove(deps.storage, (transport_id.as_str(), chain_id));

    Ok(Response::new()
        .add_attribute("method", "remove_route")
        .add_attribute("transport_id", transport_id)
        .add_attribute("chain_id", chain_id.to_string()))
}

// ============================================================================
// Fees
// ============================================================================

pub fn execute_set_fee_config(
    deps: DepsMut,
    info: MessageInfo,
    transport_id: String,
    fee: TransportFee,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;
    load_transport(deps.storage, &transport_id)?;
    fee.validate()?;

    TRANSPORT_FEES.save(deps.storage, &transport_id, &fee)?;

    Ok(Response::new()
        .add_attribute("method", "set_fee_config")
        .add_attribute("transport_id", transport_id)
        .add_attribute("base_fee", fee.base_fee)
        .add_attribute("percentage_fee_bps", fee.percentage_fee_bps.to_string())
        .add_attribute("gas_estimate", fee.gas_estimate.to_string()))
}

pub fn execute_set_chain_fee_override(
    deps: DepsMut,
    info: MessageInfo,
    transport_id: String,
    chain_id: u64,
    fee_override: FeeOverride,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;
    load_transport(deps.storage, &transport_id)?;

    let key = (transport_id.as_str(), chain_id);
    if fee_override.base_fee.is_none() && fee_override.gas_estimate.is_none() {
        FEE_OVERRIDES.remove(deps.storage, key);
    } else {
        FEE_OVERRIDES.save(deps.storage, key, &fee_override)?;
    }

    Ok(Response::new()
        .add_attribute("method", "set_chain_fee_override")
        .add_attribute("transport_id", transport_id)
        .add_attribute("chain_id", chain_id.to_string()))
}

pub fn execute_set_gas_price(
    deps: DepsMut,
    info: MessageInfo,
    chain_id: Option<u64>,
    gas_price: Uint128,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    match chain_id {
        Some(chain_id) => GAS_PRICES.save(deps.storage, chain_id, &gas_price)?,
        None => DEFAULT_GAS_PRICE.save(deps.storage, &gas_price)?,
    }

    Ok(Response::new()
        .add_attribute("method", "set_gas_price")
        .add_attribute(
            "chain_id",
            chain_id.map_or_else(|| "default".to_string(), |id| id.to_string()),
        )
        .add_attribute("gas_price", gas_price))
}

pub fn execute_set_account_discount(
    deps: DepsMut,
    info: MessageInfo,
    account: String,
    discount_bps: u64,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;
    validate_bps("discount_bps", discount_bps)?;

    let account = deps.api.addr_validate(&account)?;
    ACCOUNT_DISCOUNTS.save(deps.storage, &account, &discount_bps)?;

    Ok(Response::new()
        .add_attribute("method", "set_account_discount")
        .add_attribute("account", account)
        .add_attribute("discount_bps", discount_bps.to_string()))
}

pub fn execute_remove_account_discount(
    deps: DepsMut,
    info: MessageInfo,
    account: String,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    let account = deps.api.addr_validate(&account)?;
    ACCOUNT_DISCOUNTS.remove(deps.storage, &account);

    Ok(Response::new()
        .add_attribute("method", "remove_account_discount")
        .add_attribute("account", account))
}

pub fn execute_set_volume_tiers(
    deps: DepsMut,
    info: MessageInfo,
    tiers: Vec<VolumeTier>,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    let tiers = validate_volume_tiers(tiers)?;
    VOLUME_TIERS.save(deps.storage, &tiers)?;

    Ok(Response::new()
        .add_attribute("method", "set_volume_tiers")
        .add_attribute("tiers", tiers.len().to_string()))
}

// ============================================================================
// Rate Limits & Security
// ============================================================================

pub fn execute_set_rate_limits(
    deps: DepsMut,
    info: MessageInfo,
    settings: RateLimitSettings,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;
    settings.validate()?;

    RATE_LIMIT_SETTINGS.save(deps.storage, &settings)?;

    Ok(Response::new()
        .add_attribute("method", "set_rate_limits")
        .add_attribute("window_seconds", settings.window_seconds.to_string())
        .add_attribute("user_cap", settings.user_cap)
        .add_attribute("protocol_cap", settings.protocol_cap)
        .add_attribute(
            "elevated_multiplier",
            settings.elevated_multiplier.to_string(),
        ))
}

pub fn execute_set_protocol_rate_cap(
    deps: DepsMut,
    info: MessageInfo,
    transport_id: String,
    cap: Option<Uint128>,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;
    load_transport(deps.storage, &transport_id)?;

    match cap {
        Some(cap) => PROTOCOL_CAPS.save(deps.storage, &transport_id, &cap)?,
        None => PROTOCOL_CAPS.remove(deps.storage, &transport_id),
    }

    Ok(Response::new()
        .add_attribute("method", "set_protocol_rate_cap")
        .add_attribute("transport_id", transport_id)
        .add_attribute(
            "cap",
            cap.map_or_else(|| "default".to_string(), |c| c.to_string()),
        ))
}

pub fn execute_set_user_tier(
    deps: DepsMut,
    info: MessageInfo,
    account: String,
    tier: RateTier,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    let account = deps.api.addr_validate(&account)?;
    match tier {
        RateTier::Default => USER_TIERS.remove(deps.storage, &account),
        RateTier::Elevated => USER_TIERS.save(deps.storage, &account, &tier)?,
    }

    Ok(Response::new()
        .add_attribute("method", "set_user_tier")
        .add_attribute("account", account)
        .add_attribute(
            "tier",
            match tier {
                RateTier::Default => "default",
                RateTier::Elevated => "elevated",
            },
        ))
}

pub fn execute_set_daily_cap(
    deps: DepsMut,
    info: MessageInfo,
    cap: Uint128,
) -> Result<Response, ContractError> {
    load_config_as_admin(deps.storage, &info.sender)?;

    DAILY_CAP.save(deps.storage, &cap)?;

    Ok(Response::new()
        .add_attribute("method", "set_daily_cap")
        .add_attribute("cap", cap))
}

pub fn execute_set_validator_set(
    deps: DepsMut,
    info: MessageInfo,
    transport_id: String,
    validators: Vec<HexBinary>,
    threshold: u32,
) -> Result<Response, ContractError> {
    let config = load_config_as_admin(deps.storage, &info.sender)?;

    let transport = load_transport(deps.storage, &transport_id)?;
    if transport.kind != TransportKind::ValidatorQuorum {
        return Err(ContractError::invalid(format!(
            "transport {} is not a validator_quorum transport",
            transport_id
        )));
    }

    let set = new_validator_set(validators, threshold, config.min_validators)?;
    VALIDATOR_SETS.save(deps.storage, &transport_id, &set)?;

    Ok(Response::new()
        .add_attribute("method", "set_validator_set")
        .add_attribute("transport_id", transport_id)
        .add_attribute("validators", set.size().to_string())
        .add_attribute("threshold", set.threshold.to_string()))
}

pub fn execute_set_supply_oracle(
    deps: DepsMut,
    info: MessageInfo,
    oracle: Option<String>,
) -> Result<Response, ContractError> {
    let mut config = load_config_as_admin(deps.storage, &info.sender)?;

    config.supply_oracle = oracle
        .map(|addr| deps.api.addr_validate(&addr))
        .transpose()?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "set_supply_oracle")
        .add_attribute(
            "oracle",
            config
                .supply_oracle
                .map_or_else(|| "none".to_string(), |a| a.to_string()),
        ))
}

pub fn execute_update_limits(
    deps: DepsMut,
    info: MessageInfo,
    min_bridge_amount: Option<Uint128>,
    max_bridge_amount: Option<Uint128>,
) -> Result<Response, ContractError> {
    let mut config = load_config_as_admin(deps.storage, &info.sender)?;

    if let Some(min) = min_bridge_amount {
        config.min_bridge_amount = min;
    }
    if let Some(max) = max_bridge_amount {
        config.max_bridge_amount = max;
    }
    if config.min_bridge_amount > config.max_bridge_amount {
        return Err(ContractError::invalid(
            "min_bridge_amount exceeds max_bridge_amount",
        ));
    }
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "update_limits")
        .add_attribute("min_bridge_amount", config.min_bridge_amount)
        .add_attribute("max_bridge_amount", config.max_bridge_amount))
}
