//! Fee Manager Module
//!
//! Quotes the fee a caller pays, in the native `fee_denom`, to bridge through
//! a transport.
//!
//! ## Fee Structure
//!
//! | Component     | Source                                              |
//! |---------------|-----------------------------------------------------|
//! | Base fee      | per transport, overridable per destination chain    |
//! | Percentage    | `amount · percentage_fee_bps / 10000`               |
//! | Discount      | max(account discount, volume tier), percentage only |
//! | Gas fee       | gas price (per chain or default) · gas estimate     |
//!
//! The discount never touches the base fee, so `protocol_fee >= base_fee`.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, StdResult, Storage, Uint128};
use cw_storage_plus::{Item, Map};

use common::{apply_bps, BPS_DENOMINATOR};

use crate::error::ContractError;

// ============================================================================
// Data Structures
// ============================================================================

/// Fee parameters of one transport
#[cw_serde]
#[derive(Default)]
pub struct TransportFee {
    /// Flat fee per transfer
    pub base_fee: Uint128,
    /// Percentage fee in basis points of the bridged amount
    pub percentage_fee_bps: u64,
    /// Gas units the destination delivery is expected to use
    pub gas_estimate: u64,
}

impl TransportFee {
    pub fn validate(&self) -> Result<(), ContractError> {
        validate_bps("percentage_fee_bps", self.percentage_fee_bps)
    }
}

/// Per (transport, destination chain) override; `None` falls back to the
/// transport default
#[cw_serde]
#[derive(Default)]
pub struct FeeOverride {
    pub base_fee: Option<Uint128>,
    pub gas_estimate: Option<u64>,
}

/// Users whose cumulative bridged volume reaches `min_volume` get
/// `discount_bps` off the percentage fee
#[cw_serde]
pub struct VolumeTier {
    pub min_volume: Uint128,
    pub discount_bps: u64,
}

/// Fee breakdown for one transfer
#[cw_serde]
pub struct FeeQuote {
    pub protocol_fee: Uint128,
    pub gas_fee: Uint128,
    pub total_fee: Uint128,
    /// Discount applied to the percentage component
    pub discount_bps: u64,
}

// ============================================================================
// Storage
// ============================================================================

/// Key: transport id
pub const TRANSPORT_FEES: Map<&str, TransportFee> = Map::new("transport_fees");

/// Key: (transport id, destination chain id)
pub const FEE_OVERRIDES: Map<(&str, u64), FeeOverride> = Map::new("fee_overrides");

/// Key: chain id
pub const GAS_PRICES: Map<u64, Uint128> = Map::new("gas_prices");

/// Gas price for chains without an entry in `GAS_PRICES`
pub const DEFAULT_GAS_PRICE: Item<Uint128> = Item::new("default_gas_price");

/// Account address -> discount in bps
pub const ACCOUNT_DISCOUNTS: Map<&Addr, u64> = Map::new("account_discounts");

/// Sorted ascending by `min_volume`
pub const VOLUME_TIERS: Item<Vec<VolumeTier>> = Item::new("volume_tiers");

/// Cumulative amount bridged per account
pub const USER_VOLUME: Map<&Addr, Uint128> = Map::new("user_volume");

// ============================================================================
// Validation
// ============================================================================

pub fn validate_bps(field: &str, bps: u64) -> Result<(), ContractError> {
    if bps as u128 > BPS_DENOMINATOR {
        return Err(ContractError::invalid(format!(
            "{} {} exceeds {}",
            field, bps, BPS_DENOMINATOR
        )));
    }
    Ok(())
}

/// Validate tiers and return them sorted by `min_volume`.
pub fn validate_volume_tiers(mut tiers: Vec<VolumeTier>) -> Result<Vec<VolumeTier>, ContractError> {
    for tier in &tiers {
        validate_bps("discount_bps", tier.discount_bps)?;
    }
    tiers.sort_by(|a, b| a.min_volume.cmp(&b.min_volume));
    if tiers.windows(2).any(|w| w[0].min_volume == w[1].min_volume) {
        return Err(ContractError::invalid("duplicate volume tier threshold"));
    }
    Ok(tiers)
}

// ============================================================================
// Fee Calculation
// ============================================================================

/// Quote the fee for bridging `amount` through `transport_id` to `chain_id`.
///
/// `payer` selects discounts; `None` quotes the undiscounted fee. Transports
/// without a fee entry are free.
pub fn estimate(
    storage: &dyn Storage,
    transport_id: &str,
    chain_id: u64,
    amount: Uint128,
    payer: Option<&Addr>,
) -> Result<FeeQuote, ContractError> {
    let fee = TRANSPORT_FEES
        .may_load(storage, transport_id)?
        .unwrap_or_default();
    let fee_override = FEE_OVERRIDES
        .may_load(storage, (transport_id, chain_id))?
        .unwrap_or_default();

    let base_fee = fee_override.base_fee.unwrap_or(fee.base_fee);
    let gas_estimate = fee_override.gas_estimate.unwrap_or(fee.gas_estimate);

    let discount_bps = match payer {
        Some(account) => effective_discount_bps(storage, account)?,
        None => 0,
    };

    let percentage = apply_bps(amount, fee.percentage_fee_bps);
    let discount = apply_bps(percentage, discount_bps);
    let protocol_fee = base_fee.checked_add(percentage - discount)?;

    let gas_fee = gas_price(storage, chain_id)?.checked_mul(Uint128::from(gas_estimate))?;
    let total_fee = protocol_fee.checked_add(gas_fee)?;

    Ok(FeeQuote {
        protocol_fee,
        gas_fee,
        total_fee,
        discount_bps,
    })
}

/// Gas price for a chain, falling back to the default price.
pub fn gas_price(storage: &dyn Storage, chain_id: u64) -> StdResult<Uint128> {
    match GAS_PRICES.may_load(storage, chain_id)? {
        Some(price) => Ok(price),
        None => Ok(DEFAULT_GAS_PRICE.may_load(storage)?.unwrap_or_default()),
    }
}

/// Larger of the account's own discount and its volume tier discount.
pub fn effective_discount_bps(storage: &dyn Storage, account: &Addr) -> StdResult<u64> {
    let account_discount = ACCOUNT_DISCOUNTS
        .may_load(storage, account)?
        .unwrap_or(0);

    let volume = USER_VOLUME.may_load(storage, account)?.unwrap_or_default();
    let tier_discount = VOLUME_TIERS
        .may_load(storage)?
        .unwrap_or_default()
        .iter()
        .filter(|tier| volume >= tier.min_volume)
        .map(|tier| tier.discount_bps)
        .max()
        .unwrap_or(0);

    Ok(account_discount.max(tier_discount))
}

/// Add a completed transfer to the account's cumulative volume.
pub fn record_volume(storage: &mut dyn Storage, account: &Addr, amount: Uint128) -> StdResult<()> {
    USER_VOLUME.update(storage, account, |volume| -> StdResult<_> {
        Ok(volume.unwrap_or_default().checked_add(amount)?)
    })?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
