//! Security Manager Module
//!
//! Global gates in front of every transfer:
//! - the admin pause switch in `Config`
//! - the supply oracle's emergency mode
//! - a daily volume cap across all transports

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{QuerierWrapper, StdResult, Storage, Uint128};
use cw_storage_plus::Item;

use common::oracle::query_emergency_mode;

use crate::error::ContractError;
use crate::state::Config;

/// Daily window length (24 hours)
pub const DAILY_WINDOW_SECONDS: u64 = 86_400;

#[cw_serde]
#[derive(Default)]
pub struct DailyVolume {
    pub window_start: u64,
    pub used: Uint128,
}

impl DailyVolume {
    fn at(stored: Option<DailyVolume>, now: u64) -> DailyVolume {
        match stored {
            Some(volume) if now.saturating_sub(volume.window_start) <= DAILY_WINDOW_SECONDS => {
                volume
            }
            _ => DailyVolume {
                window_start: now,
                used: Uint128::zero(),
            },
        }
    }
}

/// Cap on outbound volume per day (0 = unlimited)
pub const DAILY_CAP: Item<Uint128> = Item::new("daily_cap");

pub const DAILY_VOLUME: Item<DailyVolume> = Item::new("daily_volume");

/// Fail unless the bridge is unpaused and the oracle is not in emergency mode.
pub fn ensure_transfers_allowed(
    querier: &QuerierWrapper,
    config: &Config,
) -> Result<(), ContractError> {
    if config.paused {
        return Err(ContractError::BridgePaused);
    }
    if is_emergency(querier, config)? {
        return Err(ContractError::EmergencyPaused);
    }
    Ok(())
}

/// Whether the configured oracle reports emergency mode.
pub fn is_emergency(querier: &QuerierWrapper, config: &Config) -> StdResult<bool> {
    match &config.supply_oracle {
        Some(oracle) => query_emergency_mode(querier, oracle),
        None => Ok(false),
    }
}

/// Charge `amount` against today's volume.
pub fn check_daily_cap(
    storage: &mut dyn Storage,
    amount: Uint128,
    now: u64,
) -> Result<(), ContractError> {
    let cap = DAILY_CAP.may_load(storage)?.unwrap_or_default();
    let mut volume = DailyVolume::at(DAILY_VOLUME.may_load(storage)?, now);

    if !cap.is_zero() && volume.used.checked_add(amount)? > cap {
        return Err(ContractError::DailyCapExceeded {
            cap,
            used: volume.used,
            requested: amount,
        });
    }

    volume.used = volume.used.checked_add(amount)?;
    DAILY_VOLUME.save(storage, &volume)?;
    Ok(())
}

/// Today's volume as seen at `now`.
pub fn daily_usage(storage: &dyn Storage, now: u64) -> StdResult<DailyVolume> {
    Ok(DailyVolume::at(DAILY_VOLUME.may_load(storage)?, now))
}
