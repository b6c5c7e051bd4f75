//! Rate Limiter Module
//!
//! Fixed windows of `window_seconds`, one per user and one per transport.
//! A window restarts at the first use after it has expired
//! (`now - window_start > window_seconds`).
//!
//! A cap of zero means unlimited. Users on the `Elevated` tier get
//! `user_cap * elevated_multiplier`.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, StdResult, Storage, Uint128};
use cw_storage_plus::{Item, Map};

use crate::error::ContractError;

/// Default window length (24 hours)
pub const DEFAULT_WINDOW_SECONDS: u64 = 86_400;

/// Default multiplier for elevated users
pub const DEFAULT_ELEVATED_MULTIPLIER: u64 = 10;

// ============================================================================
// Data Structures
// ============================================================================

#[cw_serde]
pub struct RateLimitSettings {
    pub window_seconds: u64,
    /// Per-user cap per window (0 = unlimited)
    pub user_cap: Uint128,
    /// Per-transport cap per window unless overridden (0 = unlimited)
    pub protocol_cap: Uint128,
    pub elevated_multiplier: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window_seconds: DEFAULT_WINDOW_SECONDS,
            user_cap: Uint128::zero(),
            protocol_cap: Uint128::zero(),
            elevated_multiplier: DEFAULT_ELEVATED_MULTIPLIER,
        }
    }
}

impl RateLimitSettings {
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.window_seconds == 0 {
            return Err(ContractError::invalid("window_seconds must be positive"));
        }
        if self.elevated_multiplier == 0 {
            return Err(ContractError::invalid("elevated_multiplier must be positive"));
        }
        Ok(())
    }
}

#[cw_serde]
#[derive(Copy, Eq, Default)]
pub enum RateTier {
    #[default]
    Default,
    Elevated,
}

#[cw_serde]
#[derive(Default)]
pub struct RateWindow {
    pub window_start: u64,
    pub consumed: Uint128,
}

impl RateWindow {
    /// The window as it stands at `now`, restarted if expired.
    fn at(stored: Option<RateWindow>, now: u64, window_seconds: u64) -> RateWindow {
        match stored {
            Some(window) if now.saturating_sub(window.window_start) <= window_seconds => window,
            _ => RateWindow {
                window_start: now,
                consumed: Uint128::zero(),
            },
        }
    }

    fn check(&self, scope: &str, cap: Uint128, amount: Uint128) -> Result<(), ContractError> {
        if cap.is_zero() {
            return Ok(());
        }
        if self.consumed.checked_add(amount)? > cap {
            return Err(ContractError::RateExceeded {
                scope: scope.to_string(),
                cap,
                consumed: self.consumed,
                requested: amount,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Storage
// ============================================================================

pub const RATE_LIMIT_SETTINGS: Item<RateLimitSettings> = Item::new("rate_limit_settings");

/// Accounts without an entry are on `RateTier::Default`
pub const USER_TIERS: Map<&Addr, RateTier> = Map::new("user_tiers");

pub const USER_WINDOWS: Map<&Addr, RateWindow> = Map::new("user_windows");

/// Key: transport id
pub const PROTOCOL_WINDOWS: Map<&str, RateWindow> = Map::new("protocol_windows");

/// Per-transport cap overriding `RateLimitSettings::protocol_cap`
pub const PROTOCOL_CAPS: Map<&str, Uint128> = Map::new("protocol_caps");

// ============================================================================
// Operations
// ============================================================================

pub fn load_settings(storage: &dyn Storage) -> StdResult<RateLimitSettings> {
    Ok(RATE_LIMIT_SETTINGS.may_load(storage)?.unwrap_or_default())
}

/// Effective per-window cap for a user.
pub fn user_cap(storage: &dyn Storage, user: &Addr) -> Result<Uint128, ContractError> {
    let settings = load_settings(storage)?;
    let tier = USER_TIERS.may_load(storage, user)?.unwrap_or_default();
    match tier {
        RateTier::Default => Ok(settings.user_cap),
        RateTier::Elevated => Ok(settings
            .user_cap
            .checked_mul(Uint128::from(settings.elevated_multiplier))?),
    }
}

/// Effective per-window cap for a transport.
pub fn protocol_cap(storage: &dyn Storage, transport_id: &str) -> StdResult<Uint128> {
    match PROTOCOL_CAPS.may_load(storage, transport_id)? {
        Some(cap) => Ok(cap),
        None => Ok(load_settings(storage)?.protocol_cap),
    }
}

/// Charge `amount` against the user's and the transport's windows.
///
/// Both windows are checked before either is written, so a rejection leaves
/// no trace.
pub fn consume(
    storage: &mut dyn Storage,
    user: &Addr,
    transport_id: &str,
    amount: Uint128,
    now: u64,
) -> Result<(), ContractError> {
    let settings = load_settings(storage)?;

    let mut user_window = RateWindow::at(
        USER_WINDOWS.may_load(storage, user)?,
        now,
        settings.window_seconds,
    );
    let mut protocol_window = RateWindow::at(
        PROTOCOL_WINDOWS.may_load(storage, transport_id)?,
        now,
        settings.window_seconds,
    );

    user_window.check("user", user_cap(storage, user)?, amount)?;
    protocol_window.check("protocol", protocol_cap(storage, transport_id)?, amount)?;

    user_window.consumed = user_window.consumed.checked_add(amount)?;
    protocol_window.consumed = protocol_window.consumed.checked_add(amount)?;
    USER_WINDOWS.save(storage, user, &user_window)?;
    PROTOCOL_WINDOWS.save(storage, transport_id, &protocol_window)?;
    Ok(())
}

/// A user's window as it would be seen by a transfer at `now`.
pub fn user_usage(storage: &dyn Storage, user: &Addr, now: u64) -> StdResult<RateWindow> {
    let settings = load_settings(storage)?;
    Ok(RateWindow::at(
        USER_WINDOWS.may_load(storage, user)?,
        now,
        settings.window_seconds,
    ))
}

/// A transport's window as it would be seen by a transfer at `now`.
pub fn protocol_usage(storage: &dyn Storage, transport_id: &str, now: u64) -> StdResult<RateWindow> {
    let settings = load_settings(storage)?;
    Ok(RateWindow::at(
        PROTOCOL_WINDOWS.may_load(storage, transport_id)?,
        now,
        settings.window_seconds,
    ))
}

// ============================================================================
// Tests
// ============================================================================
