//! Execute handlers for the bridge router contract.
//!
//! This module contains all execute message handlers, organized by category:
//! - `bridge` - outgoing transfers through a transport
//! - `receive` - the replay-protected delivery routine shared by every transport
//! - `packet` - validator-quorum packets and timeout refunds
//! - `config` - transports, routes, fees, rate limits and validator sets
//! - `admin` - pause, unpause and admin transfer

mod admin;
mod bridge;
mod config;
mod packet;
mod receive;

pub use admin::*;
pub use bridge::*;
pub use config::*;
pub use packet::*;
pub use receive::*;

use cosmwasm_std::{Addr, Storage};

use crate::error::ContractError;
use crate::state::{Config, CONFIG};

/// Load the config, failing unless `sender` is the admin.
pub(crate) fn load_config_as_admin(
    storage: &dyn Storage,
    sender: &Addr,
) -> Result<Config, ContractError> {
    let config = CONFIG.load(storage)?;
    if *sender != config.admin {
        return Err(ContractError::Unauthorized);
    }
    Ok(config)
}
