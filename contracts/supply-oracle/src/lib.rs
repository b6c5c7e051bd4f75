//! Supply Oracle Contract - Global Supply Accounting
//!
//! Independent reporters submit each chain's `{total, locked, circulating}`
//! supply. A snapshot commits once `required_signatures` distinct reporters
//! report the same numbers for the chain's current epoch.
//!
//! After every commit the sum of circulating supplies across monitored chains
//! is compared with the expected global supply. A deviation beyond
//! `tolerance_bps` sets emergency mode, which routers query before every
//! transfer. Only the admin can clear it.

pub mod contract;
pub mod error;
mod execute;
pub mod msg;
mod query;
pub mod reconcile;
pub mod state;

pub use crate::error::ContractError;
pub use crate::reconcile::compute_update_id;
