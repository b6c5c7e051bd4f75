//! Common - Shared Types and Utilities for the Omnichain Supply Bridge
//!
//! The pieces both contracts must agree on byte-for-byte: hashing helpers,
//! basis-point math and the supply oracle's emergency query.

pub mod bps;
pub mod hash;
pub mod oracle;

pub use bps::{apply_bps, deviation_bps, BPS_DENOMINATOR};
pub use hash::{bytes32_to_hex, eip191_hash, keccak256};
pub use oracle::{EmergencyStatusResponse, SupplyOracleQuery};
