//! State definitions for the supply oracle contract

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

/// Contract configuration
#[cw_serde]
pub struct Config {
    pub admin: Addr,
    /// Distinct reporters that must agree before a snapshot commits
    pub required_signatures: u32,
    /// Largest tolerated deviation of global circulating supply, in bps
    pub tolerance_bps: u64,
    /// Snapshots and pending updates older than this are stale (seconds)
    pub reconciliation_period: u64,
    /// Global supply the sum of circulating supplies must match
    pub expected_total_supply: Uint128,
}

/// Latest committed supply snapshot of one chain
#[cw_serde]
pub struct ChainSupply {
    pub chain_id: u64,
    pub total_supply: Uint128,
    pub locked_supply: Uint128,
    pub circulating_supply: Uint128,
    /// Commit counter of the chain at the time of this snapshot
    pub epoch: u64,
    pub updated_at: Timestamp,
    pub reporters: Vec<Addr>,
}

/// Report tuple collecting reporter agreement
#[cw_serde]
pub struct PendingUpdate {
    pub update_id: Binary,
    pub chain_id: u64,
    pub total_supply: Uint128,
    pub locked_supply: Uint128,
    pub circulating_supply: Uint128,
    pub epoch: u64,
    pub first_seen: Timestamp,
    pub reporters: Vec<Addr>,
}

/// A reporter's current vote for a chain
#[cw_serde]
pub struct ReporterVote {
    pub update_id: Binary,
    pub epoch: u64,
}

#[cw_serde]
#[derive(Default)]
pub struct EmergencyState {
    pub active: bool,
    pub activated_at: Option<Timestamp>,
    pub reason: Option<String>,
}

// ============================================================================
// Constants
// ============================================================================

pub const CONTRACT_NAME: &str = "crates.io:supply-oracle";

pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default deviation tolerance (1%)
pub const DEFAULT_TOLERANCE_BPS: u64 = 100;

/// Default reconciliation period (1 hour)
pub const DEFAULT_RECONCILIATION_PERIOD: u64 = 3_600;

pub const MAX_REASON_LEN: usize = 256;

// ============================================================================
// Storage
// ============================================================================

pub const CONFIG: Item<Config> = Item::new("config");

pub const REPORTERS: Map<&Addr, bool> = Map::new("reporters");

/// Chains whose supply is reconciled. Key: chain id
pub const MONITORED_CHAINS: Map<u64, bool> = Map::new("monitored_chains");

/// Key: chain id
pub const CHAIN_SUPPLIES: Map<u64, ChainSupply> = Map::new("chain_supplies");

/// Commits so far per chain. Key: chain id
pub const CHAIN_EPOCHS: Map<u64, u64> = Map::new("chain_epochs");

/// Key: 32-byte update id
pub const PENDING_UPDATES: Map<&[u8], PendingUpdate> = Map::new("pending_updates");

/// Key: (reporter, chain id)
pub const REPORTER_VOTES: Map<(&Addr, u64), ReporterVote> = Map::new("reporter_votes");

pub const EMERGENCY: Item<EmergencyState> = Item::new("emergency");
