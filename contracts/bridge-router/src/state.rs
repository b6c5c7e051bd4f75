//! State definitions for the bridge router contract
//!
//! Component-specific tables (fees, rate windows, daily cap, validator sets)
//! live next to the logic that owns them; this module holds the router core.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

use crate::transport::{Settlement, TransportKind};

// ============================================================================
// Core Configuration
// ============================================================================

/// Contract configuration
#[cw_serde]
pub struct Config {
    /// Admin address for contract management
    pub admin: Addr,
    /// Whether the bridge is currently paused
    pub paused: bool,
    /// Chain id of the ledger this instance runs on
    pub this_chain_id: u64,
    /// CW20 asset ledger bridged by this router
    pub token: Addr,
    /// Native denom fees are paid in
    pub fee_denom: String,
    /// Fee collector address
    pub fee_collector: Addr,
    /// Supply oracle consulted for emergency mode (None = not wired yet)
    pub supply_oracle: Option<Addr>,
    /// Minimum bridge amount (in smallest unit)
    pub min_bridge_amount: Uint128,
    /// Maximum bridge amount per transaction (in smallest unit)
    pub max_bridge_amount: Uint128,
    /// Smallest validator set accepted for validator-quorum transports
    pub min_validators: u32,
}

/// Pending admin change proposal
#[cw_serde]
pub struct PendingAdmin {
    /// Proposed new admin address
    pub new_address: Addr,
    /// Block time when the change can be executed
    pub execute_after: Timestamp,
}

/// Bridge statistics
#[cw_serde]
#[derive(Default)]
pub struct Stats {
    pub total_outgoing_txs: u64,
    pub total_incoming_txs: u64,
    pub total_refunds: u64,
    /// Total fees collected (in `fee_denom`)
    pub total_fees_collected: Uint128,
}

// ============================================================================
// Transport Registry
// ============================================================================

/// Registered transport adapter
#[cw_serde]
pub struct TransportConfig {
    pub transport_id: String,
    pub kind: TransportKind,
    /// Endpoint/gateway/relay account allowed to deliver for this transport.
    /// Unused by validator-quorum transports, where signatures authorize.
    pub relayer: Addr,
    /// Deactivated transports quote no fees and accept no transfers
    pub active: bool,
    /// Packet lifetime for validator-quorum transports (0 for other kinds)
    pub packet_timeout_seconds: u64,
}

/// Per-chain route of a transport.
///
/// A route to chain X means the transport may send to X, and deliveries
/// from X must prove they came from `trusted_sender`.
#[cw_serde]
pub struct RouteConfig {
    /// Remote sender identity; its format depends on the transport kind
    pub trusted_sender: Binary,
    pub enabled: bool,
}

/// Record of a transfer initiated on this chain
#[cw_serde]
pub struct OutboundTransfer {
    pub transfer_id: Binary,
    pub transport_id: String,
    pub source_chain: u64,
    pub dest_chain: u64,
    pub sender: Addr,
    pub recipient: String,
    pub amount: Uint128,
    pub nonce: u64,
    pub created_at: Timestamp,
    /// Packet timeout (validator-quorum transports only), unix seconds
    pub timeout_at: Option<u64>,
    pub settlement: Settlement,
    pub refunded: bool,
}

/// Record of a delivery applied on this chain
#[cw_serde]
pub struct ProcessedTransfer {
    pub recipient: Addr,
    pub amount: Uint128,
    pub processed_at: Timestamp,
}

// ============================================================================
// Constants
// ============================================================================

/// Contract name for cw2 migration info
pub const CONTRACT_NAME: &str = "crates.io:bridge-router";

/// Contract version for cw2 migration info
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// 7 days in seconds for admin change timelock
pub const ADMIN_TIMELOCK_DURATION: u64 = 604_800;

/// Default minimum validator set size for validator-quorum transports
pub const DEFAULT_MIN_VALIDATORS: u32 = 21;

/// Longest accepted destination recipient string
pub const MAX_RECIPIENT_LEN: usize = 128;

// ============================================================================
// Core State Storage
// ============================================================================

pub const CONFIG: Item<Config> = Item::new("config");

pub const PENDING_ADMIN: Item<PendingAdmin> = Item::new("pending_admin");

pub const STATS: Item<Stats> = Item::new("stats");

/// Outgoing nonce counter
pub const OUTGOING_NONCE: Item<u64> = Item::new("outgoing_nonce");

/// Key: transport id
pub const TRANSPORTS: Map<&str, TransportConfig> = Map::new("transports");

/// Key: (transport id, remote chain id)
pub const ROUTES: Map<(&str, u64), RouteConfig> = Map::new("routes");

/// Key: 32-byte transfer id
pub const OUTBOUND_TRANSFERS: Map<&[u8], OutboundTransfer> = Map::new("outbound_transfers");

/// Permanent replay protection.
/// Key: (transport id, source chain id, 32-byte transfer id)
pub const PROCESSED_TRANSFERS: Map<(&str, u64, &[u8]), ProcessedTransfer> =
    Map::new("processed_transfers");

/// Tokens escrowed by lock-and-mint transports. Key: transport id
pub const ESCROW_BALANCES: Map<&str, Uint128> = Map::new("escrow_balances");
