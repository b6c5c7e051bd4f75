//! Message types for the bridge router contract
//!
//! This module defines all messages for instantiation, execution, and queries.

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary, HexBinary, Timestamp, Uint128};

use crate::fee_manager::{FeeQuote, TransportFee, VolumeTier};
use crate::rate_limiter::RateTier;
use crate::state::{OutboundTransfer, ProcessedTransfer};
use crate::transport::{Settlement, TransportKind};
use crate::validator_quorum::ValidatorSet;

// ============================================================================
// Instantiate & Migrate
// ============================================================================

/// Migrate message
#[cw_serde]
pub struct MigrateMsg {}

/// Instantiate message
#[cw_serde]
pub struct InstantiateMsg {
    /// Admin address for contract management
    pub admin: String,
    /// Chain id of the ledger this instance runs on
    pub this_chain_id: u64,
    /// CW20 token bridged by this router
    pub token: String,
    /// Native denom fees are paid in (e.g. "uluna")
    pub fee_denom: String,
    /// Fee collector address
    pub fee_collector: String,
    /// Supply oracle address (can be set later with `SetSupplyOracle`)
    pub supply_oracle: Option<String>,
    /// Minimum bridge amount (in smallest unit)
    pub min_bridge_amount: Uint128,
    /// Maximum bridge amount per transaction
    pub max_bridge_amount: Uint128,
    /// Minimum validator set size for validator-quorum transports (default 21)
    pub min_validators: Option<u32>,
}

// ============================================================================
// Packets
// ============================================================================

/// Validator-quorum packet
#[cw_serde]
pub struct Packet {
    pub sequence: u64,
    pub source_chain: u64,
    pub dest_chain: u64,
    /// 32-byte identity of the sending router
    pub sender: Binary,
    /// Unix seconds after which the packet can no longer be delivered
    pub timeout_timestamp: u64,
    pub data: PacketData,
}

#[cw_serde]
pub struct PacketData {
    pub transfer_id: Binary,
    pub recipient: String,
    pub amount: Uint128,
}

/// Set as response data of a successful `Bridge`
#[cw_serde]
pub struct BridgeReceipt {
    pub transfer_id: Binary,
    pub nonce: u64,
    pub fee: FeeQuote,
}

// ============================================================================
// Execute Messages
// ============================================================================

/// Execute messages
#[cw_serde]
pub enum ExecuteMsg {
    // ========================================================================
    // Transfers
    // ========================================================================
    /// Send tokens to another chain through a registered transport.
    ///
    /// The caller must have granted the router a CW20 allowance of `amount`
    /// and attach the quoted fee in `fee_denom`; any excess is refunded.
    Bridge {
        transport_id: String,
        dest_chain: u64,
        /// Recipient on the destination chain (opaque here)
        recipient: String,
        amount: Uint128,
        /// Variant-specific parameters forwarded in the envelope
        extra_data: Option<Binary>,
    },

    /// Apply a delivery relayed by a transport's endpoint, gateway or relayer.
    ///
    /// Authorization: the transport's relayer
    DeliverTransfer {
        transport_id: String,
        source_chain: u64,
        /// Variant-specific proof of the remote sender
        sender_proof: Binary,
        recipient: String,
        amount: Uint128,
        transfer_id: Binary,
    },

    /// Deliver a validator-quorum packet.
    ///
    /// Authorization: anyone; the signatures authorize
    HandlePacket {
        transport_id: String,
        packet: Packet,
        /// 65-byte `r || s || v` signatures over the EIP-191 packet hash
        signatures: Vec<Binary>,
    },

    /// Re-mint a validator-quorum transfer whose packet timed out undelivered.
    ///
    /// Authorization: anyone; validators sign the timeout digest
    RefundTimedOut {
        transfer_id: Binary,
        signatures: Vec<Binary>,
    },

    // ========================================================================
    // Transport Registry (admin)
    // ========================================================================
    RegisterTransport {
        transport_id: String,
        kind: TransportKind,
        relayer: String,
        /// Required for validator-quorum transports
        packet_timeout_seconds: Option<u64>,
    },

    SetTransportActive {
        transport_id: String,
        active: bool,
    },

    SetRoute {
        transport_id: String,
        chain_id: u64,
        trusted_sender: Binary,
        enabled: bool,
    },

    RemoveRoute {
        transport_id: String,
        chain_id: u64,
    },

    // ========================================================================
    // Fees (admin)
    // ========================================================================
    SetFeeConfig {
        transport_id: String,
        base_fee: Uint128,
        percentage_fee_bps: u64,
        gas_estimate: u64,
    },

    SetChainFeeOverride {
        transport_id: String,
        chain_id: u64,
        base_fee: Option<Uint128>,
        gas_estimate: Option<u64>,
    },

    /// Gas price for one chain, or the default when `chain_id` is None
    SetGasPrice {
        chain_id: Option<u64>,
        gas_price: Uint128,
    },

    SetAccountDiscount {
        account: String,
        discount_bps: u64,
    },

    RemoveAccountDiscount {
        account: String,
    },

    SetVolumeTiers {
        tiers: Vec<VolumeTier>,
    },

    // ========================================================================
    // Rate Limits & Security (admin)
    // ========================================================================
    SetRateLimits {
        window_seconds: u64,
        user_cap: Uint128,
        protocol_cap: Uint128,
        elevated_multiplier: u64,
    },

    /// Per-transport cap; None falls back to the global protocol cap
    SetProtocolRateCap {
        transport_id: String,
        cap: Option<Uint128>,
    },

    SetUserTier {
        account: String,
        tier: RateTier,
    },

    /// Daily volume cap across transports (0 = unlimited)
    SetDailyCap {
        cap: Uint128,
    },

    SetValidatorSet {
        transport_id: String,
        /// 20-byte validator addresses
        validators: Vec<HexBinary>,
        threshold: u32,
    },

    SetSupplyOracle {
        oracle: Option<String>,
    },

    UpdateLimits {
        min_bridge_amount: Option<Uint128>,
        max_bridge_amount: Option<Uint128>,
    },

    Pause {},

    Unpause {},

    // ========================================================================
    // Admin Handover (timelocked)
    // ========================================================================
    /// Propose a new admin (starts the 7 day timelock)
    ProposeAdmin {
        new_admin: String,
    },

    /// Accept the admin role (pending admin only, after the timelock)
    AcceptAdmin {},

    CancelAdminProposal {},
}

// ============================================================================
// Query Messages
// ============================================================================

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},

    /// Pause flag, oracle emergency mode and nonce
    #[returns(StatusResponse)]
    Status {},

    #[returns(StatsResponse)]
    Stats {},

    #[returns(TransportResponse)]
    Transport { transport_id: String },

    #[returns(TransportsResponse)]
    Transports {
        start_after: Option<String>,
        limit: Option<u32>,
    },

    #[returns(Option<RouteResponse>)]
    Route { transport_id: String, chain_id: u64 },

    /// Fee for a transfer; pass `payer` to include its discounts
    #[returns(FeeQuote)]
    EstimateFee {
        transport_id: String,
        dest_chain: u64,
        amount: Uint128,
        payer: Option<String>,
    },

    #[returns(RateLimitsResponse)]
    RateLimits {},

    #[returns(UsageResponse)]
    UserUsage { account: String },

    #[returns(UsageResponse)]
    ProtocolUsage { transport_id: String },

    #[returns(DailyUsageResponse)]
    DailyUsage {},

    #[returns(Option<OutboundTransfer>)]
    OutboundTransfer { transfer_id: Binary },

    #[returns(IsProcessedResponse)]
    IsProcessed {
        transport_id: String,
        source_chain: u64,
        transfer_id: Binary,
    },

    /// Escrow held by one transport, or by all of them when None
    #[returns(EscrowBalanceResponse)]
    EscrowBalance { transport_id: Option<String> },

    #[returns(Option<ValidatorSet>)]
    ValidatorSet { transport_id: String },

    #[returns(PacketSignersResponse)]
    PacketSigners { packet_hash: Binary },

    /// Hash validators sign (before EIP-191 wrapping) for a packet
    #[returns(ComputeHashResponse)]
    ComputePacketHash { packet: Packet },

    #[returns(Option<PendingAdminResponse>)]
    PendingAdmin {},
}

// ============================================================================
// Query Responses
// ============================================================================

#[cw_serde]
pub struct ConfigResponse {
    pub admin: Addr,
    pub this_chain_id: u64,
    pub token: Addr,
    pub fee_denom: String,
    pub fee_collector: Addr,
    pub supply_oracle: Option<Addr>,
    pub min_bridge_amount: Uint128,
    pub max_bridge_amount: Uint128,
    pub min_validators: u32,
}

#[cw_serde]
pub struct StatusResponse {
    pub paused: bool,
    pub emergency_mode: bool,
    pub outgoing_nonce: u64,
}

#[cw_serde]
pub struct StatsResponse {
    pub total_outgoing_txs: u64,
    pub total_incoming_txs: u64,
    pub total_refunds: u64,
    pub total_fees_collected: Uint128,
}

#[cw_serde]
pub struct TransportResponse {
    pub transport_id: String,
    pub kind: TransportKind,
    pub settlement: Settlement,
    pub relayer: Addr,
    pub active: bool,
    pub packet_timeout_seconds: u64,
    pub fee: TransportFee,
}

#[cw_serde]
pub struct TransportsResponse {
    pub transports: Vec<TransportResponse>,
}

#[cw_serde]
pub struct RouteResponse {
    pub transport_id: String,
    pub chain_id: u64,
    pub trusted_sender: Binary,
    pub enabled: bool,
}

#[cw_serde]
pub struct RateLimitsResponse {
    pub window_seconds: u64,
    pub user_cap: Uint128,
    pub protocol_cap: Uint128,
    pub elevated_multiplier: u64,
    pub daily_cap: Uint128,
}

#[cw_serde]
pub struct UsageResponse {
    /// Effective cap (0 = unlimited)
    pub cap: Uint128,
    pub consumed: Uint128,
    pub window_start: u64,
    pub window_end: u64,
    /// Rate tier, for user usage only
    pub tier: Option<RateTier>,
}

#[cw_serde]
pub struct DailyUsageResponse {
    pub cap: Uint128,
    pub used: Uint128,
    pub window_start: u64,
}

#[cw_serde]
pub struct IsProcessedResponse {
    pub processed: bool,
    pub record: Option<ProcessedTransfer>,
}

#[cw_serde]
pub struct EscrowBalanceResponse {
    pub amount: Uint128,
}

#[cw_serde]
pub struct PacketSignersResponse {
    pub signers: Vec<HexBinary>,
}

#[cw_serde]
pub struct ComputeHashResponse {
    pub hash: Binary,
}

#[cw_serde]
pub struct PendingAdminResponse {
    pub new_address: Addr,
    pub execute_after: Timestamp,
}
