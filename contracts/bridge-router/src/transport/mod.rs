//! Transport adapters
//!
//! A transport is one way of relaying a value-transfer intent between
//! chains. The router knows the closed set of variants through
//! [`TransportKind`] and talks to each through the [`TransportAdapter`]
//! trait; the registry maps transport ids to a kind plus its relayer.
//!
//! Variants differ in two things only:
//! - how the source side settles (`Settlement::BurnMint` or `LockRelease`)
//! - how the destination proves who sent a delivery (`verify_sender`)
//!
//! Replay protection, escrow accounting and minting are shared and live in
//! `execute::receive`.

mod endpoint;
mod escrow;
mod gateway;
mod quorum;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Api, Binary, StdResult, Storage, Uint128};

use crate::error::ContractError;
use crate::msg::Packet;
use crate::state::{OutboundTransfer, TransportConfig, ROUTES, TRANSPORTS};

pub use endpoint::EndpointRelayAdapter;
pub use escrow::AttestedEscrowAdapter;
pub use gateway::GatewayCommitmentAdapter;
pub use quorum::ValidatorQuorumAdapter;

#[cw_serde]
#[derive(Copy, Eq)]
pub enum TransportKind {
    /// Messaging endpoint relays the remote sender address verbatim
    EndpointRelay,
    /// Gateway presents a keccak commitment over the transfer
    GatewayCommitment,
    /// Lock-and-mint; an attester key signs each release
    AttestedEscrow,
    /// Packets carry a threshold of validator signatures
    ValidatorQuorum,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::EndpointRelay => "endpoint_relay",
            TransportKind::GatewayCommitment => "gateway_commitment",
            TransportKind::AttestedEscrow => "attested_escrow",
            TransportKind::ValidatorQuorum => "validator_quorum",
        }
    }
}

/// How the source side disposes of bridged tokens
#[cw_serde]
#[derive(Copy, Eq)]
pub enum Settlement {
    /// Burn on send, mint on receive
    BurnMint,
    /// Escrow on send, release escrow on receive
    LockRelease,
}

/// Transfer fields every envelope carries
#[cw_serde]
pub struct TransferBody {
    pub transfer_id: Binary,
    pub source_chain: u64,
    pub dest_chain: u64,
    pub recipient: String,
    pub amount: Uint128,
}

impl TransferBody {
    fn from_transfer(transfer: &OutboundTransfer) -> Self {
        Self {
            transfer_id: transfer.transfer_id.clone(),
            source_chain: transfer.source_chain,
            dest_chain: transfer.dest_chain,
            recipient: transfer.recipient.clone(),
            amount: transfer.amount,
        }
    }
}

/// Opaque, variant-specific message handed to the relay layer
#[cw_serde]
pub enum Envelope {
    EndpointRelay {
        sender: Binary,
        transfer: TransferBody,
        adapter_params: Option<Binary>,
    },
    GatewayCommitment {
        source_address: Binary,
        commitment: Binary,
        transfer: TransferBody,
    },
    AttestedEscrow {
        escrow_digest: Binary,
        transfer: TransferBody,
    },
    ValidatorQuorum {
        packet: Packet,
    },
}

impl Envelope {
    pub fn timeout_at(&self) -> Option<u64> {
        match self {
            Envelope::ValidatorQuorum { packet } => Some(packet.timeout_timestamp),
            _ => None,
        }
    }
}

/// Everything an adapter needs to build an outbound envelope
pub struct SendContext<'a> {
    pub transport: &'a TransportConfig,
    pub transfer: &'a OutboundTransfer,
    /// 32-byte identity of this router, as remote chains trust it
    pub router_identity: [u8; 32],
    pub now: u64,
    pub extra_data: Option<&'a Binary>,
}

/// A delivery's claim of origin, checked against the route's trusted sender
pub struct SenderProof<'a> {
    pub source_chain: u64,
    pub trusted_sender: &'a [u8],
    pub proof: &'a [u8],
    pub transfer_id: &'a [u8],
    pub recipient: &'a str,
    pub amount: Uint128,
    /// Set only when the delivery arrived through a verified validator quorum
    pub quorum_verified: bool,
}

pub trait TransportAdapter {
    fn kind(&self) -> TransportKind;

    fn settlement(&self) -> Settlement {
        Settlement::BurnMint
    }

    /// Whether deliveries must come from the transport's registered relayer
    fn requires_relayer(&self) -> bool {
        true
    }

    fn is_supported(
        &self,
        storage: &dyn Storage,
        transport_id: &str,
        chain_id: u64,
    ) -> StdResult<bool> {
        Ok(ROUTES
            .may_load(storage, (transport_id, chain_id))?
            .map(|route| route.enabled)
            .unwrap_or(false))
    }

    /// Check the shape of a route's trusted sender (32-byte identity by default)
    fn validate_trusted_sender(&self, trusted_sender: &[u8]) -> Result<(), ContractError> {
        if trusted_sender.len() != 32 {
            return Err(ContractError::invalid(format!(
                "{} trusted sender must be 32 bytes, got {}",
                self.kind().as_str(),
                trusted_sender.len()
            )));
        }
        Ok(())
    }

    fn send(&self, ctx: &SendContext) -> Result<Envelope, ContractError>;

    fn verify_sender(&self, api: &dyn Api, proof: &SenderProof) -> bool;
}

/// Resolve the adapter implementing a transport kind.
pub fn adapter_for(kind: TransportKind) -> &'static dyn TransportAdapter {
    match kind {
        TransportKind::EndpointRelay => &EndpointRelayAdapter,
        TransportKind::GatewayCommitment => &GatewayCommitmentAdapter,
        TransportKind::AttestedEscrow => &AttestedEscrowAdapter,
        TransportKind::ValidatorQuorum => &ValidatorQuorumAdapter,
    }
}

/// Load a registered transport.
pub fn load_transport(
    storage: &dyn Storage,
    transport_id: &str,
) -> Result<TransportConfig, ContractError> {
    TRANSPORTS
        .may_load(storage, transport_id)?
        .ok_or_else(|| ContractError::invalid(format!("unknown transport {}", transport_id)))
}

/// Load a registered transport, failing with `ProtocolInactive` if disabled.
pub fn load_active_transport(
    storage: &dyn Storage,
    transport_id: &str,
) -> Result<TransportConfig, ContractError> {
    let transport = load_transport(storage, transport_id)?;
    if !transport.active {
        return Err(ContractError::ProtocolInactive {
            transport_id: transport_id.to_string(),
        });
    }
    Ok(transport)
}

/// 32-byte identity remote chains configure as this router's trusted sender.
pub fn router_identity(contract_address: &str) -> [u8; 32] {
    common::keccak256(contract_address.as_bytes())
}
