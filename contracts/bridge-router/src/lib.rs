//! Bridge Router Contract - Multi-Transport Token Bridging
//!
//! One instance per ledger moves a single CW20 asset to and from other
//! ledgers through interchangeable transports, selected per transfer by id.
//!
//! # Outgoing Flow
//! 1. User grants the router an allowance and calls `Bridge` with the fee attached
//! 2. Fee, rate windows and the daily cap are checked
//! 3. Tokens are burned, or escrowed for lock-and-mint transports
//! 4. The transport builds its envelope, emitted in `transfer_initiated`
//!
//! # Incoming Flow
//! 1. A relayer calls `DeliverTransfer`, or anyone submits a signed packet
//!    with `HandlePacket` for validator-quorum transports
//! 2. The transfer id is checked against the processed set
//! 3. The transport verifies the remote sender against the route
//! 4. Tokens are minted, or released from escrow
//!
//! # Security
//! - Permanent per-transport replay protection
//! - Per-user and per-transport rate windows, plus a daily cap
//! - Supply oracle emergency mode halts transfers on every transport
//! - Admin pause and timelocked admin handover

pub mod contract;
pub mod error;
mod execute;
pub mod fee_manager;
pub mod hash;
pub mod msg;
mod query;
pub mod rate_limiter;
pub mod security;
pub mod state;
pub mod transport;
pub mod validator_quorum;

pub use crate::error::ContractError;
pub use crate::hash::{compute_packet_hash, compute_timeout_digest, compute_transfer_id};
pub use crate::transport::{router_identity, TransportKind};
