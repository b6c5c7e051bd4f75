//! Error types for the bridge router contract
//!
//! Every entry point returns `Result<Response, ContractError>`. Any error
//! reverts the whole transaction, sub-messages included.

use cosmwasm_std::{OverflowError, StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Unauthorized: only admin can perform this action")]
    Unauthorized,

    #[error("Unauthorized: caller is not the relayer for transport {transport_id}")]
    UnauthorizedRelayer { transport_id: String },

    #[error("Unauthorized: only pending admin can accept")]
    UnauthorizedPendingAdmin,

    #[error("No pending admin change")]
    NoPendingAdmin,

    #[error("Timelock not expired: {remaining_seconds} seconds remaining")]
    TimelockNotExpired { remaining_seconds: u64 },

    // ========================================================================
    // Gating Errors
    // ========================================================================

    #[error("Bridge is paused")]
    BridgePaused,

    #[error("Emergency mode is active: new transfers are halted")]
    EmergencyPaused,

    #[error("Protocol inactive: {transport_id}")]
    ProtocolInactive { transport_id: String },

    // ========================================================================
    // Validation Errors
    // ========================================================================

    #[error("Validation failed: {reason}")]
    ValidationFailed { reason: String },

    // ========================================================================
    // Rate / Volume Errors
    // ========================================================================

    #[error("Rate limit exceeded: {scope} cap is {cap}, consumed {consumed}, requested {requested}")]
    RateExceeded {
        scope: String,
        cap: Uint128,
        consumed: Uint128,
        requested: Uint128,
    },

    #[error("Daily cap exceeded: cap is {cap}, used {used}, requested {requested}")]
    DailyCapExceeded {
        cap: Uint128,
        used: Uint128,
        requested: Uint128,
    },

    // ========================================================================
    // Delivery Errors
    // ========================================================================

    #[error("Replay detected: transfer {transfer_id} already processed")]
    ReplayDetected { transfer_id: String },

    #[error("Untrusted sender for transport {transport_id} from chain {source_chain}")]
    UntrustedSender {
        transport_id: String,
        source_chain: u64,
    },

    #[error("Insufficient escrow: available {available}, requested {requested}")]
    InsufficientEscrow {
        available: Uint128,
        requested: Uint128,
    },

    // ========================================================================
    // Validator Quorum Errors
    // ========================================================================

    #[error("Insufficient signatures: got {got}, need {required}")]
    InsufficientSignatures { got: u32, required: u32 },

    #[error("Insufficient valid signatures: got {valid}, need {required}")]
    InsufficientValidSignatures { valid: u32, required: u32 },

    #[error("Insufficient validators: got {got}, minimum is {minimum}")]
    InsufficientValidators { got: u32, minimum: u32 },

    #[error("Packet timed out at {timeout}, now {now}")]
    PacketTimeout { timeout: u64, now: u64 },
}

impl ContractError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ContractError::ValidationFailed {
            reason: reason.into(),
        }
    }
}
