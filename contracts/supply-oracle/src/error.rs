//! Error types for the supply oracle contract

use cosmwasm_std::{OverflowError, StdError};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("Unauthorized: only admin can perform this action")]
    Unauthorized,

    #[error("Unauthorized: {address} is not a reporter")]
    NotReporter { address: String },

    #[error("Validation failed: {reason}")]
    ValidationFailed { reason: String },
}

impl ContractError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ContractError::ValidationFailed {
            reason: reason.into(),
        }
    }
}
