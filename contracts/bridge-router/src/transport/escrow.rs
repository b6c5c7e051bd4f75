//! Attested escrow transport (lock-and-mint).
//!
//! Sending escrows tokens in the router. A release on the destination must
//! carry a 64-byte secp256k1 signature, by the attester key configured as
//! the route's trusted sender, over the EIP-191 hash of the escrow digest.

use cosmwasm_std::{Api, Binary};

use super::{
    Envelope, SendContext, SenderProof, Settlement, TransferBody, TransportAdapter, TransportKind,
};
use crate::error::ContractError;
use crate::hash::compute_escrow_digest;

pub struct AttestedEscrowAdapter;

impl TransportAdapter for AttestedEscrowAdapter {
    fn kind(&self) -> TransportKind {
        TransportKind::AttestedEscrow
    }

    fn settlement(&self) -> Settlement {
        Settlement::LockRelease
    }

    /// Attester key, 33-byte compressed secp256k1
    fn validate_trusted_sender(&self, trusted_sender: &[u8]) -> Result<(), ContractError> {
        match trusted_sender {
            [0x02 | 0x03, rest @ ..] if rest.len() == 32 => Ok(()),
            _ => Err(ContractError::invalid(
                "attested_escrow trusted sender must be a compressed secp256k1 key",
            )),
        }
    }

    fn send(&self, ctx: &SendContext) -> Result<Envelope, ContractError> {
        let transfer = ctx.transfer;
        let digest = compute_escrow_digest(
            transfer.source_chain,
            transfer.transfer_id.as_slice(),
            &transfer.recipient,
            transfer.amount.u128(),
        );

        Ok(Envelope::AttestedEscrow {
            escrow_digest: Binary::from(digest.to_vec()),
            transfer: TransferBody::from_transfer(transfer),
        })
    }

    fn verify_sender(&self, api: &dyn Api, proof: &SenderProof) -> bool {
        let digest = compute_escrow_digest(
            proof.source_chain,
            proof.transfer_id,
            proof.recipient,
            proof.amount.u128(),
        );
        let message_hash = common::eip191_hash(&digest);

        api.secp256k1_verify(&message_hash, proof.proof, proof.trusted_sender)
            .unwrap_or(false)
    }
}
