//! Gateway commitment transport.
//!
//! The gateway approves a commitment binding source chain, source sender and
//! the transfer fields. The destination recomputes it from the route's
//! trusted sender, so a gateway can't redirect a transfer to another
//! recipient or amount.

use cosmwasm_std::{Api, Binary};

use super::{Envelope, SendContext, SenderProof, TransferBody, TransportAdapter, TransportKind};
use crate::error::ContractError;
use crate::hash::compute_gateway_commitment;

pub struct GatewayCommitmentAdapter;

impl TransportAdapter for GatewayCommitmentAdapter {
    fn kind(&self) -> TransportKind {
        TransportKind::GatewayCommitment
    }

    fn send(&self, ctx: &SendContext) -> Result<Envelope, ContractError> {
        let transfer = ctx.transfer;
        let commitment = compute_gateway_commitment(
            transfer.source_chain,
            &ctx.router_identity,
            transfer.transfer_id.as_slice(),
            &transfer.recipient,
            transfer.amount.u128(),
        );

        Ok(Envelope::GatewayCommitment {
            source_address: Binary::from(ctx.router_identity.to_vec()),
            commitment: Binary::from(commitment.to_vec()),
            transfer: TransferBody::from_transfer(transfer),
        })
    }

    fn verify_sender(&self, _api: &dyn Api, proof: &SenderProof) -> bool {
        let expected = compute_gateway_commitment(
            proof.source_chain,
            proof.trusted_sender,
            proof.transfer_id,
            proof.recipient,
            proof.amount.u128(),
        );
        proof.proof == expected.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::mock_dependencies;
    use cosmwasm_std::Uint128;

    #[test]
    fn test_commitment_binds_amount() {
        let deps = mock_dependencies();
        let trusted = [0x42; 32];
        let transfer_id = [0x11; 32];
        let commitment =
            compute_gateway_commitment(56, &trusted, &transfer_id, "terra1recipient", 100);

        let mut proof = SenderProof {
            source_chain: 56,
            trusted_sender: &trusted,
            proof: &commitment,
            transfer_id: &transfer_id,
            recipient: "terra1recipient",
            amount: Uint128::new(100),
            quorum_verified: false,
        };
        assert!(GatewayCommitmentAdapter.verify_sender(&deps.api, &proof));

        proof.amount = Uint128::new(101);
        assert!(!GatewayCommitmentAdapter.verify_sender(&deps.api, &proof));
    }
}
