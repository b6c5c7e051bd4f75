//! Validator-quorum transport.
//!
//! Deliveries only arrive through `HandlePacket`, after a threshold of the
//! validator set has signed the packet. The adapter itself checks that the
//! packet's sender is the route's trusted remote router.

use cosmwasm_std::{Api, Binary};

use super::{Envelope, SendContext, SenderProof, TransportAdapter, TransportKind};
use crate::error::ContractError;
use crate::msg::{Packet, PacketData};

pub struct ValidatorQuorumAdapter;

impl TransportAdapter for ValidatorQuorumAdapter {
    fn kind(&self) -> TransportKind {
        TransportKind::ValidatorQuorum
    }

    fn requires_relayer(&self) -> bool {
        false
    }

    fn send(&self, ctx: &SendContext) -> Result<Envelope, ContractError> {
        if ctx.transport.packet_timeout_seconds == 0 {
            return Err(ContractError::invalid(format!(
                "transport {} has no packet timeout configured",
                ctx.transport.transport_id
            )));
        }
        let timeout_timestamp = ctx
            .now
            .checked_add(ctx.transport.packet_timeout_seconds)
            .ok_or_else(|| {
                ContractError::invalid(format!(
                    "packet timeout of transport {} overflows",
                    ctx.transport.transport_id
                ))
            })?;
        let transfer = ctx.transfer;

        Ok(Envelope::ValidatorQuorum {
            packet: Packet {
                sequence: transfer.nonce,
                source_chain: transfer.source_chain,
                dest_chain: transfer.dest_chain,
                sender: Binary::from(ctx.router_identity.to_vec()),
                timeout_timestamp,
                data: PacketData {
                    transfer_id: transfer.transfer_id.clone(),
                    recipient: transfer.recipient.clone(),
                    amount: transfer.amount,
                },
            },
        })
    }

    fn verify_sender(&self, _api: &dyn Api, proof: &SenderProof) -> bool {
        proof.quorum_verified && proof.proof == proof.trusted_sender
    }
}
