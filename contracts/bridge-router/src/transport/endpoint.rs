//! Endpoint relay transport.
//!
//! A messaging endpoint delivers the remote application's address next to
//! the payload; the router trusts it because only the registered endpoint
//! account may call `DeliverTransfer` for this transport.

use cosmwasm_std::{Api, Binary};

use super::{Envelope, SendContext, SenderProof, TransferBody, TransportAdapter, TransportKind};
use crate::error::ContractError;

pub struct EndpointRelayAdapter;

impl TransportAdapter for EndpointRelayAdapter {
    fn kind(&self) -> TransportKind {
        TransportKind::EndpointRelay
    }

    fn send(&self, ctx: &SendContext) -> Result<Envelope, ContractError> {
        Ok(Envelope::EndpointRelay {
            sender: Binary::from(ctx.router_identity.to_vec()),
            transfer: TransferBody::from_transfer(ctx.transfer),
            adapter_params: ctx.extra_data.cloned(),
        })
    }

    fn verify_sender(&self, _api: &dyn Api, proof: &SenderProof) -> bool {
        proof.proof.len() == 32 && proof.proof == proof.trusted_sender
    }
}
