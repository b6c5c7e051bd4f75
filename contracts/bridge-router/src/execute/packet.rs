//! Validator-quorum packet handlers.
//!
//! - `HandlePacket` delivers a packet signed by a quorum of the transport's
//!   validators, through the shared delivery routine.
//! - `RefundTimedOut` returns the tokens of an outbound packet that timed out,
//!   once a quorum attests it was never delivered.

use cosmwasm_std::{
    to_json_binary, Binary, DepsMut, Env, Event, MessageInfo, Response, Storage, WasmMsg,
};
use cw20::Cw20ExecuteMsg;

use super::receive::{apply_delivery, Delivery};
use crate::error::ContractError;
use crate::hash::{compute_packet_hash, compute_timeout_digest};
use crate::msg::Packet;
use crate::security::ensure_transfers_allowed;
use crate::state::{OutboundTransfer, CONFIG, OUTBOUND_TRANSFERS, STATS};
use crate::transport::{load_transport, Settlement, TransportKind};
use crate::validator_quorum::{
    check_signature_count, verify_quorum, ValidatorSet, PACKET_SIGNERS, VALIDATOR_SETS,
};

fn load_quorum_transport(
    storage: &dyn Storage,
    transport_id: &str,
) -> Result<ValidatorSet, ContractError> {
    let transport = load_transport(storage, transport_id)?;
    if transport.kind != TransportKind::ValidatorQuorum {
        return Err(ContractError::invalid(format!(
            "transport {} is not a validator_quorum transport",
            transport_id
        )));
    }
    VALIDATOR_SETS
        .may_load(storage, transport_id)?
        .ok_or_else(|| {
            ContractError::invalid(format!("transport {} has no validator set", transport_id))
        })
}

pub fn execute_handle_packet(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    transport_id: String,
    packet: Packet,
    signatures: Vec<Binary>,
) -> Result<Response, ContractError> {
    let set = load_quorum_transport(deps.storage, &transport_id)?;
    check_signature_count(&set, signatures.len())?;

    let now = env.block.time.seconds();
    if now > packet.timeout_timestamp {
        return Err(ContractError::PacketTimeout {
            timeout: packet.timeout_timestamp,
            now,
        });
    }

    let config = CONFIG.load(deps.storage)?;
    if packet.dest_chain != config.this_chain_id {
        return Err(ContractError::invalid(format!(
            "packet is for chain {}, this is chain {}",
            packet.dest_chain, config.this_chain_id
        )));
    }

    let packet_hash = compute_packet_hash(&packet);
    let signers = verify_quorum(deps.api, &set, &packet_hash, &signatures)?;
    let signer_count = signers.len();
    PACKET_SIGNERS.save(deps.storage, &packet_hash, &signers)?;

    let (response, _) = apply_delivery(
        deps,
        &env,
        Delivery {
            transport_id: &transport_id,
            source_chain: packet.source_chain,
            sender_proof: packet.sender.as_slice(),
            recipient: &packet.data.recipient,
            amount: packet.data.amount,
            transfer_id: packet.data.transfer_id.as_slice(),
            quorum_verified: true,
        },
    )?;

    Ok(response
        .add_attribute("method", "handle_packet")
        .add_attribute("sequence", packet.sequence.to_string())
        .add_attribute("packet_hash", common::bytes32_to_hex(&packet_hash))
        .add_attribute("signers", signer_count.to_string()))
}

pub fn execute_refund_timed_out(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    transfer_id: Binary,
    signatures: Vec<Binary>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_transfers_allowed(&deps.querier, &config)?;

    let mut transfer = OUTBOUND_TRANSFERS
        .may_load(deps.storage, transfer_id.as_slice())?
        .ok_or_else(|| ContractError::invalid("unknown transfer"))?;
    let transfer_id_hex = format!("0x{}", hex::encode(transfer_id.as_slice()));
    if transfer.refunded {
        return Err(ContractError::ReplayDetected {
            transfer_id: transfer_id_hex,
        });
    }

    let set = load_quorum_transport(deps.storage, &transfer.transport_id)?;

    let now = env.block.time.seconds();
    let timeout_at = transfer
        .timeout_at
        .ok_or_else(|| ContractError::invalid("transfer has no packet timeout"))?;
    if now <= timeout_at {
        return Err(ContractError::invalid(format!(
            "packet times out at {}, now {}",
            timeout_at, now
        )));
    }

    check_signature_count(&set, signatures.len())?;
    let digest = compute_timeout_digest(transfer_id.as_slice());
    let signers = verify_quorum(deps.api, &set, &digest, &signatures)?;

    let token_msg = refund_msg(&transfer)?;
    transfer.refunded = true;
    OUTBOUND_TRANSFERS.save(deps.storage, transfer_id.as_slice(), &transfer)?;
    STATS.update(deps.storage, |mut stats| -> Result<_, ContractError> {
        stats.total_refunds += 1;
        Ok(stats)
    })?;

    let event = Event::new("transfer_refunded")
        .add_attribute("transfer_id", &transfer_id_hex)
        .add_attribute("transport_id", &transfer.transport_id)
        .add_attribute("sender", transfer.sender.as_str())
        .add_attribute("amount", transfer.amount);

    Ok(Response::new()
        .add_message(WasmMsg::Execute {
            contract_addr: config.token.to_string(),
            msg: to_json_binary(&token_msg)?,
            funds: vec![],
        })
        .add_event(event)
        .add_attribute("method", "refund_timed_out")
        .add_attribute("transfer_id", transfer_id_hex)
        .add_attribute("signers", signers.len().to_string()))
}

/// Re-mint a timed-out transfer to its sender.
///
/// Only validator-quorum transfers carry a packet timeout, and that transport
/// always burns, so an escrowed transfer here means corrupted state.
fn refund_msg(transfer: &OutboundTransfer) -> Result<Cw20ExecuteMsg, ContractError> {
    if transfer.settlement != Settlement::BurnMint {
        return Err(ContractError::invalid(
            "only burn-settled transfers can time out",
        ));
    }
    Ok(Cw20ExecuteMsg::Mint {
        recipient: transfer.sender.to_string(),
        amount: transfer.amount,
    })
}
