//! Inbound delivery handling.
//!
//! Every transport funnels into [`apply_delivery`], which runs in this order:
//! 1. pause / emergency gate
//! 2. transport active
//! 3. replay check against `PROCESSED_TRANSFERS`
//! 4. route lookup and variant-specific sender verification
//! 5. mint, or release escrow
//! 6. mark processed
//!
//! A replayed delivery fails before any state is read beyond the processed
//! set, so retries by at-least-once relayers are harmless.

use cosmwasm_std::{
    to_json_binary, Binary, DepsMut, Env, Event, MessageInfo, Response, Uint128, WasmMsg,
};
use cw20::Cw20ExecuteMsg;

use crate::error::ContractError;
use crate::security::ensure_transfers_allowed;
use crate::state::{
    ProcessedTransfer, CONFIG, ESCROW_BALANCES, PROCESSED_TRANSFERS, ROUTES, STATS,
};
use crate::transport::{
    adapter_for, load_active_transport, load_transport, SenderProof, Settlement,
};

/// A delivery as presented by a relayer or a verified packet
pub(crate) struct Delivery<'a> {
    pub transport_id: &'a str,
    pub source_chain: u64,
    pub sender_proof: &'a [u8],
    pub recipient: &'a str,
    pub amount: Uint128,
    pub transfer_id: &'a [u8],
    pub quorum_verified: bool,
}

/// Relay entry point for endpoint, gateway and attested-escrow transports.
#[allow(clippy::too_many_arguments)]
pub fn execute_deliver_transfer(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    transport_id: String,
    source_chain: u64,
    sender_proof: Binary,
    recipient: String,
    amount: Uint128,
    transfer_id: Binary,
) -> Result<Response, ContractError> {
    let transport = load_transport(deps.storage, &transport_id)?;
    if !adapter_for(transport.kind).requires_relayer() {
        return Err(ContractError::invalid(format!(
            "{} deliveries must go through HandlePacket",
            transport.kind.as_str()
        )));
    }
    if info.sender != transport.relayer {
        return Err(ContractError::UnauthorizedRelayer { transport_id });
    }

    let (response, _) = apply_delivery(
        deps,
        &env,
        Delivery {
            transport_id: &transport_id,
            source_chain,
            sender_proof: sender_proof.as_slice(),
            recipient: &recipient,
            amount,
            transfer_id: transfer_id.as_slice(),
            quorum_verified: false,
        },
    )?;

    Ok(response.add_attribute("method", "deliver_transfer"))
}

/// Apply a delivery. Returns the response and the 32-byte transfer id.
pub(crate) fn apply_delivery(
    deps: DepsMut,
    env: &Env,
    delivery: Delivery,
) -> Result<(Response, [u8; 32]), ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_transfers_allowed(&deps.querier, &config)?;

    let transport = load_active_transport(deps.storage, delivery.transport_id)?;

    let transfer_id: [u8; 32] = delivery
        .transfer_id
        .try_into()
        .map_err(|_| ContractError::invalid("transfer id must be 32 bytes"))?;
    let transfer_id_hex = common::bytes32_to_hex(&transfer_id);

    let processed_key = (
        delivery.transport_id,
        delivery.source_chain,
        transfer_id.as_slice(),
    );
    if PROCESSED_TRANSFERS.has(deps.storage, processed_key) {
        return Err(ContractError::ReplayDetected {
            transfer_id: transfer_id_hex,
        });
    }

    if delivery.source_chain == config.this_chain_id {
        return Err(ContractError::invalid("source chain is this chain"));
    }
    if delivery.amount.is_zero() {
        return Err(ContractError::invalid("amount must be positive"));
    }
    let recipient = deps.api.addr_validate(delivery.recipient)?;

    let untrusted = || ContractError::UntrustedSender {
        transport_id: delivery.transport_id.to_string(),
        source_chain: delivery.source_chain,
    };
    let route = ROUTES
        .may_load(deps.storage, (delivery.transport_id, delivery.source_chain))?
        .filter(|route| route.enabled)
        .ok_or_else(untrusted)?;

    let adapter = adapter_for(transport.kind);
    let verified = adapter.verify_sender(
        deps.api,
        &SenderProof {
            source_chain: delivery.source_chain,
            trusted_sender: route.trusted_sender.as_slice(),
            proof: delivery.sender_proof,
            transfer_id: &transfer_id,
            recipient: delivery.recipient,
            amount: delivery.amount,
            quorum_verified: delivery.quorum_verified,
        },
    );
    if !verified {
        return Err(untrusted());
    }

    let token_msg = match adapter.settlement() {
        Settlement::BurnMint => Cw20ExecuteMsg::Mint {
            recipient: recipient.to_string(),
            amount: delivery.amount,
        },
        Settlement::LockRelease => {
            let available = ESCROW_BALANCES
                .may_load(deps.storage, delivery.transport_id)?
                .unwrap_or_default();
            if available < delivery.amount {
                return Err(ContractError::InsufficientEscrow {
                    available,
                    requested: delivery.amount,
                });
            }
            ESCROW_BALANCES.save(
                deps.storage,
                delivery.transport_id,
                &(available - delivery.amount),
            )?;
            Cw20ExecuteMsg::Transfer {
                recipient: recipient.to_string(),
                amount: delivery.amount,
            }
        }
    };

    PROCESSED_TRANSFERS.save(
        deps.storage,
        processed_key,
        &ProcessedTransfer {
            recipient: recipient.clone(),
            amount: delivery.amount,
            processed_at: env.block.time,
        },
    )?;
    STATS.update(deps.storage, |mut stats| -> Result<_, ContractError> {
        stats.total_incoming_txs += 1;
        Ok(stats)
    })?;

    let event = Event::new("transfer_completed")
        .add_attribute("transfer_id", &transfer_id_hex)
        .add_attribute("transport_id", delivery.transport_id)
        .add_attribute("kind", transport.kind.as_str())
        .add_attribute("source_chain", delivery.source_chain.to_string())
        .add_attribute("recipient", recipient.as_str())
        .add_attribute("amount", delivery.amount);

    let response = Response::new()
        .add_message(WasmMsg::Execute {
            contract_addr: config.token.to_string(),
            msg: to_json_binary(&token_msg)?,
            funds: vec![],
        })
        .add_event(event)
        .add_attribute("transfer_id", transfer_id_hex);

    Ok((response, transfer_id))
}
