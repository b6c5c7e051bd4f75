//! Outgoing transfer handler.
//!
//! `Bridge` runs every gate before touching the caller's tokens:
//! pause and emergency, amount and recipient, route, fee payment, rate
//! windows and the daily cap. Only then are tokens burned (or escrowed) and
//! the transport's envelope emitted.

use cosmwasm_std::{
    to_json_binary, BankMsg, Binary, Coin, CosmosMsg, DepsMut, Env, Event, MessageInfo,
    Response, Uint128, WasmMsg,
};
use cw20::Cw20ExecuteMsg;

use crate::error::ContractError;
use crate::fee_manager;
use crate::hash::compute_transfer_id;
use crate::msg::BridgeReceipt;
use crate::rate_limiter;
use crate::security::{check_daily_cap, ensure_transfers_allowed};
use crate::state::{
    Config, OutboundTransfer, CONFIG, ESCROW_BALANCES, MAX_RECIPIENT_LEN, OUTBOUND_TRANSFERS,
    OUTGOING_NONCE, STATS,
};
use crate::transport::{
    adapter_for, load_active_transport, router_identity, SendContext, Settlement,
};

/// Send `amount` to `recipient` on `dest_chain` through `transport_id`.
#[allow(clippy::too_many_arguments)]
pub fn execute_bridge(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    transport_id: String,
    dest_chain: u64,
    recipient: String,
    amount: Uint128,
    extra_data: Option<Binary>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_transfers_allowed(&deps.querier, &config)?;

    validate_amount(&config, amount)?;
    validate_recipient(&recipient)?;
    if dest_chain == config.this_chain_id {
        return Err(ContractError::invalid("destination is this chain"));
    }

    let transport = load_active_transport(deps.storage, &transport_id)?;
    let adapter = adapter_for(transport.kind);
    if !adapter.is_supported(deps.storage, &transport_id, dest_chain)? {
        return Err(ContractError::invalid(format!(
            "transport {} has no route to chain {}",
            transport_id, dest_chain
        )));
    }

    let now = env.block.time.seconds();
    let sender = info.sender.clone();

    // Fee
    let quote = fee_manager::estimate(
        deps.storage,
        &transport_id,
        dest_chain,
        amount,
        Some(&sender),
    )?;
    let paid = fee_payment(&config, &info.funds)?;
    if paid < quote.total_fee {
        return Err(ContractError::invalid(format!(
            "insufficient fee: paid {}{}, required {}{}",
            paid, config.fee_denom, quote.total_fee, config.fee_denom
        )));
    }
    let excess = paid - quote.total_fee;

    // Gates
    rate_limiter::consume(deps.storage, &sender, &transport_id, amount, now)?;
    check_daily_cap(deps.storage, amount, now)?;

    // Record
    let nonce = OUTGOING_NONCE.may_load(deps.storage)?.unwrap_or(0);
    OUTGOING_NONCE.save(deps.storage, &(nonce + 1))?;

    let transfer_id = compute_transfer_id(
        config.this_chain_id,
        dest_chain,
        &transport_id,
        nonce,
        sender.as_str(),
        &recipient,
        amount.u128(),
    );
    if OUTBOUND_TRANSFERS.has(deps.storage, &transfer_id) {
        return Err(ContractError::invalid("transfer id collision"));
    }

    let settlement = adapter.settlement();
    let mut transfer = OutboundTransfer {
        transfer_id: Binary::from(transfer_id.to_vec()),
        transport_id: transport_id.clone(),
        source_chain: config.this_chain_id,
        dest_chain,
        sender: sender.clone(),
        recipient: recipient.clone(),
        amount,
        nonce,
        created_at: env.block.time,
        timeout_at: None,
        settlement,
        refunded: false,
    };

    let envelope = adapter.send(&SendContext {
        transport: &transport,
        transfer: &transfer,
        router_identity: router_identity(env.contract.address.as_str()),
        now,
        extra_data: extra_data.as_ref(),
    })?;
    transfer.timeout_at = envelope.timeout_at();
    OUTBOUND_TRANSFERS.save(deps.storage, &transfer_id, &transfer)?;

    // Settle the caller's tokens
    let mut messages: Vec<CosmosMsg> = Vec::new();
    let token_msg = match settlement {
        Settlement::BurnMint => Cw20ExecuteMsg::BurnFrom {
            owner: sender.to_string(),
            amount,
        },
        Settlement::LockRelease => {
            ESCROW_BALANCES.update(
                deps.storage,
                &transport_id,
                |balance| -> Result<_, ContractError> {
                    Ok(balance.unwrap_or_default().checked_add(amount)?)
                },
            )?;
            Cw20ExecuteMsg::TransferFrom {
                owner: sender.to_string(),
                recipient: env.contract.address.to_string(),
                amount,
            }
        }
    };
    messages.push(
        WasmMsg::Execute {
            contract_addr: config.token.to_string(),
            msg: to_json_binary(&token_msg)?,
            funds: vec![],
        }
        .into(),
    );

    // Route the fee and refund any excess
    if !quote.total_fee.is_zero() {
        messages.push(
            BankMsg::Send {
                to_address: config.fee_collector.to_string(),
                amount: vec![Coin::new(quote.total_fee.u128(), &config.fee_denom)],
            }
            .into(),
        );
    }
    if !excess.is_zero() {
        messages.push(
            BankMsg::Send {
                to_address: sender.to_string(),
                amount: vec![Coin::new(excess.u128(), &config.fee_denom)],
            }
            .into(),
        );
    }

    fee_manager::record_volume(deps.storage, &sender, amount)?;
    STATS.update(deps.storage, |mut stats| -> Result<_, ContractError> {
        stats.total_outgoing_txs += 1;
        stats.total_fees_collected = stats.total_fees_collected.checked_add(quote.total_fee)?;
        Ok(stats)
    })?;

    let transfer_id_hex = common::bytes32_to_hex(&transfer_id);
    let event = Event::new("transfer_initiated")
        .add_attribute("transfer_id", &transfer_id_hex)
        .add_attribute("transport_id", &transport_id)
        .add_attribute("kind", transport.kind.as_str())
        .add_attribute("nonce", nonce.to_string())
        .add_attribute("source_chain", config.this_chain_id.to_string())
        .add_attribute("dest_chain", dest_chain.to_string())
        .add_attribute("sender", sender.as_str())
        .add_attribute("recipient", &recipient)
        .add_attribute("amount", amount)
        .add_attribute("fee", quote.total_fee)
        .add_attribute("envelope", to_json_binary(&envelope)?.to_base64());

    let receipt = BridgeReceipt {
        transfer_id: transfer.transfer_id,
        nonce,
        fee: quote,
    };

    Ok(Response::new()
        .add_messages(messages)
        .add_event(event)
        .add_attribute("method", "bridge")
        .add_attribute("transfer_id", transfer_id_hex)
        .set_data(to_json_binary(&receipt)?))
}

fn validate_amount(config: &Config, amount: Uint128) -> Result<(), ContractError> {
    if amount.is_zero() {
        return Err(ContractError::invalid("amount must be positive"));
    }
    if amount < config.min_bridge_amount {
        return Err(ContractError::invalid(format!(
            "amount {} below minimum {}",
            amount, config.min_bridge_amount
        )));
    }
    if amount > config.max_bridge_amount {
        return Err(ContractError::invalid(format!(
            "amount {} above maximum {}",
            amount, config.max_bridge_amount
        )));
    }
    Ok(())
}

/// Destination recipients are opaque here; only their shape is checked.
pub(crate) fn validate_recipient(recipient: &str) -> Result<(), ContractError> {
    if recipient.is_empty() {
        return Err(ContractError::invalid("recipient is empty"));
    }
    if recipient.len() > MAX_RECIPIENT_LEN {
        return Err(ContractError::invalid(format!(
            "recipient longer than {} bytes",
            MAX_RECIPIENT_LEN
        )));
    }
    if recipient.chars().any(char::is_whitespace) {
        return Err(ContractError::invalid("recipient contains whitespace"));
    }
    Ok(())
}

/// Amount of `fee_denom` attached; any other denom is rejected.
fn fee_payment(config: &Config, funds: &[Coin]) -> Result<Uint128, ContractError> {
    let mut paid = Uint128::zero();
    for coin in funds {
        if coin.denom != config.fee_denom {
            return Err(ContractError::invalid(format!(
                "unexpected fee denom {}, fees are paid in {}",
                coin.denom, config.fee_denom
            )));
        }
        paid = paid.checked_add(coin.amount)?;
    }
    Ok(paid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_recipient() {
        assert!(validate_recipient("0x742d35Cc6634C0532925a3b844Bc454e4438f44e").is_ok());
        assert!(validate_recipient("").is_err());
        assert!(validate_recipient("terra1 abc").is_err());
        assert!(validate_recipient(&"a".repeat(MAX_RECIPIENT_LEN + 1)).is_err());
        assert!(validate_recipient(&"a".repeat(MAX_RECIPIENT_LEN)).is_ok());
    }
}
