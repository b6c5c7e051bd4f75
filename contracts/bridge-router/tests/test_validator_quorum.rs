//! Validator Quorum Integration Tests.
//!
//! Packets from `REMOTE_CHAIN` are signed by 21 validators with a threshold
//! of 14. Covers delivery, replay, signature counting, packet timeouts,
//! validator set rules and refunds of timed-out outbound packets.

mod helpers;

use cosmwasm_std::{Addr, Binary, HexBinary, Uint128};

use bridge_router::msg::{
    ComputeHashResponse, ExecuteMsg, PacketSignersResponse, QueryMsg, StatsResponse,
};
use bridge_router::state::OutboundTransfer;
use bridge_router::transport::Envelope;
use bridge_router::validator_quorum::ValidatorSet;
use bridge_router::{compute_packet_hash, compute_timeout_digest};
use helpers::*;

const RECIPIENT: &str = "terra1recipient";

fn handle_packet(
    env: &mut TestEnv,
    packet: &bridge_router::msg::Packet,
    signatures: Vec<Binary>,
) -> Result<cw_multi_test::AppResponse, String> {
    let anyone = Addr::unchecked("terra1anyone");
    exec_as(
        env,
        &anyone,
        &ExecuteMsg::HandlePacket {
            transport_id: QUORUM.to_string(),
            packet: packet.clone(),
            signatures,
        },
        &[],
    )
}

// ============================================================================
// Delivery
// ============================================================================

#[test]
fn test_packet_with_quorum_is_delivered() {
    let mut env = setup();
    let recipient = Addr::unchecked(RECIPIENT);
    let timeout = now(&env) + 600;
    let packet = inbound_packet(1, [0x21; 32], RECIPIENT, 750_000, timeout);
    let hash = compute_packet_hash(&packet);

    let signatures = quorum_signatures(&env, &hash, 14);
    let res = handle_packet(&mut env, &packet, signatures).unwrap();
    assert_eq!(count_events(&res, "transfer_completed"), 1);
    assert_eq!(attr(&res, "signers").as_deref(), Some("14"));
    assert_eq!(token_balance(&env, &recipient), 750_000);

    let signers: PacketSignersResponse = query(
        &env,
        &QueryMsg::PacketSigners {
            packet_hash: Binary::from(hash.to_vec()),
        },
    );
    assert_eq!(signers.signers.len(), 14);
    let expected = eth_address(&env.validators[0]);
    assert!(signers.signers.contains(&expected));

    // Query computes the same hash the validators signed
    let computed: ComputeHashResponse = query(
        &env,
        &QueryMsg::ComputePacketHash {
            packet: packet.clone(),
        },
    );
    assert_eq!(computed.hash.as_slice(), hash.as_slice());
}

#[test]
fn test_resubmitted_packet_is_replay() {
    let mut env = setup();
    let recipient = Addr::unchecked(RECIPIENT);
    let timeout = now(&env) + 600;
    let packet = inbound_packet(1, [0x22; 32], RECIPIENT, 750_000, timeout);
    let hash = compute_packet_hash(&packet);

    let signatures = quorum_signatures(&env, &hash, 14);
    handle_packet(&mut env, &packet, signatures).unwrap();

    // Even with every validator signing, the same transfer is not applied twice
    let signatures = quorum_signatures(&env, &hash, 21);
    let err = handle_packet(&mut env, &packet, signatures).unwrap_err();
    assert!(err.contains("Replay detected"), "got: {}", err);
    assert_eq!(token_balance(&env, &recipient), 750_000);

    let stats: StatsResponse = query(&env, &QueryMsg::Stats {});
    assert_eq!(stats.total_incoming_txs, 1);
}

#[test]
fn test_too_few_signatures_are_rejected() {
    let mut env = setup();
    let timeout = now(&env) + 600;
    let packet = inbound_packet(2, [0x23; 32], RECIPIENT, 1_000, timeout);
    let hash = compute_packet_hash(&packet);

    let signatures = quorum_signatures(&env, &hash, 13);
    let err = handle_packet(&mut env, &packet, signatures).unwrap_err();
    assert!(err.contains("Insufficient signatures"), "got: {}", err);
}

#[test]
fn test_invalid_signatures_do_not_count() {
    let mut env = setup();
    let timeout = now(&env) + 600;
    let packet = inbound_packet(3, [0x24; 32], RECIPIENT, 1_000, timeout);
    let hash = compute_packet_hash(&packet);

    // 13 validators plus one outsider
    let mut signatures = quorum_signatures(&env, &hash, 13);
    signatures.push(sign_eth(&key(200), &hash));
    let err = handle_packet(&mut env, &packet, signatures).unwrap_err();
    assert!(err.contains("Insufficient valid signatures"), "got: {}", err);

    // 13 validators, one of them twice
    let mut signatures = quorum_signatures(&env, &hash, 13);
    signatures.push(signatures[0].clone());
    let err = handle_packet(&mut env, &packet, signatures).unwrap_err();
    assert!(err.contains("Insufficient valid signatures"), "got: {}", err);

    // Garbage is skipped, 14 real signatures still make it
    let mut signatures = quorum_signatures(&env, &hash, 14);
    signatures.push(Binary::from(vec![0u8; 65]));
    handle_packet(&mut env, &packet, signatures).unwrap();
}

#[test]
fn test_signatures_over_other_packet_do_not_count() {
    let mut env = setup();
    let timeout = now(&env) + 600;
    let packet = inbound_packet(4, [0x25; 32], RECIPIENT, 1_000, timeout);

    // Signed with a smaller amount
    let signed = inbound_packet(4, [0x25; 32], RECIPIENT, 1, timeout);
    let signatures = quorum_signatures(&env, &compute_packet_hash(&signed), 21);
    let err = handle_packet(&mut env, &packet, signatures).unwrap_err();
    assert!(err.contains("Insufficient valid signatures"), "got: {}", err);
}

#[test]
fn test_packet_from_untrusted_router_is_rejected() {
    let mut env = setup();
    let timeout = now(&env) + 600;
    let mut packet = inbound_packet(5, [0x26; 32], RECIPIENT, 1_000, timeout);
    packet.sender = Binary::from(vec![0x01; 32]);
    let hash = compute_packet_hash(&packet);

    let signatures = quorum_signatures(&env, &hash, 14);
    let err = handle_packet(&mut env, &packet, signatures).unwrap_err();
    assert!(err.contains("Untrusted sender"), "got: {}", err);
}

#[test]
fn test_expired_packet_is_rejected() {
    let mut env = setup();
    let timeout = now(&env) + 600;
    let packet = inbound_packet(6, [0x27; 32], RECIPIENT, 1_000, timeout);
    let hash = compute_packet_hash(&packet);
    let signatures = quorum_signatures(&env, &hash, 14);
    advance(&mut env, 601);
    let err = handle_packet(&mut env, &packet, signatures).unwrap_err();
    assert!(err.contains("Packet timed out"), "got: {}", err);
}

#[test]
fn test_packet_for_other_chain_is_rejected() {
    let mut env = setup();
    let timeout = now(&env) + 600;
    let mut packet = inbound_packet(7, [0x28; 32], RECIPIENT, 1_000, timeout);
    packet.dest_chain = 97;
    let hash = compute_packet_hash(&packet);

    let signatures = quorum_signatures(&env, &hash, 14);
    let err = handle_packet(&mut env, &packet, signatures).unwrap_err();
    assert!(err.contains("packet is for chain 97"), "got: {}", err);
}

// ============================================================================
// Validator Set Rules
// ============================================================================

#[test]
fn test_validator_set_rules() {
    let mut env = setup();
    let addresses: Vec<HexBinary> = (0..21).map(|i| eth_address(&key(i))).collect();

    // Below the minimum set size
    let err = admin_exec(
        &mut env,
        &ExecuteMsg::SetValidatorSet {
            transport_id: QUORUM.to_string(),
            validators: addresses[..20].to_vec(),
            threshold: 14,
        },
    )
    .unwrap_err();
    assert!(err.contains("Insufficient validators"), "got: {}", err);

    // Threshold below two thirds
    let err = admin_exec(
        &mut env,
        &ExecuteMsg::SetValidatorSet {
            transport_id: QUORUM.to_string(),
            validators: addresses.clone(),
            threshold: 13,
        },
    )
    .unwrap_err();
    assert!(err.contains("two thirds"), "got: {}", err);

    // Duplicate validator
    let mut duplicated = addresses.clone();
    duplicated.push(addresses[0].clone());
    let err = admin_exec(
        &mut env,
        &ExecuteMsg::SetValidatorSet {
            transport_id: QUORUM.to_string(),
            validators: duplicated,
            threshold: 15,
        },
    )
    .unwrap_err();
    assert!(err.contains("duplicate"), "got: {}", err);

    // Only validator-quorum transports carry a set
    let err = admin_exec(
        &mut env,
        &ExecuteMsg::SetValidatorSet {
            transport_id: ENDPOINT.to_string(),
            validators: addresses.clone(),
            threshold: 14,
        },
    )
    .unwrap_err();
    assert!(err.contains("validator_quorum"), "got: {}", err);

    // Raising the threshold takes effect immediately
    admin_exec(
        &mut env,
        &ExecuteMsg::SetValidatorSet {
            transport_id: QUORUM.to_string(),
            validators: addresses,
            threshold: 16,
        },
    )
    .unwrap();
    let set: Option<ValidatorSet> = query(
        &env,
        &QueryMsg::ValidatorSet {
            transport_id: QUORUM.to_string(),
        },
    );
    assert_eq!(set.unwrap().threshold, 16);

    let timeout = now(&env) + 600;
    let packet = inbound_packet(8, [0x29; 32], RECIPIENT, 1_000, timeout);
    let hash = compute_packet_hash(&packet);
    let signatures = quorum_signatures(&env, &hash, 15);
    let err = handle_packet(&mut env, &packet, signatures).unwrap_err();
    assert!(err.contains("Insufficient signatures"), "got: {}", err);
    let signatures = quorum_signatures(&env, &hash, 16);
    handle_packet(&mut env, &packet, signatures).unwrap();
}

// ============================================================================
// Outbound Packets & Timeout Refunds
// ============================================================================

#[test]
fn test_outbound_packet_carries_timeout() {
    let mut env = setup();
    let sent_at = now(&env);

    let res = bridge(&mut env, QUORUM, 300_000, 0).unwrap();
    let transfer_id = receipt(&res).transfer_id;

    let envelope: Envelope = cosmwasm_std::from_json(
        Binary::from_base64(&attr(&res, "envelope").unwrap()).unwrap(),
    )
    .unwrap();
    let packet = match envelope {
        Envelope::ValidatorQuorum { packet } => packet,
        other => panic!("unexpected envelope {:?}", other),
    };
    assert_eq!(packet.sequence, 0);
    assert_eq!(packet.source_chain, THIS_CHAIN);
    assert_eq!(packet.dest_chain, REMOTE_CHAIN);
    assert_eq!(packet.timeout_timestamp, sent_at + PACKET_TIMEOUT);
    assert_eq!(packet.data.transfer_id, transfer_id);
    assert_eq!(packet.data.amount, Uint128::new(300_000));
    assert_eq!(
        packet.sender.as_slice(),
        bridge_router::router_identity(env.router.as_str()).as_slice()
    );

    let transfer: Option<OutboundTransfer> =
        query(&env, &QueryMsg::OutboundTransfer { transfer_id });
    assert_eq!(transfer.unwrap().timeout_at, Some(sent_at + PACKET_TIMEOUT));
}

#[test]
fn test_timed_out_transfer_is_refunded_once() {
    let mut env = setup();
    let supply_before = total_supply(&env);

    let res = bridge(&mut env, QUORUM, 300_000, 0).unwrap();
    let transfer_id = receipt(&res).transfer_id;
    assert_eq!(total_supply(&env), supply_before - 300_000);

    let digest = compute_timeout_digest(transfer_id.as_slice());
    let refund = |env: &mut TestEnv, signatures: Vec<Binary>| {
        let anyone = Addr::unchecked("terra1anyone");
        exec_as(
            env,
            &anyone,
            &ExecuteMsg::RefundTimedOut {
                transfer_id: transfer_id.clone(),
                signatures,
            },
            &[],
        )
    };

    // Not timed out yet
    let signatures = quorum_signatures(&env, &digest, 14);
    let err = refund(&mut env, signatures.clone()).unwrap_err();
    assert!(err.contains("times out at"), "got: {}", err);

    advance(&mut env, PACKET_TIMEOUT + 1);

    let too_few = quorum_signatures(&env, &digest, 13);
    let err = refund(&mut env, too_few).unwrap_err();
    assert!(err.contains("Insufficient signatures"), "got: {}", err);

    let res = refund(&mut env, signatures.clone()).unwrap();
    assert_eq!(count_events(&res, "transfer_refunded"), 1);
    assert_eq!(token_balance(&env, &env.user), USER_TOKENS);
    assert_eq!(total_supply(&env), supply_before);

    let err = refund(&mut env, signatures).unwrap_err();
    assert!(err.contains("Replay detected"), "got: {}", err);

    let transfer: Option<OutboundTransfer> = query(
        &env,
        &QueryMsg::OutboundTransfer {
            transfer_id: transfer_id.clone(),
        },
    );
    assert!(transfer.unwrap().refunded);
    let stats: StatsResponse = query(&env, &QueryMsg::Stats {});
    assert_eq!(stats.total_refunds, 1);
}

#[test]
fn test_only_packet_transfers_can_time_out() {
    let mut env = setup();
    let res = bridge(&mut env, ENDPOINT, 300_000, 0).unwrap();
    let transfer_id = receipt(&res).transfer_id;
    advance(&mut env, PACKET_TIMEOUT + 1);

    let digest = compute_timeout_digest(transfer_id.as_slice());
    let signatures = quorum_signatures(&env, &digest, 14);
    let anyone = Addr::unchecked("terra1anyone");
    let err = exec_as(
        &mut env,
        &anyone,
        &ExecuteMsg::RefundTimedOut {
            transfer_id,
            signatures,
        },
        &[],
    )
    .unwrap_err();
    assert!(err.contains("validator_quorum"), "got: {}", err);
}
