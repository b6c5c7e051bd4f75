//! Hash computation for transfer ids, packets and sender proofs
//!
//! All variable-length fields are length-prefixed (u32 big-endian) and all
//! integers are big-endian, so off-chain relayers and signers can rebuild
//! every digest without sharing code with the contract.
//!
//! # Transfer id layout
//! - source_chain (u64)
//! - dest_chain (u64)
//! - transport_id (len-prefixed utf8)
//! - nonce (u64)
//! - sender (len-prefixed utf8)
//! - recipient (len-prefixed utf8)
//! - amount (u128)

use common::keccak256;

use crate::msg::Packet;

/// Domain tag for packet hashes
const PACKET_TAG: &[u8] = b"QUORUM_PACKET";

/// Domain tag for timeout attestations
const TIMEOUT_TAG: &[u8] = b"TIMEOUT";

/// Domain tag for escrow release attestations
const ESCROW_TAG: &[u8] = b"ESCROW_RELEASE";

fn push_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

/// Compute the id of a transfer initiated on `source_chain`.
pub fn compute_transfer_id(
    source_chain: u64,
    dest_chain: u64,
    transport_id: &str,
    nonce: u64,
    sender: &str,
    recipient: &str,
    amount: u128,
) -> [u8; 32] {
    let mut data = Vec::with_capacity(
        8 + 8 + 8 + 16 + 12 + transport_id.len() + sender.len() + recipient.len(),
    );
    data.extend_from_slice(&source_chain.to_be_bytes());
    data.extend_from_slice(&dest_chain.to_be_bytes());
    push_bytes(&mut data, transport_id.as_bytes());
    data.extend_from_slice(&nonce.to_be_bytes());
    push_bytes(&mut data, sender.as_bytes());
    push_bytes(&mut data, recipient.as_bytes());
    data.extend_from_slice(&amount.to_be_bytes());
    keccak256(&data)
}

/// Hash signed by validators for a validator-quorum packet.
pub fn compute_packet_hash(packet: &Packet) -> [u8; 32] {
    let mut data = Vec::with_capacity(256);
    data.extend_from_slice(PACKET_TAG);
    data.extend_from_slice(&packet.sequence.to_be_bytes());
    data.extend_from_slice(&packet.source_chain.to_be_bytes());
    data.extend_from_slice(&packet.dest_chain.to_be_bytes());
    push_bytes(&mut data, packet.sender.as_slice());
    data.extend_from_slice(&packet.timeout_timestamp.to_be_bytes());
    push_bytes(&mut data, packet.data.transfer_id.as_slice());
    push_bytes(&mut data, packet.data.recipient.as_bytes());
    data.extend_from_slice(&packet.data.amount.u128().to_be_bytes());
    keccak256(&data)
}

/// Digest validators sign to attest that a packet was never delivered.
pub fn compute_timeout_digest(transfer_id: &[u8]) -> [u8; 32] {
    let mut data = Vec::with_capacity(TIMEOUT_TAG.len() + transfer_id.len());
    data.extend_from_slice(TIMEOUT_TAG);
    data.extend_from_slice(transfer_id);
    keccak256(&data)
}

/// Commitment a gateway presents for a `GatewayCommitment` delivery.
pub fn compute_gateway_commitment(
    source_chain: u64,
    trusted_sender: &[u8],
    transfer_id: &[u8],
    recipient: &str,
    amount: u128,
) -> [u8; 32] {
    let mut data = Vec::with_capacity(128 + recipient.len());
    data.extend_from_slice(&source_chain.to_be_bytes());
    push_bytes(&mut data, trusted_sender);
    push_bytes(&mut data, transfer_id);
    push_bytes(&mut data, recipient.as_bytes());
    data.extend_from_slice(&amount.to_be_bytes());
    keccak256(&data)
}

/// Digest an attester signs to release escrow for an `AttestedEscrow` delivery.
pub fn compute_escrow_digest(
    source_chain: u64,
    transfer_id: &[u8],
    recipient: &str,
    amount: u128,
) -> [u8; 32] {
    let mut data = Vec::with_capacity(96 + recipient.len());
    data.extend_from_slice(ESCROW_TAG);
    data.extend_from_slice(&source_chain.to_be_bytes());
    push_bytes(&mut data, transfer_id);
    push_bytes(&mut data, recipient.as_bytes());
    data.extend_from_slice(&amount.to_be_bytes());
    keccak256(&data)
}

/// Ethereum-style address of an uncompressed (65-byte) secp256k1 public key.
pub fn eth_address(uncompressed_pubkey: &[u8]) -> Option<[u8; 20]> {
    if uncompressed_pubkey.len() != 65 || uncompressed_pubkey[0] != 0x04 {
        return None;
    }
    let hash = keccak256(&uncompressed_pubkey[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Some(address)
}

/// Parse a 32-byte hash from raw bytes.
pub fn to_bytes32(bytes: &[u8]) -> Option<[u8; 32]> {
    bytes.try_into().ok()
}
