//! Keccak helpers shared by the router and the supply oracle.

use tiny_keccak::{Hasher, Keccak};

/// Compute keccak256 hash of arbitrary data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Hash a 32-byte digest the way `personal_sign` does, so validator and
/// attester keys can sign with stock Ethereum tooling.
///
/// `keccak256("\x19Ethereum Signed Message:\n32" ‖ digest)`
pub fn eip191_hash(digest: &[u8; 32]) -> [u8; 32] {
    const PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

    let mut data = [0u8; 60];
    data[..28].copy_from_slice(PREFIX);
    data[28..].copy_from_slice(digest);
    keccak256(&data)
}

/// Format a 32-byte hash as 0x-prefixed lowercase hex.
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    let mut out = String::with_capacity(66);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
