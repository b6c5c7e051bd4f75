//! Validator quorum verification
//!
//! Each validator-quorum transport has a set of N validators, identified by
//! 20-byte Ethereum-style addresses, and a threshold T with `3T >= 2N`.
//! Validators sign the EIP-191 hash of a 32-byte digest with a 65-byte
//! `r || s || v` secp256k1 signature; the contract recovers each signer and
//! counts the distinct members of the set.
//!
//! Unknown or malformed signatures are skipped rather than rejected: a relayer
//! may forward every signature it collected, and only the valid ones count.

use std::collections::BTreeSet;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Api, Binary, HexBinary};
use cw_storage_plus::Map;

use crate::error::ContractError;
use crate::hash::eth_address;

#[cw_serde]
pub struct ValidatorSet {
    /// 20-byte signer addresses, sorted and unique
    pub validators: Vec<HexBinary>,
    pub threshold: u32,
}

impl ValidatorSet {
    pub fn size(&self) -> u32 {
        self.validators.len() as u32
    }

    fn contains(&self, address: &[u8]) -> bool {
        self.validators.iter().any(|v| v.as_slice() == address)
    }
}

/// Key: transport id
pub const VALIDATOR_SETS: Map<&str, ValidatorSet> = Map::new("validator_sets");

/// Signers that carried a packet. Key: 32-byte packet hash
pub const PACKET_SIGNERS: Map<&[u8], Vec<HexBinary>> = Map::new("packet_signers");

/// Build a validator set, enforcing size, uniqueness and the 2/3 threshold.
pub fn new_validator_set(
    validators: Vec<HexBinary>,
    threshold: u32,
    min_validators: u32,
) -> Result<ValidatorSet, ContractError> {
    if let Some(bad) = validators.iter().find(|v| v.len() != 20) {
        return Err(ContractError::invalid(format!(
            "validator address {} is not 20 bytes",
            bad.to_hex()
        )));
    }

    let unique: BTreeSet<Vec<u8>> = validators.iter().map(|v| v.to_vec()).collect();
    if unique.len() != validators.len() {
        return Err(ContractError::invalid("duplicate validator address"));
    }

    let n = unique.len() as u32;
    if n < min_validators {
        return Err(ContractError::InsufficientValidators {
            got: n,
            minimum: min_validators,
        });
    }
    if threshold == 0 || threshold > n || (threshold as u64) * 3 < (n as u64) * 2 {
        return Err(ContractError::invalid(format!(
            "threshold {} must be at least two thirds of {} validators",
            threshold, n
        )));
    }

    Ok(ValidatorSet {
        validators: unique.into_iter().map(HexBinary::from).collect(),
        threshold,
    })
}

/// Reject signature bundles that are too small to reach quorum or larger
/// than the validator set.
pub fn check_signature_count(set: &ValidatorSet, count: usize) -> Result<(), ContractError> {
    if count < set.threshold as usize {
        return Err(ContractError::InsufficientSignatures {
            got: count as u32,
            required: set.threshold,
        });
    }
    if count > set.validators.len() {
        return Err(ContractError::invalid(format!(
            "{} signatures for {} validators",
            count,
            set.validators.len()
        )));
    }
    Ok(())
}

pub fn quorum_reached(valid_signers: usize, threshold: u32) -> bool {
    threshold > 0 && valid_signers >= threshold as usize
}

/// Recover the address that signed the EIP-191 hash `message_hash`.
pub fn recover_signer(api: &dyn Api, message_hash: &[u8], signature: &[u8]) -> Option<[u8; 20]> {
    if signature.len() != 65 {
        return None;
    }
    let recovery_param = match signature[64] {
        v @ (27 | 28) => v - 27,
        v @ (0 | 1) => v,
        _ => return None,
    };
    let pubkey = api
        .secp256k1_recover_pubkey(message_hash, &signature[..64], recovery_param)
        .ok()?;
    eth_address(&pubkey)
}

/// Distinct validators of `set` that signed `digest`, or an error when they
/// don't reach the threshold.
pub fn verify_quorum(
    api: &dyn Api,
    set: &ValidatorSet,
    digest: &[u8; 32],
    signatures: &[Binary],
) -> Result<Vec<HexBinary>, ContractError> {
    let message_hash = common::eip191_hash(digest);

    let signers: BTreeSet<[u8; 20]> = signatures
        .iter()
        .filter_map(|sig| recover_signer(api, &message_hash, sig.as_slice()))
        .filter(|address| set.contains(address))
        .collect();

    if !quorum_reached(signers.len(), set.threshold) {
        return Err(ContractError::InsufficientValidSignatures {
            valid: signers.len() as u32,
            required: set.threshold,
        });
    }

    Ok(signers
        .into_iter()
        .map(|address| HexBinary::from(address.to_vec()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::mock_dependencies;
    use k256::ecdsa::{SigningKey, VerifyingKey};
    use k256::elliptic_curve::sec1::ToEncodedPoint;

    fn key(i: u8) -> SigningKey {
        SigningKey::from_slice(&[i + 1; 32]).unwrap()
    }

    fn address(sk: &SigningKey) -> HexBinary {
        let point = VerifyingKey::from(sk).to_encoded_point(false);
        HexBinary::from(eth_address(point.as_bytes()).unwrap().to_vec())
    }

    fn sign(sk: &SigningKey, digest: &[u8; 32]) -> Binary {
        let (sig, recid) = sk
            .sign_prehash_recoverable(&common::eip191_hash(digest))
            .unwrap();
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(recid.to_byte() + 27);
        Binary::from(bytes)
    }

    fn set_of(n: u8, threshold: u32) -> (Vec<SigningKey>, ValidatorSet) {
        let keys: Vec<_> = (0..n).map(key).collect();
        let set = new_validator_set(keys.iter().map(address).collect(), threshold, n as u32).unwrap();
        (keys, set)
    }

    #[test]
    fn test_new_validator_set_rules() {
        let addrs: Vec<HexBinary> = (0..21).map(|i| address(&key(i))).collect();

        let err = new_validator_set(addrs[..20].to_vec(), 14, 21).unwrap_err();
        assert_eq!(err, ContractError::InsufficientValidators { got: 20, minimum: 21 });

        // 3 * 13 < 2 * 21
        assert!(new_validator_set(addrs.clone(), 13, 21).is_err());
        assert!(new_validator_set(addrs.clone(), 22, 21).is_err());
        assert!(new_validator_set(addrs.clone(), 14, 21).is_ok());

        let mut dup = addrs.clone();
        dup[1] = dup[0].clone();
        assert!(new_validator_set(dup, 14, 21).is_err());
    }

    #[test]
    fn test_signature_count_bounds() {
        let (_, set) = set_of(4, 3);
        assert_eq!(
            check_signature_count(&set, 2),
            Err(ContractError::InsufficientSignatures { got: 2, required: 3 })
        );
        assert!(check_signature_count(&set, 3).is_ok());
        assert!(matches!(
            check_signature_count(&set, 5),
            Err(ContractError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_verify_quorum_counts_distinct_members() {
        let deps = mock_dependencies();
        let (keys, set) = set_of(4, 3);
        let digest = [0x42; 32];

        let sigs: Vec<Binary> = keys[..3].iter().map(|k| sign(k, &digest)).collect();
        let signers = verify_quorum(&deps.api, &set, &digest, &sigs).unwrap();
        assert_eq!(signers.len(), 3);

        // Same validator twice counts once
        let repeated = vec![sign(&keys[0], &digest), sign(&keys[0], &digest), sign(&keys[1], &digest)];
        assert_eq!(
            verify_quorum(&deps.api, &set, &digest, &repeated),
            Err(ContractError::InsufficientValidSignatures { valid: 2, required: 3 })
        );

        // Outsiders and garbage are ignored
        let outsider = key(99);
        let mixed = vec![
            sign(&keys[0], &digest),
            sign(&keys[1], &digest),
            sign(&outsider, &digest),
            Binary::from(vec![0u8; 65]),
        ];
        assert_eq!(
            verify_quorum(&deps.api, &set, &digest, &mixed),
            Err(ContractError::InsufficientValidSignatures { valid: 2, required: 3 })
        );
    }

    #[test]
    fn test_recover_signer_accepts_both_v_conventions() {
        let deps = mock_dependencies();
        let sk = key(0);
        let digest = [7u8; 32];
        let mut sig = sign(&sk, &digest).to_vec();
        let expected = address(&sk);

        let hash = common::eip191_hash(&digest);
        assert_eq!(
            recover_signer(&deps.api, &hash, &sig).map(|a| a.to_vec()),
            Some(expected.to_vec())
        );
        sig[64] -= 27;
        assert_eq!(
            recover_signer(&deps.api, &hash, &sig).map(|a| a.to_vec()),
            Some(expected.to_vec())
        );
        sig[64] = 5;
        assert_eq!(recover_signer(&deps.api, &hash, &sig), None);
    }

    #[test]
    fn test_quorum_reached() {
        assert!(quorum_reached(14, 14));
        assert!(!quorum_reached(13, 14));
        assert!(!quorum_reached(0, 0));
    }
}
