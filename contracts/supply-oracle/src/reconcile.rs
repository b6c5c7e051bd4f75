//! Pure supply accounting: update ids, report checks, quorum and
//! reconciliation against the expected global supply.

use cosmwasm_std::{Timestamp, Uint128};

use common::{deviation_bps, keccak256};

use crate::error::ContractError;
use crate::state::ChainSupply;

/// `keccak256(chain_id ‖ total ‖ locked ‖ epoch)`, big-endian fields.
///
/// Reporters agree on an update by reporting the same tuple in the same
/// epoch, so every commit opens a fresh id space for the chain.
pub fn compute_update_id(chain_id: u64, total: Uint128, locked: Uint128, epoch: u64) -> [u8; 32] {
    let mut data = Vec::with_capacity(8 + 16 + 16 + 8);
    data.extend_from_slice(&chain_id.to_be_bytes());
    data.extend_from_slice(&total.u128().to_be_bytes());
    data.extend_from_slice(&locked.u128().to_be_bytes());
    data.extend_from_slice(&epoch.to_be_bytes());
    keccak256(&data)
}

/// A report must satisfy `locked <= total` and `circulating = total - locked`.
pub fn check_report(
    total: Uint128,
    locked: Uint128,
    circulating: Uint128,
) -> Result<(), ContractError> {
    let expected = total.checked_sub(locked).map_err(|_| {
        ContractError::invalid(format!("locked {} exceeds total {}", locked, total))
    })?;
    if circulating != expected {
        return Err(ContractError::invalid(format!(
            "circulating {} must equal total {} - locked {}",
            circulating, total, locked
        )));
    }
    Ok(())
}

pub fn quorum_reached(reporters: usize, required: u32) -> bool {
    required > 0 && reporters >= required as usize
}

/// Majority of `n` reporters.
pub fn default_required_signatures(n: usize) -> u32 {
    (n / 2 + 1) as u32
}

#[derive(Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// Not every monitored chain has a fresh snapshot, or nothing is expected
    Skipped { reason: String },
    WithinTolerance {
        circulating: Uint128,
        deviation_bps: u128,
    },
    Breach {
        circulating: Uint128,
        deviation_bps: u128,
    },
}

/// Compare the sum of circulating supplies with the expected total.
///
/// `snapshots` pairs every monitored chain with its latest snapshot, if any.
/// Circulating supply is never negative, so a chain without a fresh snapshot
/// can only raise the sum: fresh snapshots alone exceeding the bound are a
/// breach, anything else with a gap is skipped.
pub fn reconcile(
    snapshots: &[(u64, Option<ChainSupply>)],
    expected_total_supply: Uint128,
    tolerance_bps: u64,
    now: Timestamp,
    reconciliation_period: u64,
) -> Result<Reconciliation, ContractError> {
    if snapshots.is_empty() {
        return Ok(Reconciliation::Skipped {
            reason: "no monitored chains".to_string(),
        });
    }

    let mut circulating = Uint128::zero();
    let mut gap: Option<String> = None;
    for (chain_id, snapshot) in snapshots {
        match snapshot {
            Some(s)
                if now.seconds().saturating_sub(s.updated_at.seconds())
                    <= reconciliation_period =>
            {
                circulating = circulating.checked_add(s.circulating_supply)?;
            }
            Some(_) => {
                gap.get_or_insert_with(|| format!("chain {} snapshot is stale", chain_id));
            }
            None => {
                gap.get_or_insert_with(|| format!("chain {} has no snapshot", chain_id));
            }
        }
    }

    let deviation_bps = match deviation_bps(circulating, expected_total_supply) {
        Some(d) => d,
        None => {
            return Ok(Reconciliation::Skipped {
                reason: "expected total supply not set".to_string(),
            })
        }
    };
    let breached = deviation_bps > tolerance_bps as u128;

    match gap {
        Some(_) if breached && circulating > expected_total_supply => Ok(Reconciliation::Breach {
            circulating,
            deviation_bps,
        }),
        Some(reason) => Ok(Reconciliation::Skipped { reason }),
        None if breached => Ok(Reconciliation::Breach {
            circulating,
            deviation_bps,
        }),
        None => Ok(Reconciliation::WithinTolerance {
            circulating,
            deviation_bps,
        }),
    }
}
