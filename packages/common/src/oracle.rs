//! Supply oracle query surface consumed by the router.
//!
//! The router only needs to know whether the global circuit breaker is set.
//! `SupplyOracleQuery::EmergencyStatus` serializes identically to the
//! oracle's own `QueryMsg::EmergencyStatus {}`.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, QuerierWrapper, StdResult, Timestamp};

#[cw_serde]
pub enum SupplyOracleQuery {
    EmergencyStatus {},
}

#[cw_serde]
pub struct EmergencyStatusResponse {
    pub emergency_mode: bool,
    pub activated_at: Option<Timestamp>,
    pub reason: Option<String>,
}

/// Ask the oracle whether emergency mode is active.
pub fn query_emergency_mode(querier: &QuerierWrapper, oracle: &Addr) -> StdResult<bool> {
    let res: EmergencyStatusResponse =
        querier.query_wasm_smart(oracle, &SupplyOracleQuery::EmergencyStatus {})?;
    Ok(res.emergency_mode)
}
