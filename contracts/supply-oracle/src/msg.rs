//! Message types for the supply oracle contract

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary, Uint128};

pub use common::EmergencyStatusResponse;

use crate::state::{ChainSupply, PendingUpdate};

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
pub struct InstantiateMsg {
    pub admin: String,
    pub reporters: Vec<String>,
    /// Defaults to a majority of `reporters`
    pub required_signatures: Option<u32>,
    /// Defaults to 100 bps (1%)
    pub tolerance_bps: Option<u64>,
    /// Defaults to one hour
    pub reconciliation_period: Option<u64>,
    /// Global supply to reconcile against (0 disables reconciliation)
    pub expected_total_supply: Uint128,
    /// Chains whose supply is monitored
    pub chains: Vec<u64>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Report one chain's supply.
    ///
    /// Authorization: reporters
    SubmitReport {
        chain_id: u64,
        total_supply: Uint128,
        locked_supply: Uint128,
        circulating_supply: Uint128,
    },

    /// Raise emergency mode by hand.
    ///
    /// Authorization: admin or reporters
    TriggerEmergency { reason: String },

    /// Authorization: admin
    ClearEmergencyMode {},

    // ========================================================================
    // Admin
    // ========================================================================
    AddReporter { address: String },

    RemoveReporter { address: String },

    SetRequiredSignatures { required_signatures: u32 },

    SetTolerance { tolerance_bps: u64 },

    SetReconciliationPeriod { seconds: u64 },

    SetExpectedTotalSupply { amount: Uint128 },

    AddChain { chain_id: u64 },

    RemoveChain { chain_id: u64 },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},

    #[returns(EmergencyStatusResponse)]
    EmergencyStatus {},

    #[returns(Option<ChainSupply>)]
    ChainSupply { chain_id: u64 },

    #[returns(ChainSuppliesResponse)]
    ChainSupplies {},

    #[returns(Option<PendingUpdate>)]
    PendingUpdate { update_id: Binary },

    #[returns(ReportersResponse)]
    Reporters {},

    /// Sum of latest circulating supplies against the expected total
    #[returns(GlobalSupplyResponse)]
    GlobalSupply {},
}

#[cw_serde]
pub struct ConfigResponse {
    pub admin: Addr,
    pub required_signatures: u32,
    pub tolerance_bps: u64,
    pub reconciliation_period: u64,
    pub expected_total_supply: Uint128,
    pub chains: Vec<u64>,
}

#[cw_serde]
pub struct ChainSuppliesResponse {
    pub supplies: Vec<ChainSupply>,
}

#[cw_serde]
pub struct ReportersResponse {
    pub reporters: Vec<Addr>,
}

#[cw_serde]
pub struct GlobalSupplyResponse {
    pub circulating_supply: Uint128,
    pub expected_total_supply: Uint128,
    /// None while nothing is expected
    pub deviation_bps: Option<u64>,
    pub chains_reported: u32,
    pub chains_monitored: u32,
}
