//! Supply Reporter
//!
//! Off-chain daemon run by each supply oracle reporter. It polls every
//! configured ledger for the token's total supply and the bridge's escrowed
//! balance, then submits `{total, locked, circulating}` to the oracle, which
//! commits a snapshot once enough reporters agree.

pub mod config;
pub mod ledger;
pub mod reporter;
pub mod submitter;

pub use config::{Config, LedgerConfig};
pub use reporter::{
    PollSummary, ReportSink, SupplyObservation, SupplyReport, SupplyReporter, SupplySource,
};
