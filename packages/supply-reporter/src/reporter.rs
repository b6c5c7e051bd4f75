//! Supply reporter poll loop
//!
//! Every tick observes each ledger, derives its circulating supply and
//! submits the report to the oracle. A report identical to the last one
//! accepted for the chain is skipped until the refresh interval elapses.
//! Failures are logged and retried on the next tick only.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use eyre::{eyre, Result};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Raw supply figures read from one ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyObservation {
    pub total_supply: u128,
    pub locked_supply: u128,
}

/// Report as the oracle expects it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyReport {
    pub chain_id: u64,
    pub total_supply: u128,
    pub locked_supply: u128,
    pub circulating_supply: u128,
}

impl SupplyReport {
    /// Derive `circulating = total - locked`.
    pub fn from_observation(chain_id: u64, observation: SupplyObservation) -> Result<Self> {
        let circulating_supply = observation
            .total_supply
            .checked_sub(observation.locked_supply)
            .ok_or_else(|| {
                eyre!(
                    "Chain {} reports locked {} above total {}",
                    chain_id,
                    observation.locked_supply,
                    observation.total_supply
                )
            })?;
        Ok(Self {
            chain_id,
            total_supply: observation.total_supply,
            locked_supply: observation.locked_supply,
            circulating_supply,
        })
    }

    /// `ExecuteMsg::SubmitReport` of the oracle contract
    pub fn to_execute_msg(&self) -> SubmitReportMsg {
        SubmitReportMsg {
            submit_report: SubmitReportInner {
                chain_id: self.chain_id,
                total_supply: self.total_supply.to_string(),
                locked_supply: self.locked_supply.to_string(),
                circulating_supply: self.circulating_supply.to_string(),
            },
        }
    }
}

/// CosmWasm serializes enum variants to snake_case, and `Uint128` as a string.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReportMsg {
    pub submit_report: SubmitReportInner,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReportInner {
    pub chain_id: u64,
    pub total_supply: String,
    pub locked_supply: String,
    pub circulating_supply: String,
}

/// Where supply figures come from
#[async_trait]
pub trait SupplySource: Send + Sync {
    fn chain_id(&self) -> u64;

    async fn observe(&self) -> Result<SupplyObservation>;
}

/// Where reports go. Returns the transaction hash.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn submit(&self, report: &SupplyReport) -> Result<String>;
}

/// Outcome of one poll over every source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub submitted: u32,
    pub unchanged: u32,
    pub failed: u32,
}

struct LastReport {
    report: SupplyReport,
    at: Instant,
}

pub struct SupplyReporter {
    sources: Vec<Box<dyn SupplySource>>,
    sink: Box<dyn ReportSink>,
    poll_interval: Duration,
    refresh_interval: Duration,
    last_reports: HashMap<u64, LastReport>,
}

impl SupplyReporter {
    pub fn new(
        sources: Vec<Box<dyn SupplySource>>,
        sink: Box<dyn ReportSink>,
        poll_interval: Duration,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            sources,
            sink,
            poll_interval,
            refresh_interval,
            last_reports: HashMap::new(),
        }
    }

    /// Run until a shutdown signal arrives or the sender is dropped
    pub async fn run(&mut self, mut shutdown: mpsc::Receiver<()>) -> Result<()> {
        info!(
            ledgers = self.sources.len(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Supply reporter starting"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {
                    let summary = self.poll_once().await;
                    if summary.failed > 0 {
                        warn!(
                            submitted = summary.submitted,
                            failed = summary.failed,
                            "Poll finished with failures"
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Observe every source once and submit what changed
    pub async fn poll_once(&mut self) -> PollSummary {
        let mut summary = PollSummary::default();

        for source in &self.sources {
            let chain_id = source.chain_id();

            let report = match source
                .observe()
                .await
                .and_then(|obs| SupplyReport::from_observation(chain_id, obs))
            {
                Ok(report) => report,
                Err(e) => {
                    error!(chain_id, error = %e, "Failed to observe supply");
                    summary.failed += 1;
                    continue;
                }
            };

            if let Some(last) = self.last_reports.get(&chain_id) {
                if last.report == report && last.at.elapsed() < self.refresh_interval {
                    debug!(chain_id, "Supply unchanged, skipping report");
                    summary.unchanged += 1;
                    continue;
                }
            }

            match self.sink.submit(&report).await {
                Ok(tx_hash) => {
                    info!(
                        chain_id,
                        total = %report.total_supply,
                        locked = %report.locked_supply,
                        circulating = %report.circulating_supply,
                        tx_hash = %tx_hash,
                        "Supply report submitted"
                    );
                    self.last_reports.insert(
                        chain_id,
                        LastReport {
                            report,
                            at: Instant::now(),
                        },
                    );
                    summary.submitted += 1;
                }
                Err(e) => {
                    error!(chain_id, error = %e, "Failed to submit supply report");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Last report accepted for a chain
    pub fn last_report(&self, chain_id: u64) -> Option<SupplyReport> {
        self.last_reports.get(&chain_id).map(|last| last.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circulating_is_total_minus_locked() {
        let report = SupplyReport::from_observation(
            56,
            SupplyObservation {
                total_supply: 500,
                locked_supply: 100,
            },
        )
        .unwrap();
        assert_eq!(report.circulating_supply, 400);

        let err = SupplyReport::from_observation(
            56,
            SupplyObservation {
                total_supply: 100,
                locked_supply: 500,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("above total"));
    }

    #[test]
    fn test_execute_msg_shape() {
        let report = SupplyReport {
            chain_id: 56,
            total_supply: 500,
            locked_supply: 100,
            circulating_supply: 400,
        };
        let json = serde_json::to_value(report.to_execute_msg()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "submit_report": {
                    "chain_id": 56,
                    "total_supply": "500",
                    "locked_supply": "100",
                    "circulating_supply": "400"
                }
            })
        );
    }
}
