//! LCD supply source
//!
//! Reads a ledger's CW20 `token_info` total supply and the router's escrow
//! balance through CosmWasm smart queries.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use eyre::{eyre, Result, WrapErr};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::LedgerConfig;
use crate::reporter::{SupplyObservation, SupplySource};

#[derive(Debug, Deserialize)]
struct SmartQueryResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TokenInfoResponse {
    total_supply: String,
}

#[derive(Debug, Deserialize)]
struct EscrowBalanceResponse {
    amount: String,
}

pub struct LcdLedger {
    config: LedgerConfig,
    client: Client,
}

impl LcdLedger {
    pub fn new(config: LedgerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .wrap_err("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    async fn smart_query<T: DeserializeOwned + Send>(
        &self,
        contract: &str,
        query: &serde_json::Value,
    ) -> Result<T> {
        let url = smart_query_url(&self.config.lcd_url, contract, query)?;

        debug!(chain_id = self.config.chain_id, url = %url, "Smart query");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .wrap_err("Failed to send smart query")?;

        if !response.status().is_success() {
            return Err(eyre!(
                "Smart query failed: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        let body: SmartQueryResponse<T> = response
            .json()
            .await
            .wrap_err("Failed to decode smart query response")?;
        Ok(body.data)
    }

    async fn total_supply(&self) -> Result<u128> {
        let info: TokenInfoResponse = self
            .smart_query(
                &self.config.token_address,
                &serde_json::json!({ "token_info": {} }),
            )
            .await?;
        parse_amount(&info.total_supply)
    }

    /// Tokens held by every escrow transport of the router
    async fn locked_supply(&self) -> Result<u128> {
        let router = match &self.config.router_address {
            Some(router) => router,
            None => return Ok(0),
        };
        let escrow: EscrowBalanceResponse = self
            .smart_query(
                router,
                &serde_json::json!({ "escrow_balance": { "transport_id": null } }),
            )
            .await?;
        parse_amount(&escrow.amount)
    }
}

#[async_trait]
impl SupplySource for LcdLedger {
    fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    async fn observe(&self) -> Result<SupplyObservation> {
        let total_supply = self.total_supply().await?;
        let locked_supply = self.locked_supply().await?;
        Ok(SupplyObservation {
            total_supply,
            locked_supply,
        })
    }
}

fn smart_query_url(lcd_url: &str, contract: &str, query: &serde_json::Value) -> Result<String> {
    let query_b64 =
        base64::engine::general_purpose::STANDARD.encode(serde_json::to_string(query)?);
    Ok(format!(
        "{}/cosmwasm/wasm/v1/contract/{}/smart/{}",
        lcd_url.trim_end_matches('/'),
        contract,
        query_b64
    ))
}

fn parse_amount(amount: &str) -> Result<u128> {
    amount
        .parse()
        .map_err(|_| eyre!("Invalid amount '{}'", amount))
}
