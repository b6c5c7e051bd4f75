//! Oracle submitter
//!
//! Signs `SubmitReport` transactions with the reporter's key and broadcasts
//! them through the oracle ledger's LCD.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bip39::Mnemonic;
use cosmrs::{
    bip32::DerivationPath,
    crypto::secp256k1::SigningKey,
    tx::{self, Fee, Msg, SignDoc, SignerInfo},
    AccountId, Coin,
};
use eyre::{eyre, Result, WrapErr};
use reqwest::Client;
use tracing::{debug, info};

use crate::config::Config;
use crate::reporter::{ReportSink, SupplyReport};

/// Terra derivation path
const DERIVATION_PATH: &str = "m/44'/330'/0'/0/0";

#[derive(Debug, Clone, Copy)]
struct AccountInfo {
    sequence: u64,
    account_number: u64,
}

pub struct OracleSubmitter {
    lcd_url: String,
    chain_id: String,
    oracle_address: String,
    fee_denom: String,
    gas_price: f64,
    gas_limit: u64,
    signing_key: SigningKey,
    pub address: AccountId,
    client: Client,
}

impl OracleSubmitter {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .wrap_err("Failed to create HTTP client")?;

        let mnemonic =
            Mnemonic::parse(&config.mnemonic).map_err(|e| eyre!("Invalid mnemonic: {}", e))?;
        let path: DerivationPath = DERIVATION_PATH
            .parse()
            .map_err(|e| eyre!("Invalid derivation path: {:?}", e))?;
        let signing_key = SigningKey::derive_from_path(mnemonic.to_seed(""), &path)
            .map_err(|e| eyre!("Failed to derive signing key: {}", e))?;

        let address = signing_key
            .public_key()
            .account_id(&config.address_prefix)
            .map_err(|e| eyre!("Failed to get account ID: {}", e))?;

        info!(
            reporter_address = %address,
            oracle = %config.oracle_address,
            "Oracle submitter initialized"
        );

        Ok(Self {
            lcd_url: config.oracle_lcd_url.clone(),
            chain_id: config.oracle_chain_id.clone(),
            oracle_address: config.oracle_address.clone(),
            fee_denom: config.fee_denom.clone(),
            gas_price: config.gas_price,
            gas_limit: config.gas_limit,
            signing_key,
            address,
            client,
        })
    }

    async fn get_account_info(&self) -> Result<AccountInfo> {
        let url = format!(
            "{}/cosmos/auth/v1beta1/accounts/{}",
            self.lcd_url, self.address
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .wrap_err("Failed to query account info")?;

        if !response.status().is_success() {
            return Err(eyre!(
                "Account query failed: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        let data: serde_json::Value = response.json().await?;
        let account = data
            .get("account")
            .ok_or_else(|| eyre!("Missing 'account' field in response"))?;

        Ok(AccountInfo {
            sequence: account_field(account, "sequence"),
            account_number: account_field(account, "account_number"),
        })
    }

    fn sign(&self, report: &SupplyReport, account: AccountInfo) -> Result<Vec<u8>> {
        let execute_msg = cosmrs::cosmwasm::MsgExecuteContract {
            sender: self.address.clone(),
            contract: self
                .oracle_address
                .parse()
                .map_err(|e| eyre!("Invalid oracle address: {:?}", e))?,
            msg: serde_json::to_vec(&report.to_execute_msg())?,
            funds: vec![],
        };

        let body = tx::Body::new(
            vec![execute_msg
                .to_any()
                .map_err(|e| eyre!("Failed to convert message: {}", e))?],
            "",
            0u32,
        );

        let signer_info =
            SignerInfo::single_direct(Some(self.signing_key.public_key()), account.sequence);
        let fee = Fee::from_amount_and_gas(
            Coin {
                denom: self
                    .fee_denom
                    .parse()
                    .map_err(|e| eyre!("Invalid fee denom: {}", e))?,
                amount: fee_amount(self.gas_limit, self.gas_price),
            },
            self.gas_limit,
        );
        let auth_info = signer_info.auth_info(fee);

        let chain_id = self
            .chain_id
            .parse()
            .map_err(|_| eyre!("Invalid chain ID"))?;
        let sign_doc = SignDoc::new(&body, &auth_info, &chain_id, account.account_number)
            .map_err(|e| eyre!("Failed to create sign doc: {}", e))?;

        sign_doc
            .sign(&self.signing_key)
            .map_err(|e| eyre!("Failed to sign transaction: {}", e))?
            .to_bytes()
            .map_err(|e| eyre!("Failed to serialize transaction: {}", e))
    }

    async fn broadcast_tx(&self, tx_bytes: &[u8]) -> Result<String> {
        let request = serde_json::json!({
            "tx_bytes": base64::engine::general_purpose::STANDARD.encode(tx_bytes),
            "mode": "BROADCAST_MODE_SYNC"
        });
        let url = format!("{}/cosmos/tx/v1beta1/txs", self.lcd_url);

        debug!(url = %url, "Broadcasting transaction");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| eyre!("Failed to broadcast: {}", e))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .unwrap_or_else(|_| serde_json::json!({"error": "Failed to parse response"}));

        if !status.is_success() {
            return Err(eyre!("Broadcast failed: {}", body));
        }
        broadcast_result(&body)
    }
}

#[async_trait]
impl ReportSink for OracleSubmitter {
    async fn submit(&self, report: &SupplyReport) -> Result<String> {
        let account = self.get_account_info().await?;
        let tx_bytes = self.sign(report, account)?;
        self.broadcast_tx(&tx_bytes).await
    }
}

/// Sequence and account number sit on the account, or on its
/// `base_account` for vesting and module accounts.
fn account_field(account: &serde_json::Value, field: &str) -> u64 {
    account
        .get(field)
        .or_else(|| account.get("base_account").and_then(|b| b.get(field)))
        .and_then(|v| v.as_str())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn fee_amount(gas_limit: u64, gas_price: f64) -> u128 {
    ((gas_limit as f64) * gas_price).ceil() as u128
}

/// Extract the tx hash from a sync broadcast, failing on a non-zero code
fn broadcast_result(body: &serde_json::Value) -> Result<String> {
    let tx_response = body
        .get("tx_response")
        .ok_or_else(|| eyre!("Broadcast failed: {}", body))?;

    let code = tx_response
        .get("code")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    if code != 0 {
        let raw_log = tx_response
            .get("raw_log")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error");
        return Err(eyre!("Transaction failed (code {}): {}", code, raw_log));
    }

    Ok(tx_response
        .get("txhash")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string())
}
