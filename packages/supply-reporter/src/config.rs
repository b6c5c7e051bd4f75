//! Reporter configuration

use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::time::Duration;

use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;

/// One ledger whose supply is observed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Chain id the oracle monitors this ledger under
    pub chain_id: u64,
    pub lcd_url: String,
    /// CW20 token contract
    pub token_address: String,
    /// Bridge router holding escrowed tokens, if the ledger has one
    #[serde(default)]
    pub router_address: Option<String>,
}

/// Reporter configuration
#[derive(Clone)]
pub struct Config {
    /// LCD of the ledger hosting the supply oracle
    pub oracle_lcd_url: String,
    /// Cosmos chain id used when signing, e.g. "columbus-5"
    pub oracle_chain_id: String,
    pub oracle_address: String,
    pub mnemonic: String,
    pub address_prefix: String,
    pub fee_denom: String,
    pub gas_price: f64,
    pub gas_limit: u64,

    pub ledgers: Vec<LedgerConfig>,

    /// Poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Unchanged supplies are reported again after this many seconds so the
    /// oracle's snapshots never go stale
    pub refresh_interval_secs: u64,
}

/// Custom Debug that redacts mnemonic to prevent accidental log leakage.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("oracle_lcd_url", &self.oracle_lcd_url)
            .field("oracle_chain_id", &self.oracle_chain_id)
            .field("oracle_address", &self.oracle_address)
            .field("mnemonic", &"<redacted>")
            .field("address_prefix", &self.address_prefix)
            .field("fee_denom", &self.fee_denom)
            .field("gas_price", &self.gas_price)
            .field("gas_limit", &self.gas_limit)
            .field("ledgers", &self.ledgers)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| eyre!("{} required", key));

        let ledgers: Vec<LedgerConfig> = serde_json::from_str(&required("LEDGERS")?)
            .wrap_err("LEDGERS must be a JSON array of ledgers")?;
        validate_ledgers(&ledgers)?;

        let gas_price = match lookup("GAS_PRICE") {
            Some(v) => v.parse().map_err(|_| eyre!("Invalid GAS_PRICE"))?,
            None => 0.015,
        };

        let poll_interval_ms = lookup("POLL_INTERVAL_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30_000);
        if poll_interval_ms == 0 {
            return Err(eyre!("POLL_INTERVAL_MS must be positive"));
        }

        Ok(Self {
            oracle_lcd_url: required("ORACLE_LCD_URL")?
                .trim_end_matches('/')
                .to_string(),
            oracle_chain_id: required("ORACLE_CHAIN_ID")?,
            oracle_address: required("ORACLE_ADDRESS")?,
            mnemonic: required("REPORTER_MNEMONIC")?,
            address_prefix: lookup("ADDRESS_PREFIX").unwrap_or_else(|| "terra".to_string()),
            fee_denom: lookup("FEE_DENOM").unwrap_or_else(|| "uluna".to_string()),
            gas_price,
            gas_limit: lookup("GAS_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(300_000),
            ledgers,
            poll_interval_ms,
            refresh_interval_secs: lookup("REFRESH_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1_800),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

fn validate_ledgers(ledgers: &[LedgerConfig]) -> Result<()> {
    if ledgers.is_empty() {
        return Err(eyre!("LEDGERS must name at least one ledger"));
    }
    let mut seen = BTreeSet::new();
    for ledger in ledgers {
        if !seen.insert(ledger.chain_id) {
            return Err(eyre!("Duplicate ledger for chain {}", ledger.chain_id));
        }
        if ledger.lcd_url.is_empty() || ledger.token_address.is_empty() {
            return Err(eyre!(
                "Ledger for chain {} needs lcd_url and token_address",
                ledger.chain_id
            ));
        }
    }
    Ok(())
}
