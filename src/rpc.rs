//! HTTP client for the Etherscan-compatible account API
//!
//! Implements both collaborators: transaction lists come from the
//! `account` module, contract detection uses `proxy/eth_getCode`.

use crate::error::{FetchError, OracleError};
use crate::source::{ApiKey, ContractOracle, TransactionSource};
use crate::types::{Category, ProviderEnvelope, ProviderResponse, Transaction};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Default public endpoint.
pub const DEFAULT_API_URL: &str = "https://api.etherscan.io/api";

/// Etherscan API client.
pub struct EtherscanClient {
    client: reqwest::Client,
    url: String,
}

impl EtherscanClient {
    /// Create a new client for `url`.
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    /// Make a GET call and decode the JSON body.
    async fn call(&self, params: &[(&str, &str)]) -> Result<Value, reqwest::Error> {
        self.client
            .get(&self.url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl TransactionSource for EtherscanClient {
    async fn fetch(
        &self,
        address: &str,
        category: Category,
        key: &ApiKey,
    ) -> Result<Vec<Transaction>, FetchError> {
        let params = [
            ("module", "account"),
            ("action", category.action()),
            ("address", address),
            ("startblock", "0"),
            ("endblock", "99999999"),
            ("sort", "asc"),
            ("apikey", key.expose()),
        ];
        let body = self.call(&params).await?;

        let envelope: ProviderEnvelope = serde_json::from_value(body)
            .map_err(|e| FetchError::MalformedPayload(e.to_string()))?;
        let txs = ProviderResponse::from_envelope(envelope)?.into_transactions()?;

        debug!("Fetched {} {} transactions for {}", txs.len(), category, address);
        Ok(txs)
    }
}

#[async_trait]
impl ContractOracle for EtherscanClient {
    async fn is_contract(&self, address: &str, key: &ApiKey) -> Result<bool, OracleError> {
        let params = [
            ("module", "proxy"),
            ("action", "eth_getCode"),
            ("address", address),
            ("tag", "latest"),
            ("apikey", key.expose()),
        ];
        let body = self.call(&params).await?;
        code_is_present(&body)
    }
}

/// Interpret an `eth_getCode` proxy response.
///
/// Empty code (`"0x"`) means "not a contract". Provider-level errors are
/// reported so the caller can log them.
fn code_is_present(body: &Value) -> Result<bool, OracleError> {
    if let Some(error) = body.get("error") {
        return Err(OracleError::Provider(error.to_string()));
    }
    if body.get("status").and_then(Value::as_str) == Some("0") {
        let detail = body.get("result").map(Value::to_string).unwrap_or_default();
        return Err(OracleError::Provider(detail));
    }

    let code = match body.get("result") {
        Some(Value::String(code)) => code,
        Some(Value::Null) | None => return Ok(false),
        Some(other) => {
            return Err(OracleError::Provider(format!("unexpected eth_getCode result: {}", other)))
        }
    };

    let code = code.strip_prefix("0x").unwrap_or(code);
    if code.is_empty() {
        return Ok(false);
    }
    if !code.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(OracleError::Provider(format!("eth_getCode returned non-hex code: {}", code)));
    }
    Ok(true)
}
