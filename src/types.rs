//! Ledger-data provider types
//!
//! Transaction records and response envelopes as returned by the
//! Etherscan-compatible account API. Amounts and timestamps stay as raw
//! decimal text here; `normalize` parses them.

use crate::error::FetchError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// Which of the three account transaction streams a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Top-level native transfers.
    Direct,
    /// Native transfers emitted by contract execution.
    Internal,
    /// Token transfer events.
    Token,
}

impl Category {
    /// All categories in processing order.
    pub const ALL: [Category; 3] = [Category::Direct, Category::Internal, Category::Token];

    /// Provider `action` parameter for this stream.
    pub fn action(self) -> &'static str {
        match self {
            Category::Direct => "txlist",
            Category::Internal => "txlistinternal",
            Category::Token => "tokentx",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Direct => "direct",
            Category::Internal => "internal",
            Category::Token => "token",
        };
        f.write_str(name)
    }
}

/// A single transaction record from the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Transaction {
    /// Sender address
    #[serde(rename = "from", default, deserialize_with = "null_as_empty")]
    pub from: String,

    /// Recipient address (empty for contract creation)
    #[serde(rename = "to", default, deserialize_with = "null_as_empty")]
    pub to: String,

    /// Amount in base units as decimal text
    #[serde(rename = "value", default, deserialize_with = "null_as_empty")]
    pub value: String,

    /// Transaction hash
    #[serde(rename = "hash", default, deserialize_with = "null_as_empty")]
    pub hash: String,

    /// Unix seconds as decimal text
    #[serde(rename = "timeStamp", default, deserialize_with = "null_as_empty")]
    pub time_stamp: String,

    /// Token decimals (token transfers only)
    #[serde(rename = "tokenDecimal", default)]
    pub token_decimal: Option<String>,
}

/// The three transaction lists for one address.
#[derive(Debug, Clone, Default)]
pub struct TransactionSet {
    pub direct: Vec<Transaction>,
    pub internal: Vec<Transaction>,
    pub token: Vec<Transaction>,
}

impl TransactionSet {
    /// Iterate the lists in processing order (Direct, Internal, Token).
    pub fn iter_categories(&self) -> impl Iterator<Item = (Category, &[Transaction])> {
        [
            (Category::Direct, self.direct.as_slice()),
            (Category::Internal, self.internal.as_slice()),
            (Category::Token, self.token.as_slice()),
        ]
        .into_iter()
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.internal.is_empty() && self.token.is_empty()
    }
}

/// Raw `{status, message, result}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

/// Decoded outcome of a transaction-list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResponse {
    /// The provider returned a (possibly empty) transaction list.
    Transactions(Vec<Transaction>),
    /// The provider rejected the address.
    InvalidAddress(String),
    /// The provider reported some other failure.
    Failure { message: String, detail: String },
}

const NO_TRANSACTIONS: &str = "No transactions found";

impl ProviderResponse {
    /// Classify an envelope.
    ///
    /// Returns `MalformedPayload` when a success envelope does not carry a
    /// transaction array.
    pub fn from_envelope(envelope: ProviderEnvelope) -> Result<Self, FetchError> {
        if envelope.status == "1" {
            let txs: Vec<Transaction> = serde_json::from_value(envelope.result)
                .map_err(|e| FetchError::MalformedPayload(e.to_string()))?;
            return Ok(ProviderResponse::Transactions(txs));
        }

        if envelope.message.starts_with(NO_TRANSACTIONS) {
            return Ok(ProviderResponse::Transactions(Vec::new()));
        }

        let detail = match &envelope.result {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };

        if detail.to_ascii_lowercase().contains("invalid address") {
            return Ok(ProviderResponse::InvalidAddress(detail));
        }

        Ok(ProviderResponse::Failure {
            message: envelope.message,
            detail,
        })
    }

    /// Turn the response into a transaction list or a fetch error.
    pub fn into_transactions(self) -> Result<Vec<Transaction>, FetchError> {
        match self {
            ProviderResponse::Transactions(txs) => Ok(txs),
            ProviderResponse::InvalidAddress(detail) => Err(FetchError::InvalidAddress(detail)),
            ProviderResponse::Failure { message, detail } => {
                Err(FetchError::Provider { message, detail })
            }
        }
    }
}

/// Deserialize a string field that the provider may send as `null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
