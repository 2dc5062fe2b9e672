//! Error taxonomy for fund-flow analysis
//!
//! Only failures that reach the caller are modelled here. Oracle failures
//! and per-record parse failures are recovered where they happen and only
//! show up in the logs.

use crate::types::Category;
use thiserror::Error;

/// Failure while fetching one transaction list from the ledger-data provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider rejected the address itself.
    #[error("provider rejected address: {0}")]
    InvalidAddress(String),

    /// The HTTP request could not be completed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider error: {message} ({detail})")]
    Provider { message: String, detail: String },

    /// The provider answered with something we could not decode.
    #[error("malformed provider payload: {0}")]
    MalformedPayload(String),

    /// The fetch did not finish within the configured timeout.
    #[error("timed out fetching {category} transactions")]
    Timeout { category: Category },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::MalformedPayload(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Failure of a contract-oracle lookup. Never surfaced past the service.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport error: {0}")]
    Transport(String),

    #[error("oracle error: {0}")]
    Provider(String),

    #[error("oracle lookup timed out")]
    Timeout,
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        OracleError::Transport(err.to_string())
    }
}

/// Failure of a whole beneficiary or payer analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The requested address is not a well-formed account address.
    #[error("invalid Ethereum address: {0:?}")]
    InvalidInput(String),

    /// One of the three transaction fetches failed.
    #[error("failed to fetch {category} transactions: {source}")]
    UpstreamFetch {
        category: Category,
        #[source]
        source: FetchError,
    },

    /// A chain of contract forwards was longer than the configured bound.
    #[error("contract hop trace from {origin} exceeded {max_hops} hops")]
    TraceDepthExceeded { origin: String, max_hops: usize },
}

impl AnalysisError {
    /// Whether the failure was caused by the caller's input rather than by us
    /// or the provider.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidInput(_)
                | AnalysisError::UpstreamFetch {
                    source: FetchError::InvalidAddress(_),
                    ..
                }
        )
    }
}
