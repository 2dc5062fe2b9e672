//! fundflow - Ethereum fund-flow analysis
//!
//! Answers two questions about an address: who ultimately received the
//! funds that left it (beneficiaries), and who funded what arrived
//! (payers, with one hop of backtracking). Transactions come from an
//! Etherscan-compatible provider in three streams: direct, internal and
//! token transfers.

pub mod address;
pub mod beneficiary;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod normalize;
pub mod payer;
pub mod records;
pub mod trace;
pub mod types;

// Collaborators and surfaces
pub mod rpc;
pub mod server;
pub mod service;
pub mod source;

// Re-export the main types for convenience
pub use error::{AnalysisError, FetchError, OracleError};
pub use records::{AggregateBook, CounterpartyAggregate, TransactionRecord};
pub use service::{AnalysisSettings, FundFlowService};
pub use source::{ApiKey, ContractOracle, TransactionSource};
pub use types::{Category, Transaction, TransactionSet};
