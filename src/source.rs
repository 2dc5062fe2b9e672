//! Collaborator interfaces
//!
//! The analysis never talks to the network directly. It goes through a
//! `TransactionSource` for the three transaction lists and a
//! `ContractOracle` for contract detection. The API credential is passed
//! explicitly on every call.

use crate::error::{FetchError, OracleError};
use crate::types::{Category, Transaction};
use async_trait::async_trait;
use std::fmt;

/// API credential for the ledger-data provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Supplies the transaction list of one category for an address.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch(
        &self,
        address: &str,
        category: Category,
        key: &ApiKey,
    ) -> Result<Vec<Transaction>, FetchError>;
}

/// Reports whether an address is a smart contract.
///
/// An address without contract metadata is `Ok(false)`, not an error.
#[async_trait]
pub trait ContractOracle: Send + Sync {
    async fn is_contract(&self, address: &str, key: &ApiKey) -> Result<bool, OracleError>;
}
