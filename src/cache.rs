//! Contract detection cache
//!
//! Request-scoped memo of contract-oracle answers so an address that shows
//! up in many internal transactions is looked up once.
//!
//! Strategy:
//! - Addresses are keyed in canonical (lowercase) form
//! - A failed or timed-out lookup is cached as "not a contract" for the
//!   rest of the request

use crate::address::{canonical, is_valid_address};
use crate::source::{ApiKey, ContractOracle};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache for contract detection results.
///
/// Maps canonical addresses to whether they are contracts (true) or not (false).
pub struct ContractCache {
    cache: HashMap<String, bool>,
}

impl ContractCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Check if an address is known to be a contract.
    ///
    /// Returns:
    /// - `Some(true)` if address is a contract
    /// - `Some(false)` if address is not a contract (or the lookup failed)
    /// - `None` if not cached
    pub fn is_contract(&self, addr: &str) -> Option<bool> {
        self.cache.get(&canonical(addr)).copied()
    }

    /// Mark an address as a contract or not.
    pub fn mark_contract(&mut self, addr: &str, is_contract: bool) {
        self.cache.insert(canonical(addr), is_contract);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Look up every uncached, well-formed address through the oracle.
    ///
    /// Lookups are serial and each one is bounded by `timeout`. Failures are
    /// logged and recorded as "not a contract".
    pub async fn prefetch<'a, I>(
        &mut self,
        oracle: &dyn ContractOracle,
        key: &ApiKey,
        addresses: I,
        timeout: Duration,
    ) where
        I: IntoIterator<Item = &'a str>,
    {
        for addr in addresses {
            let addr = canonical(addr);
            if self.cache.contains_key(&addr) || !is_valid_address(&addr) {
                continue;
            }

            let is_contract = match tokio::time::timeout(timeout, oracle.is_contract(&addr, key)).await {
                Ok(Ok(is_contract)) => is_contract,
                Ok(Err(e)) => {
                    warn!("Contract check failed for {}, assuming not a contract: {}", addr, e);
                    false
                }
                Err(_) => {
                    warn!("Contract check for {} timed out after {:?}, assuming not a contract", addr, timeout);
                    false
                }
            };

            debug!("Contract check {} -> {}", addr, is_contract);
            self.cache.insert(addr, is_contract);
        }
    }
}

impl Default for ContractCache {
    fn default() -> Self {
        Self::new()
    }
}
