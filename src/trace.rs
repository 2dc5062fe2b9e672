//! Contract-hop resolution
//!
//! Follows funds that landed in a contract through the internal
//! transaction list until they reach an address that is not a contract.
//!
//! Important guardrails:
//! - Each trace carries a visited set. Re-entering an address stops the
//!   trace at the last address reached before the loop.
//! - A trace may follow at most `max_hops` forwards. Longer chains fail
//!   with `TraceDepthExceeded` instead of running unbounded.
//! - Contract detection is a synchronous predicate supplied by the caller,
//!   normally backed by a prefetched `ContractCache`.

use crate::address::canonical;
use crate::error::AnalysisError;
use crate::types::Transaction;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Default bound on forwards followed by one trace.
pub const DEFAULT_MAX_HOPS: usize = 16;

/// Resolves contracts to the final non-contract recipient of their funds.
pub struct ContractHopTracer<'a, F> {
    internal: &'a [Transaction],
    is_contract: F,
    max_hops: usize,
    resolved: HashMap<String, String>,
}

impl<'a, F> ContractHopTracer<'a, F>
where
    F: FnMut(&str) -> bool,
{
    /// - `internal`: the internal transaction list to follow.
    /// - `is_contract`: predicate deciding whether an address is a contract.
    /// - `max_hops`: forwards a single trace may follow.
    pub fn new(internal: &'a [Transaction], is_contract: F, max_hops: usize) -> Self {
        Self {
            internal,
            is_contract,
            max_hops,
            resolved: HashMap::new(),
        }
    }

    /// Whether `address` is a contract according to the predicate.
    pub fn is_contract(&mut self, address: &str) -> bool {
        (self.is_contract)(address)
    }

    /// Trace forward from `contract`.
    ///
    /// Returns the first non-contract address reached, or the last address
    /// in the chain when it has no further outgoing internal transfer.
    pub fn final_recipient(&mut self, contract: &str) -> Result<String, AnalysisError> {
        let origin = canonical(contract);
        if let Some(done) = self.resolved.get(&origin) {
            return Ok(done.clone());
        }

        let mut current = origin.clone();
        let mut visited = HashSet::from([origin.clone()]);
        let mut hops = 0usize;

        let result = loop {
            let Some(next) = self.first_outgoing(&current) else {
                break current;
            };

            hops += 1;
            if hops > self.max_hops {
                return Err(AnalysisError::TraceDepthExceeded {
                    origin,
                    max_hops: self.max_hops,
                });
            }

            if !(self.is_contract)(&next) {
                break next;
            }

            if !visited.insert(next.clone()) {
                warn!("Contract forwarding cycle from {} re-enters {}, stopping at {}", origin, next, current);
                break current;
            }

            current = next;
        };

        debug!("Traced contract {} -> {} in {} hops", origin, result, hops);
        self.resolved.insert(origin, result.clone());
        Ok(result)
    }

    /// Recipient of the first internal transfer sent by `from`.
    fn first_outgoing(&self, from: &str) -> Option<String> {
        self.internal
            .iter()
            .find(|tx| !tx.to.trim().is_empty() && canonical(&tx.from) == from)
            .map(|tx| canonical(&tx.to))
    }
}
