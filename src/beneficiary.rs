//! Beneficiary resolution
//!
//! Aggregates where funds in an address's transaction lists ended up.
//! Internal transfers into a contract are attributed to whoever the
//! contract forwarded them to, following contract hops through the
//! internal list.

use crate::address::{canonical, is_valid_address};
use crate::error::AnalysisError;
use crate::normalize::{normalize, Direction};
use crate::records::{AggregateBook, CounterpartyAggregate};
use crate::trace::ContractHopTracer;
use crate::types::{Category, TransactionSet};
use std::collections::HashSet;
use tracing::debug;

/// Addresses the contract predicate may be asked about during resolution.
///
/// Every hop target is the recipient of some internal transfer, so the
/// distinct well-formed internal recipients cover all lookups. Returned in
/// first-seen order.
pub fn contract_candidates(txs: &TransactionSet) -> Vec<String> {
    let mut seen = HashSet::new();
    txs.internal
        .iter()
        .map(|tx| canonical(&tx.to))
        .filter(|to| is_valid_address(to))
        .filter(|to| seen.insert(to.clone()))
        .collect()
}

/// Resolve the beneficiaries of `txs`.
///
/// `is_contract` must answer without I/O; callers prefetch with
/// [`contract_candidates`]. Result order is unspecified; each aggregate's
/// history is in processing order (Direct, Internal, Token).
pub fn resolve_beneficiaries<F>(
    txs: &TransactionSet,
    is_contract: F,
    max_hops: usize,
) -> Result<Vec<CounterpartyAggregate>, AnalysisError>
where
    F: FnMut(&str) -> bool,
{
    let mut book = AggregateBook::new();
    let mut tracer = ContractHopTracer::new(&txs.internal, is_contract, max_hops);

    for (category, list) in txs.iter_categories() {
        for (mut key, record) in normalize(list, category, Direction::Beneficiary) {
            if category == Category::Internal && tracer.is_contract(&key) {
                key = tracer.final_recipient(&key)?;
            }

            if !is_valid_address(&key) {
                debug!("Skipping {} tx {} with malformed counterparty {:?}", category, record.id, key);
                continue;
            }

            book.attribute(&key, record);
        }
    }

    Ok(book.into_aggregates())
}
