//! Payer resolution
//!
//! Aggregates who paid a target address, plus one level of backtracking:
//! who paid those direct senders, as far as the target's own transaction
//! lists show.

use crate::address::canonical;
use crate::normalize::{counterparty_key, to_record, Direction};
use crate::records::{AggregateBook, CounterpartyAggregate};
use crate::types::TransactionSet;
use std::collections::HashSet;
use tracing::debug;

/// Resolve the payers of `target`.
///
/// Aggregates are keyed by sender address only, so an address that is both
/// a direct sender and an upstream source accumulates both roles in one
/// aggregate. Result order is unspecified.
pub fn resolve_payers(txs: &TransactionSet, target: &str) -> Vec<CounterpartyAggregate> {
    let target = canonical(target);
    let mut book = AggregateBook::new();

    // Direct senders in first-seen order
    let mut direct_senders = Vec::new();
    let mut seen = HashSet::new();
    attribute_inflows(txs, &target, &mut book, |sender| {
        if seen.insert(sender.to_string()) {
            direct_senders.push(sender.to_string());
        }
    });

    // One hop upstream
    for sender in &direct_senders {
        if *sender == target {
            continue;
        }
        attribute_inflows(txs, sender, &mut book, |_| {});
    }

    debug!(
        "Resolved {} payers for {} ({} direct senders)",
        book.len(),
        target,
        direct_senders.len()
    );
    book.into_aggregates()
}

/// Attribute every transfer into `recipient` to its sender.
///
/// `on_sender` sees each matching sender, including those whose record is
/// skipped for a malformed amount.
fn attribute_inflows<F>(txs: &TransactionSet, recipient: &str, book: &mut AggregateBook, mut on_sender: F)
where
    F: FnMut(&str),
{
    let direction = Direction::Payer { target: recipient };
    for (category, list) in txs.iter_categories() {
        for tx in list {
            let Some(sender) = counterparty_key(tx, category, direction) else {
                continue;
            };
            on_sender(&sender);
            if let Some(record) = to_record(tx, category, direction) {
                book.attribute(&sender, record);
            }
        }
    }
}
