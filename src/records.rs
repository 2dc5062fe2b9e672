//! Aggregation record types
//!
//! `TransactionRecord` is a normalized transaction as it appears in a
//! counterparty's history. `AggregateBook` accumulates records per
//! counterparty for the lifetime of a single analysis.

use serde::Serialize;
use std::collections::HashMap;

/// A normalized transaction attributed to one counterparty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// Transaction hash
    #[serde(rename = "transaction_id")]
    pub id: String,
    /// Amount in display units (ether for native transfers)
    #[serde(rename = "tx_amount")]
    pub amount: f64,
    /// `YYYY-MM-DD HH:MM:SS` in UTC, or empty when unknown
    #[serde(rename = "date_time")]
    pub occurred_at: String,
}

/// Everything attributed to one counterparty address.
///
/// `total_amount` is always the sum of `history[*].amount`; the only way to
/// change either is [`CounterpartyAggregate::push`].
#[derive(Debug, Clone, PartialEq)]
pub struct CounterpartyAggregate {
    address: String,
    total_amount: f64,
    history: Vec<TransactionRecord>,
}

impl CounterpartyAggregate {
    fn new(address: String) -> Self {
        Self {
            address,
            total_amount: 0.0,
            history: Vec::new(),
        }
    }

    fn push(&mut self, record: TransactionRecord) {
        self.total_amount += record.amount;
        self.history.push(record);
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn total_amount(&self) -> f64 {
        self.total_amount
    }

    /// Attributed transactions in processing order.
    pub fn history(&self) -> &[TransactionRecord] {
        &self.history
    }

    /// Split into `(address, total_amount, history)`.
    pub fn into_parts(self) -> (String, f64, Vec<TransactionRecord>) {
        (self.address, self.total_amount, self.history)
    }
}

/// Per-request map of counterparty address to aggregate.
#[derive(Debug, Default)]
pub struct AggregateBook {
    entries: HashMap<String, CounterpartyAggregate>,
}

impl AggregateBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute a record to `address`, creating its aggregate on first use.
    pub fn attribute(&mut self, address: &str, record: TransactionRecord) {
        self.entries
            .entry(address.to_string())
            .or_insert_with(|| CounterpartyAggregate::new(address.to_string()))
            .push(record);
    }

    pub fn get(&self, address: &str) -> Option<&CounterpartyAggregate> {
        self.entries.get(address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the book. Order of the returned aggregates is unspecified.
    pub fn into_aggregates(self) -> Vec<CounterpartyAggregate> {
        self.entries.into_values().collect()
    }
}
