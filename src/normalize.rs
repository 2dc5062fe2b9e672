//! Transaction normalization
//!
//! Turns raw provider records into `TransactionRecord`s and decides which
//! counterparty each record is filed under. Pure: no I/O.
//!
//! Parse failures never abort a batch. How a bad record is recovered
//! depends on the analysis direction:
//! - beneficiary: malformed amount counts as 0, malformed timestamp is ""
//! - payer: malformed amount skips the record, malformed timestamp is the epoch

use crate::address::canonical;
use crate::records::TransactionRecord;
use crate::types::{Category, Transaction};
use alloy_primitives::U256;
use chrono::DateTime;
use tracing::warn;

/// Decimals of the native unit (wei per ether).
pub const NATIVE_DECIMALS: u8 = 18;

/// Largest `tokenDecimal` we accept from the provider.
const MAX_TOKEN_DECIMALS: u8 = 36;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rendering of Unix time 0.
pub const EPOCH_TIMESTAMP: &str = "1970-01-01 00:00:00";

/// Which question a record is being filed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction<'a> {
    /// Outgoing funds, filed per recipient.
    Beneficiary,
    /// Incoming funds to `target` (canonical form), filed per sender.
    Payer { target: &'a str },
}

/// Parse a base-unit decimal integer and scale it to display units.
///
/// Returns `None` for anything that is not a non-negative base-10 integer.
pub fn parse_amount(raw: &str, decimals: u8) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = U256::from_str_radix(raw, 10).ok()?;
    Some(to_display_units(value, decimals))
}

/// Divide `value` by `10^decimals`.
fn to_display_units(value: U256, decimals: u8) -> f64 {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits.parse().unwrap_or(0.0);
    }
    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    format!("{}.{}", whole, frac).parse().unwrap_or(0.0)
}

/// Render Unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format_timestamp(raw: &str) -> Option<String> {
    let secs: i64 = raw.trim().parse().ok()?;
    if secs < 0 {
        return None;
    }
    let dt = DateTime::from_timestamp(secs, 0)?;
    Some(dt.format(TIMESTAMP_FORMAT).to_string())
}

/// Decimal scale of a record's amount.
fn decimals_for(tx: &Transaction, category: Category) -> u8 {
    if category != Category::Token {
        return NATIVE_DECIMALS;
    }
    tx.token_decimal
        .as_deref()
        .and_then(|d| d.trim().parse::<u8>().ok())
        .filter(|d| *d <= MAX_TOKEN_DECIMALS)
        .unwrap_or(NATIVE_DECIMALS)
}

/// Counterparty a record is filed under, in canonical form.
///
/// `None` when the record has nothing to attribute: no recipient, or for
/// payer analysis, a record not paid to the target or without a sender.
pub fn counterparty_key(tx: &Transaction, category: Category, direction: Direction<'_>) -> Option<String> {
    if tx.to.trim().is_empty() {
        return None;
    }
    match direction {
        Direction::Beneficiary => match category {
            Category::Direct | Category::Internal => Some(canonical(&tx.to)),
            // Token event logs report the initiating account as the sender.
            Category::Token => Some(canonical(&tx.from)).filter(|from| !from.is_empty()),
        },
        Direction::Payer { target } => {
            if canonical(&tx.to) != target {
                return None;
            }
            Some(canonical(&tx.from)).filter(|from| !from.is_empty())
        }
    }
}

/// Build the record for `tx`, or `None` if it must be skipped.
pub fn to_record(tx: &Transaction, category: Category, direction: Direction<'_>) -> Option<TransactionRecord> {
    let amount = match parse_amount(&tx.value, decimals_for(tx, category)) {
        Some(amount) => amount,
        None => match direction {
            Direction::Beneficiary => {
                warn!("Malformed amount {:?} for {} tx {}, counting as 0", tx.value, category, tx.hash);
                0.0
            }
            Direction::Payer { .. } => {
                warn!("Malformed amount {:?} for {} tx {}, skipping", tx.value, category, tx.hash);
                return None;
            }
        },
    };

    let occurred_at = match format_timestamp(&tx.time_stamp) {
        Some(ts) => ts,
        None => {
            warn!("Malformed timestamp {:?} for {} tx {}", tx.time_stamp, category, tx.hash);
            match direction {
                Direction::Beneficiary => String::new(),
                Direction::Payer { .. } => EPOCH_TIMESTAMP.to_string(),
            }
        }
    };

    Some(TransactionRecord {
        id: tx.hash.clone(),
        amount,
        occurred_at,
    })
}

/// Normalize one transaction list into `(counterparty, record)` pairs,
/// preserving input order.
pub fn normalize(
    txs: &[Transaction],
    category: Category,
    direction: Direction<'_>,
) -> Vec<(String, TransactionRecord)> {
    txs.iter()
        .filter_map(|tx| {
            let key = counterparty_key(tx, category, direction)?;
            let record = to_record(tx, category, direction)?;
            Some((key, record))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(from: &str, to: &str, value: &str, hash: &str, ts: &str) -> Transaction {
        Transaction {
            from: from.to_string(),
            to: to.to_string(),
            value: value.to_string(),
            hash: hash.to_string(),
            time_stamp: ts.to_string(),
            token_decimal: None,
        }
    }

    #[test]
    fn test_parse_amount_scales_wei() {
        assert_eq!(parse_amount("1000000000000000000", 18), Some(1.0));
        assert_eq!(parse_amount("2500000000000000000", 18), Some(2.5));
        assert_eq!(parse_amount("0", 18), Some(0.0));
        assert_eq!(parse_amount("1", 18), Some(1e-18));
        assert_eq!(parse_amount("1500000", 6), Some(1.5));
        assert_eq!(parse_amount("42", 0), Some(42.0));
    }

    #[test]
    fn test_parse_amount_rejects_malformed() {
        assert_eq!(parse_amount("abc", 18), None);
        assert_eq!(parse_amount("", 18), None);
        assert_eq!(parse_amount("-5", 18), None);
        assert_eq!(parse_amount("1.5", 18), None);
        assert_eq!(parse_amount("0x10", 18), None);
    }

    #[test]
    fn test_parse_amount_beyond_u64() {
        // 100k ether, well past u64::MAX wei
        assert_eq!(parse_amount("100000000000000000000000", 18), Some(100_000.0));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp("0").as_deref(), Some(EPOCH_TIMESTAMP));
        assert_eq!(
            format_timestamp("1711711711").as_deref(),
            Some("2024-03-29 11:28:31")
        );
        assert_eq!(format_timestamp("not-a-number"), None);
        assert_eq!(format_timestamp(""), None);
        assert_eq!(format_timestamp("-1"), None);
    }

    #[test]
    fn test_token_decimal_overrides_scale() {
        let mut t = tx("0xa", "0xb", "2000000", "0x1", "0");
        t.token_decimal = Some("6".into());
        let rec = to_record(&t, Category::Token, Direction::Beneficiary).unwrap();
        assert_eq!(rec.amount, 2.0);

        // Native categories ignore tokenDecimal
        let rec = to_record(&t, Category::Direct, Direction::Beneficiary).unwrap();
        assert_eq!(rec.amount, 2e-12);

        // Out-of-range decimals fall back to the native scale
        t.token_decimal = Some("200".into());
        let rec = to_record(&t, Category::Token, Direction::Beneficiary).unwrap();
        assert_eq!(rec.amount, 2e-12);
    }

    #[test]
    fn test_beneficiary_filing() {
        let t = tx("0xAAA", "0xBBB", "0", "0x1", "0");
        assert_eq!(
            counterparty_key(&t, Category::Direct, Direction::Beneficiary).as_deref(),
            Some("0xbbb")
        );
        assert_eq!(
            counterparty_key(&t, Category::Internal, Direction::Beneficiary).as_deref(),
            Some("0xbbb")
        );
        assert_eq!(
            counterparty_key(&t, Category::Token, Direction::Beneficiary).as_deref(),
            Some("0xaaa")
        );
    }

    #[test]
    fn test_empty_recipient_dropped() {
        let t = tx("0xaaa", "", "1", "0x1", "0");
        for category in Category::ALL {
            assert_eq!(counterparty_key(&t, category, Direction::Beneficiary), None);
        }
        assert!(normalize(&[t], Category::Direct, Direction::Beneficiary).is_empty());
    }

    #[test]
    fn test_payer_filing_matches_target_case_insensitively() {
        let target = "0xbbb";
        let hit = tx("0xAAA", "0xBbB", "0", "0x1", "0");
        let miss = tx("0xAAA", "0xccc", "0", "0x2", "0");
        let dir = Direction::Payer { target };
        assert_eq!(counterparty_key(&hit, Category::Direct, dir).as_deref(), Some("0xaaa"));
        assert_eq!(counterparty_key(&miss, Category::Direct, dir), None);
        assert_eq!(counterparty_key(&hit, Category::Token, dir).as_deref(), Some("0xaaa"));
    }

    #[test]
    fn test_beneficiary_malformed_fields_are_recovered() {
        let t = tx("0xa", "0xb", "abc", "0x1", "yesterday");
        let rec = to_record(&t, Category::Direct, Direction::Beneficiary).unwrap();
        assert_eq!(rec.amount, 0.0);
        assert_eq!(rec.occurred_at, "");
        assert_eq!(rec.id, "0x1");
    }

    #[test]
    fn test_payer_malformed_amount_skipped_and_timestamp_defaults() {
        let dir = Direction::Payer { target: "0xb" };
        let bad_amount = tx("0xa", "0xb", "abc", "0x1", "1");
        assert!(to_record(&bad_amount, Category::Direct, dir).is_none());

        let bad_time = tx("0xa", "0xb", "1000000000000000000", "0x2", "soon");
        let rec = to_record(&bad_time, Category::Direct, dir).unwrap();
        assert_eq!(rec.occurred_at, EPOCH_TIMESTAMP);
        assert_eq!(rec.amount, 1.0);
    }

    #[test]
    fn test_normalize_preserves_order() {
        let txs = vec![
            tx("0xa", "0xb", "1000000000000000000", "0x1", "0"),
            tx("0xa", "", "1000000000000000000", "0x2", "0"),
            tx("0xa", "0xc", "abc", "0x3", "0"),
        ];
        let out = normalize(&txs, Category::Direct, Direction::Beneficiary);
        let ids: Vec<(&str, &str)> = out.iter().map(|(k, r)| (k.as_str(), r.id.as_str())).collect();
        assert_eq!(ids, vec![("0xb", "0x1"), ("0xc", "0x3")]);
    }
}
