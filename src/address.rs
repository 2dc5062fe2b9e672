//! Account address validation
//!
//! An account address is `0x` followed by exactly 40 hex digits, in any
//! case. All aggregation keys and address comparisons use the lowercase
//! form so one counterparty is never split across differently-cased keys.

use crate::error::AnalysisError;

const ADDRESS_HEX_LEN: usize = 40;

/// Check whether `address` is a well-formed account address.
pub fn is_valid_address(address: &str) -> bool {
    let Some(digits) = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
    else {
        return false;
    };

    if digits.len() != ADDRESS_HEX_LEN {
        return false;
    }

    matches!(hex::decode(digits), Ok(bytes) if bytes.len() == 20)
}

/// Validate an address supplied by a caller.
pub fn validate_address(address: &str) -> Result<(), AnalysisError> {
    if is_valid_address(address) {
        Ok(())
    } else {
        Err(AnalysisError::InvalidInput(address.to_string()))
    }
}

/// Canonical form used for keys and comparisons.
pub fn canonical(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}
