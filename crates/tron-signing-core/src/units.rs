use alloy::primitives::U256;

use crate::ports::PortError;

pub const TRX_DECIMALS: u8 = 6;

/// Parses a decimal amount such as `"100"` or `"0.001"` into integer base units.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, PortError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(PortError::Validation("empty amount".to_owned()));
    }
    let (whole, frac) = match amount.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (amount, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(PortError::Validation(format!("invalid amount: {amount}")));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(PortError::Validation(format!("invalid amount: {amount}")));
    }
    if frac.len() > decimals as usize {
        return Err(PortError::Validation(format!(
            "amount {amount} has more than {decimals} decimal places"
        )));
    }

    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(whole);
    digits.push_str(frac);
    for _ in frac.len()..decimals as usize {
        digits.push('0');
    }
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10)
        .map_err(|e| PortError::Validation(format!("amount {amount} out of range: {e}")))
}

pub fn to_sun(trx: &str) -> Result<u64, PortError> {
    let sun = to_base_units(trx, TRX_DECIMALS)?;
    u64::try_from(sun).map_err(|_| PortError::Validation(format!("{trx} TRX exceeds u64 sun")))
}
