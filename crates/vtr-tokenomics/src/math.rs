//! Checked fixed-point helpers shared by the subsystems.
//!
//! Products are formed in `u128` so `amount * bps` and `amount * seconds`
//! never overflow before the division; only a quotient that does not fit
//! back into an [`Amount`] is an error.

use crate::constants::BPS_DENOMINATOR;
use crate::error::{Result, TokenomicsError};
use crate::types::{Amount, Timestamp};

/// floor(a * b / denominator)
pub fn mul_div(a: u64, b: u64, denominator: u64, context: &'static str) -> Result<Amount> {
    if denominator == 0 {
        return Err(TokenomicsError::ArithmeticOverflow(context));
    }
    let quotient = (a as u128 * b as u128) / denominator as u128;
    Amount::try_from(quotient).map_err(|_| TokenomicsError::ArithmeticOverflow(context))
}

/// floor(amount * bps / 10000)
pub fn apply_bps(amount: Amount, bps: u16) -> Result<Amount> {
    mul_div(amount, bps as u64, BPS_DENOMINATOR, "basis point share")
}

pub fn add(a: Amount, b: Amount, context: &'static str) -> Result<Amount> {
    a.checked_add(b)
        .ok_or(TokenomicsError::ArithmeticOverflow(context))
}

pub fn sub(a: Amount, b: Amount, context: &'static str) -> Result<Amount> {
    a.checked_sub(b)
        .ok_or(TokenomicsError::ArithmeticOverflow(context))
}

/// `start + seconds` as a timestamp
pub fn offset(start: Timestamp, seconds: u64, context: &'static str) -> Result<Timestamp> {
    i64::try_from(seconds)
        .ok()
        .and_then(|s| start.checked_add(s))
        .ok_or(TokenomicsError::ArithmeticOverflow(context))
}

/// Seconds from `since` to `now`, zero if `now` is earlier
pub fn seconds_since(now: Timestamp, since: Timestamp) -> u64 {
    if now <= since {
        0
    } else {
        now.abs_diff(since)
    }
}
