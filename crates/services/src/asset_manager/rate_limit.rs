// Path: crates/services/src/asset_manager/rate_limit.rs
//! Withdrawal rate limiting.
//!
//! The withdrawable amount is recomputed lazily on every read from the stored
//! `(last_update, current_limit)` and the vault balance at that moment. It
//! recovers linearly towards the ceiling (`balance * percentage / POINTS`)
//! over one `period`, and every withdrawal lowers it by exactly the amount
//! withdrawn.

use xcall_types::app::{TokenState, POINTS};
use xcall_types::error::VaultError;

/// `a * b / c`, falling back to dividing first when the product overflows.
fn mul_div(a: u128, b: u128, c: u128) -> u128 {
    match a.checked_mul(b) {
        Some(product) => product / c,
        None => (a / c).saturating_mul(b),
    }
}

/// The most that may ever be withdrawable for a vault holding `balance`.
pub fn ceiling(balance: u128, percentage: u128) -> u128 {
    mul_div(balance, percentage.min(POINTS), POINTS)
}

/// The amount withdrawable at `now`. Always within `[0, balance]`.
pub fn current_limit(token: &TokenState, balance: u128, now: u64) -> u128 {
    let ceiling = ceiling(balance, token.percentage);
    if token.period == 0 {
        return ceiling;
    }
    let elapsed = now.saturating_sub(token.last_update).min(token.period);
    let missing = ceiling.saturating_sub(token.current_limit);
    let recovered = mul_div(missing, u128::from(elapsed), u128::from(token.period));
    token
        .current_limit
        .saturating_add(recovered)
        .min(ceiling)
        .min(balance)
}

/// A fresh state whose limit starts at the ceiling.
pub fn configure(period: u64, percentage: u128, balance: u128, now: u64) -> Result<TokenState, VaultError> {
    if percentage > POINTS {
        return Err(VaultError::PercentageTooHigh(percentage));
    }
    Ok(TokenState {
        period,
        percentage,
        last_update: now,
        current_limit: ceiling(balance, percentage),
    })
}

/// Charges `amount` against the limit. On error `token` is left unchanged.
pub fn withdraw(token: &mut TokenState, balance: u128, amount: u128, now: u64) -> Result<(), VaultError> {
    let available = current_limit(token, balance, now);
    if amount > available {
        return Err(VaultError::RateLimitExceeded {
            requested: amount,
            available,
        });
    }
    token.current_limit = available - amount;
    token.last_update = now;
    Ok(())
}
