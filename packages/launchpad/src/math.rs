use cosmwasm_std::{Decimal, StdError, StdResult, Uint128};

const DECIMAL_FRACTIONAL: Uint128 = Uint128::new(1_000_000_000_000_000_000u128);

/// Lifts a whole amount into a [`Decimal`] without panicking on overflow.
pub fn to_decimal(amount: Uint128) -> StdResult<Decimal> {
    Ok(Decimal::new(amount.checked_mul(DECIMAL_FRACTIONAL)?))
}

/// `amount * ratio`, rounded down.
pub fn mul_floor(amount: Uint128, ratio: Decimal) -> StdResult<Uint128> {
    amount
        .checked_multiply_ratio(ratio.atomics(), DECIMAL_FRACTIONAL)
        .map_err(|e| StdError::generic_err(e.to_string()))
}

/// Rounds a decimal up to the next whole unit.
pub fn ceil_to_uint(value: Decimal) -> StdResult<Uint128> {
    let atomics = value.atomics();
    let whole = atomics.checked_div(DECIMAL_FRACTIONAL)?;
    if atomics.checked_rem(DECIMAL_FRACTIONAL)?.is_zero() {
        Ok(whole)
    } else {
        Ok(whole.checked_add(Uint128::one())?)
    }
}

/// Divides a decimal by a whole count.
pub fn div_by_count(value: Decimal, count: u64) -> StdResult<Decimal> {
    Ok(Decimal::new(value.atomics().checked_div(Uint128::from(count))?))
}
