use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal, StdError, StdResult, Uint128};

use crate::math::{ceil_to_uint, div_by_count, to_decimal};

/// Shape of the price curve between `starting_price` and `max_price`, driven by
/// bonding progress (`raised / bonding_cap`).
#[cw_serde]
#[derive(Copy, Default)]
pub enum CurveShape {
    /// `price = start + (max - start) * progress`
    #[default]
    Linear,
    /// `price = start + (max - start) * progress^2`, cheaper early on.
    Quadratic,
}

impl CurveShape {
    fn weight(self, progress: Decimal) -> StdResult<Decimal> {
        match self {
            CurveShape::Linear => Ok(progress),
            CurveShape::Quadratic => Ok(progress.checked_mul(progress)?),
        }
    }
}

#[cw_serde]
pub struct CurveConfig {
    pub shape: CurveShape,
    /// Total raise target in the payment denom
    pub bonding_cap: Uint128,
    /// Price per NFT at zero progress
    pub starting_price: Decimal,
    /// Price per NFT once the bonding cap is reached
    pub max_price: Decimal,
}

impl CurveConfig {
    pub fn validate(&self) -> StdResult<()> {
        if self.bonding_cap.is_zero() {
            return Err(StdError::generic_err("bonding_cap must be positive"));
        }
        if self.starting_price.is_zero() {
            return Err(StdError::generic_err("starting_price must be positive"));
        }
        if self.starting_price > self.max_price {
            return Err(StdError::generic_err(format!(
                "starting_price {} is above max_price {}",
                self.starting_price, self.max_price
            )));
        }
        // the raise is tracked as a decimal while pricing a batch
        to_decimal(self.bonding_cap)?;
        Ok(())
    }

    /// Price of the next unit once `raised` has been collected.
    pub fn price_at(&self, raised: Uint128) -> StdResult<Decimal> {
        unit_price(
            self.shape,
            to_decimal(raised)?,
            self.bonding_cap,
            self.starting_price,
            self.max_price,
        )
    }

    /// `raised / bonding_cap`, clamped to `[0, 1]`.
    pub fn progress(&self, raised: Uint128) -> Decimal {
        bonding_progress(raised, self.bonding_cap)
    }
}

pub fn bonding_progress(raised: Uint128, bonding_cap: Uint128) -> Decimal {
    if bonding_cap.is_zero() || raised >= bonding_cap {
        Decimal::one()
    } else {
        Decimal::from_ratio(raised, bonding_cap)
    }
}

/// Price of a single unit as a pure function of the curve parameters and the
/// amount raised so far.
pub fn unit_price(
    shape: CurveShape,
    raised: Decimal,
    bonding_cap: Uint128,
    starting_price: Decimal,
    max_price: Decimal,
) -> StdResult<Decimal> {
    if bonding_cap.is_zero() {
        return Err(StdError::generic_err("bonding_cap must be positive"));
    }
    let cap = to_decimal(bonding_cap)?;
    let progress = if raised >= cap {
        Decimal::one()
    } else {
        Decimal::from_ratio(raised.atomics(), cap.atomics())
    };

    let spread = max_price.checked_sub(starting_price)?;
    Ok(starting_price.checked_add(spread.checked_mul(shape.weight(progress)?)?)?)
}

/// Cost of buying a batch of units in one trade.
#[cw_serde]
pub struct BatchQuote {
    /// Undiscounted unit price before the batch
    pub price_before: Decimal,
    /// Undiscounted unit price after the batch has been paid
    pub price_after: Decimal,
    /// Average discounted price paid per unit
    pub price_per_nft: Decimal,
    /// Sum of discounted unit prices, rounded up to whole payment units
    pub total_cost: Uint128,
    /// `(price_after - price_before) / price_before`, in percent
    pub price_impact: Decimal,
    pub raised_after: Uint128,
}

/// Prices `nft_amount` units one after another: every unit sees the raise
/// including the units bought before it in the same batch. `multiplier` is the
/// whitelist phase discount (`0` makes the batch free).
pub fn quote_batch(
    curve: &CurveConfig,
    raised: Uint128,
    nft_amount: u64,
    multiplier: Decimal,
) -> StdResult<BatchQuote> {
    if nft_amount == 0 {
        return Err(StdError::generic_err("nft amount must be positive"));
    }

    let mut running = to_decimal(raised)?;
    let price_before = curve.price_at(raised)?;
    let mut subtotal = Decimal::zero();

    for _ in 0..nft_amount {
        let price = unit_price(
            curve.shape,
            running,
            curve.bonding_cap,
            curve.starting_price,
            curve.max_price,
        )?
        .checked_mul(multiplier)?;
        subtotal = subtotal.checked_add(price)?;
        running = running.checked_add(price)?;
    }

    let total_cost = ceil_to_uint(subtotal)?;
    let raised_after = raised.checked_add(total_cost)?;
    let price_after = curve.price_at(raised_after)?;
    let price_impact = price_impact(price_before, price_after)?;

    Ok(BatchQuote {
        price_before,
        price_after,
        price_per_nft: div_by_count(subtotal, nft_amount)?,
        total_cost,
        price_impact,
        raised_after,
    })
}

/// Percentage change between two prices. Zero when the starting price is zero.
/// Fails instead of panicking when the change does not fit a [`Decimal`].
pub fn price_impact(before: Decimal, after: Decimal) -> StdResult<Decimal> {
    if before.is_zero() || after <= before {
        return Ok(Decimal::zero());
    }
    let delta = after.checked_sub(before)?;
    let ratio = Decimal::checked_from_ratio(delta.atomics(), before.atomics())
        .map_err(|e| StdError::generic_err(format!("price impact: {}", e)))?;
    Ok(ratio.checked_mul(Decimal::from_ratio(100u128, 1u128))?)
}

/// Samples the curve at `points + 1` evenly spaced raise levels from zero to
/// the bonding cap.
pub fn sample_curve(curve: &CurveConfig, points: u32) -> StdResult<Vec<(Uint128, Decimal)>> {
    let points = points.max(1);
    (0..=points)
        .map(|i| {
            let raised = curve.bonding_cap.multiply_ratio(i, points);
            Ok((raised, curve.price_at(raised)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn curve() -> CurveConfig {
        CurveConfig {
            shape: CurveShape::Linear,
            bonding_cap: Uint128::new(10_000_000),
            starting_price: Decimal::from_str("100").unwrap(),
            max_price: Decimal::from_str("1000").unwrap(),
        }
    }

    #[test]
    fn floor_price_at_zero_progress() {
        let quote = quote_batch(&curve(), Uint128::zero(), 1, Decimal::one()).unwrap();
        assert_eq!(quote.price_per_nft, Decimal::from_str("100").unwrap());
        assert_eq!(quote.total_cost, Uint128::new(100));
        assert_eq!(quote.raised_after, Uint128::new(100));
        // 100 + 900 * 100 / 10_000_000
        assert_eq!(quote.price_after, Decimal::from_str("100.009").unwrap());
        assert!(quote.price_impact > Decimal::zero());
        assert_eq!(quote.price_impact, Decimal::from_str("0.009").unwrap());
    }

    #[test]
    fn price_is_linear_in_progress() {
        let c = curve();
        assert_eq!(
            c.price_at(Uint128::new(5_000_000)).unwrap(),
            Decimal::from_str("550").unwrap()
        );
        assert_eq!(
            c.price_at(Uint128::new(10_000_000)).unwrap(),
            Decimal::from_str("1000").unwrap()
        );
        // beyond the cap the price stays at max
        assert_eq!(
            c.price_at(Uint128::new(50_000_000)).unwrap(),
            Decimal::from_str("1000").unwrap()
        );
    }

    #[test]
    fn quadratic_is_cheaper_before_cap() {
        let mut c = curve();
        c.shape = CurveShape::Quadratic;
        assert_eq!(
            c.price_at(Uint128::new(5_000_000)).unwrap(),
            Decimal::from_str("325").unwrap()
        );
        assert_eq!(
            c.price_at(Uint128::new(10_000_000)).unwrap(),
            Decimal::from_str("1000").unwrap()
        );
    }

    #[test]
    fn batch_prices_each_unit_sequentially() {
        let c = CurveConfig {
            shape: CurveShape::Linear,
            bonding_cap: Uint128::new(1_000),
            starting_price: Decimal::from_str("100").unwrap(),
            max_price: Decimal::from_str("200").unwrap(),
        };
        // unit 1 at raise 0: 100, unit 2 at raise 100: 110, unit 3 at raise 210: 121
        let quote = quote_batch(&c, Uint128::zero(), 3, Decimal::one()).unwrap();
        assert_eq!(quote.total_cost, Uint128::new(331));
        assert!(quote.total_cost > Uint128::new(300));
        assert_eq!(quote.price_before, Decimal::from_str("100").unwrap());
    }

    #[test]
    fn multiplier_discounts_batch() {
        let half = quote_batch(&curve(), Uint128::zero(), 1, Decimal::percent(50)).unwrap();
        assert_eq!(half.total_cost, Uint128::new(50));

        let free = quote_batch(&curve(), Uint128::zero(), 4, Decimal::zero()).unwrap();
        assert_eq!(free.total_cost, Uint128::zero());
        assert_eq!(free.price_impact, Decimal::zero());
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err = quote_batch(&curve(), Uint128::zero(), 0, Decimal::one()).unwrap_err();
        assert_eq!(err, StdError::generic_err("nft amount must be positive"));
    }

    #[test]
    fn invalid_curves_fail_validation() {
        let mut c = curve();
        c.bonding_cap = Uint128::zero();
        assert!(c.validate().is_err());

        let mut c = curve();
        c.starting_price = Decimal::from_str("2000").unwrap();
        assert!(c.validate().is_err());

        assert!(curve().validate().is_ok());
    }

    #[test]
    fn extreme_price_spread_fails_without_panic() {
        let c = CurveConfig {
            shape: CurveShape::Linear,
            bonding_cap: Uint128::new(1_000),
            starting_price: Decimal::from_str("0.000000000000000001").unwrap(),
            max_price: Decimal::from_str("1000000").unwrap(),
        };
        assert!(c.validate().is_ok());
        assert!(quote_batch(&c, Uint128::zero(), 1, Decimal::one()).is_err());
        assert!(price_impact(Decimal::raw(1), Decimal::MAX).is_err());
    }

    #[test]
    fn sample_covers_whole_curve() {
        let samples = sample_curve(&curve(), 4).unwrap();
        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0], (Uint128::zero(), Decimal::from_str("100").unwrap()));
        assert_eq!(
            samples[4],
            (Uint128::new(10_000_000), Decimal::from_str("1000").unwrap())
        );
        assert!(samples.windows(2).all(|w| w[0].1 <= w[1].1));
    }
}
