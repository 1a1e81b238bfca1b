use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdError, StdResult, Uint128};

/// Conditions that reveal a collection. Unset thresholds never fire.
#[cw_serde]
#[derive(Default)]
pub struct RevealTriggers {
    /// Reveal once this much has been raised
    pub market_cap_trigger: Option<Uint128>,
    /// Reveal once this many NFTs have been sold
    pub nft_sold_trigger: Option<u64>,
    /// Reveal at this unix timestamp (seconds)
    pub time_trigger: Option<u64>,
    /// Admin override, reveals on the next evaluation
    pub manual_reveal: bool,
}

impl RevealTriggers {
    pub fn validate(&self) -> StdResult<()> {
        if self.market_cap_trigger == Some(Uint128::zero()) {
            return Err(StdError::generic_err("market_cap_trigger must be positive"));
        }
        if self.nft_sold_trigger == Some(0) {
            return Err(StdError::generic_err("nft_sold_trigger must be positive"));
        }
        Ok(())
    }
}

#[cw_serde]
#[derive(Copy)]
pub enum RevealTrigger {
    Manual,
    MarketCap,
    NftSold,
    Time,
}

impl fmt::Display for RevealTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RevealTrigger::Manual => "manual",
            RevealTrigger::MarketCap => "market_cap",
            RevealTrigger::NftSold => "nft_sold",
            RevealTrigger::Time => "time",
        };
        f.write_str(name)
    }
}

/// Written once when a collection reveals. Never cleared.
#[cw_serde]
pub struct RevealRecord {
    pub revealed_at: u64,
    pub trigger: RevealTrigger,
}

/// Returns the trigger that reveals the collection, if any. Conditions are
/// OR-ed and checked in the order manual, market cap, sold count, time. A
/// collection that already revealed keeps its original trigger whatever the
/// counters say now.
pub fn evaluate_reveal(
    triggers: &RevealTriggers,
    raised: Uint128,
    sold: u64,
    now: u64,
    revealed: Option<&RevealRecord>,
) -> Option<RevealTrigger> {
    if let Some(record) = revealed {
        return Some(record.trigger);
    }
    if triggers.manual_reveal {
        return Some(RevealTrigger::Manual);
    }
    if matches!(triggers.market_cap_trigger, Some(cap) if raised >= cap) {
        return Some(RevealTrigger::MarketCap);
    }
    if matches!(triggers.nft_sold_trigger, Some(count) if sold >= count) {
        return Some(RevealTrigger::NftSold);
    }
    if matches!(triggers.time_trigger, Some(deadline) if now >= deadline) {
        return Some(RevealTrigger::Time);
    }
    None
}

pub fn should_reveal(
    triggers: &RevealTriggers,
    raised: Uint128,
    sold: u64,
    now: u64,
    revealed: Option<&RevealRecord>,
) -> bool {
    evaluate_reveal(triggers, raised, sold, now, revealed).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sold_trigger() -> RevealTriggers {
        RevealTriggers {
            nft_sold_trigger: Some(8_000),
            ..RevealTriggers::default()
        }
    }

    #[test]
    fn nothing_configured_never_reveals() {
        let triggers = RevealTriggers::default();
        assert_eq!(
            evaluate_reveal(&triggers, Uint128::new(u128::MAX), u64::MAX, u64::MAX, None),
            None
        );
    }

    #[test]
    fn sold_threshold_and_supply_correction() {
        let triggers = sold_trigger();
        assert!(!should_reveal(&triggers, Uint128::zero(), 7_999, 0, None));

        let trigger = evaluate_reveal(&triggers, Uint128::zero(), 8_000, 0, None).unwrap();
        assert_eq!(trigger, RevealTrigger::NftSold);
        let record = RevealRecord {
            revealed_at: 10,
            trigger,
        };

        // counter corrected back below the threshold
        assert_eq!(
            evaluate_reveal(&triggers, Uint128::zero(), 7_500, 11, Some(&record)),
            Some(RevealTrigger::NftSold)
        );
    }

    #[test]
    fn reveal_is_terminal() {
        let triggers = RevealTriggers {
            market_cap_trigger: Some(Uint128::new(8_000_000)),
            ..RevealTriggers::default()
        };
        let record = RevealRecord {
            revealed_at: 1,
            trigger: RevealTrigger::MarketCap,
        };
        for (raised, sold, now) in [(0u128, 0u64, 0u64), (8_000_000, 5, 2), (9_000_000, 10, 100)] {
            assert!(should_reveal(
                &triggers,
                Uint128::new(raised),
                sold,
                now,
                Some(&record)
            ));
        }
    }

    #[test]
    fn conditions_are_ored_in_order() {
        let triggers = RevealTriggers {
            market_cap_trigger: Some(Uint128::new(1_000)),
            nft_sold_trigger: Some(10),
            time_trigger: Some(500),
            manual_reveal: false,
        };
        assert_eq!(evaluate_reveal(&triggers, Uint128::new(999), 9, 499, None), None);
        assert_eq!(
            evaluate_reveal(&triggers, Uint128::new(999), 9, 500, None),
            Some(RevealTrigger::Time)
        );
        assert_eq!(
            evaluate_reveal(&triggers, Uint128::new(1_000), 10, 500, None),
            Some(RevealTrigger::MarketCap)
        );

        let manual = RevealTriggers {
            manual_reveal: true,
            ..triggers
        };
        assert_eq!(
            evaluate_reveal(&manual, Uint128::new(1_000), 10, 500, None),
            Some(RevealTrigger::Manual)
        );
    }

    #[test]
    fn zero_thresholds_are_invalid() {
        let triggers = RevealTriggers {
            nft_sold_trigger: Some(0),
            ..RevealTriggers::default()
        };
        assert!(triggers.validate().is_err());
        assert!(sold_trigger().validate().is_ok());
    }
}
