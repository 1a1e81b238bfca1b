use std::collections::HashSet;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Api, Decimal, StdError, StdResult, Uint128};

use crate::asset::TokenInfo;

/// Minimum holding a wallet needs to take part in a phase.
#[cw_serde]
pub struct TokenRequirement {
    pub token: TokenInfo,
    pub minimum_balance: Uint128,
    pub symbol: String,
    pub decimals: u8,
}

#[cw_serde]
pub struct PhaseBenefits {
    /// Multiplier applied to the curve price (0 = free, 1 = full price)
    pub price_multiplier: Decimal,
    /// NFTs that can be minted across the whole phase
    pub max_mints: u64,
    pub max_mints_per_wallet: u64,
}

#[cw_serde]
#[derive(Default)]
pub struct PhaseStatistics {
    pub total_minted: u64,
    pub total_volume: Uint128,
    pub remaining_mints: u64,
    /// Distinct wallets that minted during the phase
    pub total_eligible_wallets: u64,
}

/// A time-boxed whitelist window. `start` and `end` are both inclusive.
#[cw_serde]
pub struct Phase {
    pub id: String,
    pub name: String,
    pub start: u64,
    pub end: u64,
    /// Wins over lower priorities when windows overlap
    pub priority: u32,
    pub token_requirement: Option<TokenRequirement>,
    /// Only addresses on the phase allowlist may mint
    pub allowlist_only: bool,
    pub benefits: PhaseBenefits,
    pub statistics: PhaseStatistics,
}

#[cw_serde]
#[derive(Copy)]
pub enum PhaseStatus {
    Upcoming,
    Active,
    Completed,
}

impl Phase {
    pub fn contains(&self, now: u64) -> bool {
        self.start <= now && now <= self.end
    }

    pub fn is_sold_out(&self) -> bool {
        self.statistics.total_minted >= self.benefits.max_mints
    }

    /// The phase can be selected as the active one at `now`.
    pub fn is_open(&self, now: u64) -> bool {
        self.contains(now) && !self.is_sold_out()
    }

    pub fn validate(&self, api: &dyn Api) -> StdResult<()> {
        if self.id.trim().is_empty() {
            return Err(StdError::generic_err("Phase id can not be empty"));
        }
        if self.start > self.end {
            return Err(StdError::generic_err(format!(
                "Phase {}: start {} is after end {}",
                self.id, self.start, self.end
            )));
        }
        if self.benefits.price_multiplier > Decimal::one() {
            return Err(StdError::generic_err(format!(
                "Phase {}: price multiplier can not be above 1",
                self.id
            )));
        }
        if self.benefits.max_mints == 0 {
            return Err(StdError::generic_err(format!(
                "Phase {}: max_mints must be positive",
                self.id
            )));
        }
        if self.benefits.max_mints_per_wallet == 0
            || self.benefits.max_mints_per_wallet > self.benefits.max_mints
        {
            return Err(StdError::generic_err(format!(
                "Phase {}: max_mints_per_wallet must be between 1 and max_mints",
                self.id
            )));
        }
        if let Some(requirement) = &self.token_requirement {
            requirement.token.check(api)?;
        }
        Ok(())
    }

    /// Counters after a mint of `amount` units worth `volume`.
    pub fn record_mint(&mut self, amount: u64, volume: Uint128, new_wallet: bool) -> StdResult<()> {
        let stats = &mut self.statistics;
        stats.total_minted = stats
            .total_minted
            .checked_add(amount)
            .ok_or_else(|| StdError::generic_err("phase mint counter overflow"))?;
        stats.total_volume = stats.total_volume.checked_add(volume)?;
        stats.remaining_mints = self.benefits.max_mints.saturating_sub(stats.total_minted);
        if new_wallet {
            stats.total_eligible_wallets += 1;
        }
        Ok(())
    }
}

/// Fresh statistics for a newly configured phase.
pub fn initial_statistics(benefits: &PhaseBenefits) -> PhaseStatistics {
    PhaseStatistics {
        remaining_mints: benefits.max_mints,
        ..PhaseStatistics::default()
    }
}

/// Picks the single active phase at `now`. Among open phases the highest
/// priority wins, then the earliest start, then the first configured.
pub fn select_active_phase(phases: &[Phase], now: u64) -> Option<&Phase> {
    phases
        .iter()
        .enumerate()
        .filter(|(_, phase)| phase.is_open(now))
        .max_by(|(ia, a), (ib, b)| {
            a.priority
                .cmp(&b.priority)
                .then(b.start.cmp(&a.start))
                .then(ib.cmp(ia))
        })
        .map(|(_, phase)| phase)
}

pub fn phase_status(phase: &Phase, active_id: Option<&str>, now: u64) -> PhaseStatus {
    if now > phase.end || phase.is_sold_out() {
        PhaseStatus::Completed
    } else if active_id == Some(phase.id.as_str()) {
        PhaseStatus::Active
    } else {
        PhaseStatus::Upcoming
    }
}

/// Mints left for a wallet in a phase, bounded by both the wallet and the
/// phase caps. Never negative.
pub fn remaining_mints(phase: &Phase, wallet_minted: u64) -> u64 {
    let wallet_left = phase
        .benefits
        .max_mints_per_wallet
        .saturating_sub(wallet_minted);
    let phase_left = phase
        .benefits
        .max_mints
        .saturating_sub(phase.statistics.total_minted);
    wallet_left.min(phase_left)
}

pub fn check_unique_ids(phases: &[Phase]) -> StdResult<()> {
    let mut seen = HashSet::new();
    for phase in phases {
        if !seen.insert(phase.id.as_str()) {
            return Err(StdError::generic_err(format!(
                "Duplicate phase id {}",
                phase.id
            )));
        }
    }
    Ok(())
}
