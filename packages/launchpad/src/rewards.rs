use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Api, Decimal, StdError, StdResult, Uint128};

use crate::asset::TokenInfo;
use crate::math::mul_floor;

#[cw_serde]
#[derive(Copy)]
pub enum RewardTierKind {
    Whale,
    Diamond,
    Gold,
    Silver,
}

impl fmt::Display for RewardTierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RewardTierKind::Whale => "whale",
            RewardTierKind::Diamond => "diamond",
            RewardTierKind::Gold => "gold",
            RewardTierKind::Silver => "silver",
        };
        f.write_str(name)
    }
}

#[cw_serde]
pub struct RewardTier {
    pub min_holdings: Uint128,
    pub reward_multiplier: Decimal,
    /// Upper bound of a single reward in this tier
    pub max_reward: Option<Uint128>,
}

#[cw_serde]
pub struct RewardTiers {
    pub whale: RewardTier,
    pub diamond: RewardTier,
    pub gold: RewardTier,
    pub silver: RewardTier,
}

impl RewardTiers {
    /// Tiers from the highest threshold down.
    pub fn descending(&self) -> [(RewardTierKind, &RewardTier); 4] {
        [
            (RewardTierKind::Whale, &self.whale),
            (RewardTierKind::Diamond, &self.diamond),
            (RewardTierKind::Gold, &self.gold),
            (RewardTierKind::Silver, &self.silver),
        ]
    }

    pub fn validate(&self) -> StdResult<()> {
        let tiers = self.descending();
        for pair in tiers.windows(2) {
            let ((upper_kind, upper), (lower_kind, lower)) = (pair[0], pair[1]);
            if upper.min_holdings <= lower.min_holdings {
                return Err(StdError::generic_err(format!(
                    "{} tier threshold must be above {} tier threshold",
                    upper_kind, lower_kind
                )));
            }
        }
        Ok(())
    }
}

/// Share of the mint payment returned to holders of `holding_token`.
#[cw_serde]
pub struct TokenHolderRewards {
    pub enabled: bool,
    /// Fraction of the amount paid (`0.15` = 15%)
    pub reward_percentage: Decimal,
    pub minimum_holdings: Uint128,
    pub holding_token: TokenInfo,
    pub tiers: RewardTiers,
    pub max_reward_per_wallet: Option<Uint128>,
}

impl TokenHolderRewards {
    pub fn validate(&self, api: &dyn Api) -> StdResult<()> {
        if self.reward_percentage > Decimal::one() {
            return Err(StdError::generic_err(
                "reward_percentage can not be above 100%",
            ));
        }
        self.holding_token.check(api)?;
        self.tiers.validate()
    }
}

#[cw_serde]
#[derive(Default)]
pub struct RewardQuote {
    pub eligible: bool,
    pub tier: Option<RewardTierKind>,
    /// `paid * reward_percentage`
    pub base_reward: Uint128,
    pub multiplier: Decimal,
    /// Reward after the tier multiplier and both caps
    pub reward: Uint128,
}

/// First tier from the top whose threshold the balance meets.
pub fn reward_tier(balance: Uint128, tiers: &RewardTiers) -> Option<(RewardTierKind, &RewardTier)> {
    tiers
        .descending()
        .into_iter()
        .find(|(_, tier)| balance >= tier.min_holdings)
}

/// Reward for a payment of `paid` by a wallet holding `balance`.
/// `already_accrued` is what the wallet has earned before in the collection and
/// counts against `max_reward_per_wallet`.
pub fn calculate_reward(
    balance: Uint128,
    paid: Uint128,
    rewards: &TokenHolderRewards,
    already_accrued: Uint128,
) -> StdResult<RewardQuote> {
    if !rewards.enabled || balance < rewards.minimum_holdings {
        return Ok(RewardQuote::default());
    }
    let (kind, tier) = match reward_tier(balance, &rewards.tiers) {
        Some(found) => found,
        None => return Ok(RewardQuote::default()),
    };

    let base_reward = mul_floor(paid, rewards.reward_percentage)?;
    let mut reward = mul_floor(
        paid,
        rewards.reward_percentage.checked_mul(tier.reward_multiplier)?,
    )?;
    if let Some(max_reward) = tier.max_reward {
        reward = reward.min(max_reward);
    }
    if let Some(wallet_cap) = rewards.max_reward_per_wallet {
        reward = reward.min(wallet_cap.saturating_sub(already_accrued));
    }

    Ok(RewardQuote {
        eligible: true,
        tier: Some(kind),
        base_reward,
        multiplier: tier.reward_multiplier,
        reward,
    })
}
