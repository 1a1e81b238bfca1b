use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal, Empty, Order, StdError, StdResult, Storage, Uint128};
use cw_storage_plus::{Bound, Item, Map};
use launchpad::curve::CurveConfig;
use launchpad::ownership::OwnershipProposal;
use launchpad::phase::Phase;
use launchpad::reveal::{should_reveal, RevealRecord, RevealTriggers};
use launchpad::rewards::{RewardTierKind, TokenHolderRewards};

use crate::error::ContractError;

/// Limits applied to every mint, on top of the phase allowances.
#[cw_serde]
#[derive(Default)]
pub struct TradeLimits {
    pub max_nfts_per_trade: Option<u64>,
    /// Largest accepted price impact of a single trade, as a fraction
    /// (`0.05` = 5%)
    pub max_price_impact: Option<Decimal>,
    /// Most a wallet may spend on one collection per UTC day
    pub max_daily_volume: Option<Uint128>,
}

#[cw_serde]
pub struct Config {
    /// Address allowed to create collections and change contract parameters
    pub owner: Addr,
    /// Denom new collections are priced and paid in
    pub payment_denom: String,
    pub trade_limits: TradeLimits,
    /// Platform fee taken from every mint, in basis points
    pub mint_fee_bps: u16,
    /// Receives the platform fee
    pub fee_collector: Addr,
}

/// Highest accepted platform fee, 10%
pub const MAX_MINT_FEE_BPS: u16 = 1_000;

impl Config {
    /// Platform share of a mint payment, rounded down.
    pub fn mint_fee(&self, total_cost: Uint128) -> StdResult<Uint128> {
        total_cost
            .checked_multiply_ratio(self.mint_fee_bps, 10_000u128)
            .map_err(|e| StdError::generic_err(e.to_string()))
    }
}

#[cw_serde]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub creator: Addr,
    pub curve: CurveConfig,
    pub total_supply: u64,
    /// Total paid into the curve so far. Never decreases.
    pub current_raised: Uint128,
    /// NFTs sold so far. Never decreases.
    pub current_sold: u64,
    pub is_paused: bool,
    pub reveal_triggers: RevealTriggers,
    /// Set once on reveal and never cleared
    pub revealed: Option<RevealRecord>,
    /// `None` when the collection pays no holder rewards
    pub rewards: Option<TokenHolderRewards>,
    /// Price multiplier used while no whitelist phase is active
    pub public_price_multiplier: Decimal,
    pub trade_count: u64,
    pub created_at: u64,
}

impl Collection {
    /// Open for trading at `now`: not paused and no reveal trigger met, whether
    /// or not the reveal has been committed yet.
    pub fn is_active_at(&self, now: u64) -> bool {
        !self.is_paused
            && !should_reveal(
                &self.reveal_triggers,
                self.current_raised,
                self.current_sold,
                now,
                self.revealed.as_ref(),
            )
    }

    pub fn remaining_supply(&self) -> u64 {
        self.total_supply.saturating_sub(self.current_sold)
    }
}

/// Accounting of the funds a collection holds in this contract.
#[cw_serde]
pub struct Escrow {
    pub escrow_address: Addr,
    pub denom: String,
    pub total_deposited: Uint128,
    pub total_distributed: Uint128,
    /// Accrued holder rewards not claimed yet
    pub reserved_rewards: Uint128,
    pub is_active: bool,
}

impl Escrow {
    /// Funds that are neither paid out nor owed as rewards.
    pub fn available(&self) -> Uint128 {
        self.total_deposited
            .saturating_sub(self.total_distributed)
            .saturating_sub(self.reserved_rewards)
    }

    /// Records a payout. Keeps `total_distributed <= total_deposited`.
    pub fn distribute(&mut self, amount: Uint128) -> Result<(), ContractError> {
        let distributed = self.total_distributed.checked_add(amount)?;
        if distributed > self.total_deposited {
            return Err(ContractError::EscrowInsufficient {
                available: self.total_deposited.saturating_sub(self.total_distributed),
                requested: amount,
            });
        }
        self.total_distributed = distributed;
        Ok(())
    }
}

/// One executed mint. Written once, never updated.
#[cw_serde]
pub struct MintTrade {
    pub id: u64,
    pub collection_id: String,
    pub wallet: Addr,
    pub phase_id: Option<String>,
    pub nft_amount: u64,
    pub first_token_id: u64,
    pub price_per_nft: Decimal,
    pub total_cost: Uint128,
    pub timestamp: u64,
    pub reward_eligible: bool,
    pub estimated_reward: Uint128,
    pub reward_tier: Option<RewardTierKind>,
}

#[cw_serde]
#[derive(Default)]
pub struct WalletStats {
    pub total_minted: u64,
    pub total_spent: Uint128,
    /// Every reward ever accrued, counts against the per-wallet cap
    pub accrued_reward: Uint128,
    pub pending_reward: Uint128,
    pub claimed_reward: Uint128,
}

pub const CONFIG: Item<Config> = Item::new("config");

pub const OWNERSHIP_PROPOSAL: Item<OwnershipProposal> = Item::new("ownership_proposal");

pub const COLLECTIONS: Map<&str, Collection> = Map::new("collections");

pub const ESCROWS: Map<&str, Escrow> = Map::new("escrows");

/// Ordered whitelist phases of a collection
pub const PHASES: Map<&str, Vec<Phase>> = Map::new("phases");

/// (collection, phase, wallet)
pub const ALLOWLIST: Map<(&str, &str, &Addr), Empty> = Map::new("allowlist");

/// NFTs minted by a wallet inside a phase: (collection, phase, wallet)
pub const PHASE_MINTS: Map<(&str, &str, &Addr), u64> = Map::new("phase_mints");

pub const WALLET_STATS: Map<(&str, &Addr), WalletStats> = Map::new("wallet_stats");

/// Amount a wallet spent on a collection during a day: (collection, wallet, day)
pub const DAILY_VOLUME: Map<(&str, &Addr, u64), Uint128> = Map::new("daily_volume");

pub const TRADES: Map<(&str, u64), MintTrade> = Map::new("trades");

const MAX_LIMIT: u32 = 30;
const DEFAULT_LIMIT: u32 = 10;

pub fn load_collection(storage: &dyn Storage, collection_id: &str) -> Result<Collection, ContractError> {
    COLLECTIONS
        .may_load(storage, collection_id)?
        .ok_or_else(|| ContractError::CollectionNotFound {
            collection_id: collection_id.to_string(),
        })
}

pub fn load_phases(storage: &dyn Storage, collection_id: &str) -> StdResult<Vec<Phase>> {
    Ok(PHASES.may_load(storage, collection_id)?.unwrap_or_default())
}

pub fn read_collections(
    storage: &dyn Storage,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<Vec<Collection>> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.as_deref().map(Bound::exclusive);

    COLLECTIONS
        .range(storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, collection)| collection))
        .collect()
}

pub fn read_trades(
    storage: &dyn Storage,
    collection_id: &str,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Vec<MintTrade>> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    TRADES
        .prefix(collection_id)
        .range(storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, trade)| trade))
        .collect()
}
