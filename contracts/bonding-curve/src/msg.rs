use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Decimal, Uint128};
use launchpad::curve::CurveConfig;
use launchpad::ownership::OwnershipProposal;
use launchpad::phase::{Phase, PhaseBenefits, PhaseStatus, TokenRequirement};
use launchpad::reveal::{RevealTrigger, RevealTriggers};
use launchpad::rewards::{RewardTierKind, TokenHolderRewards};

use crate::state::{Collection, Config, Escrow, MintTrade, TradeLimits, WalletStats};

#[cw_serde]
pub struct InstantiateMsg {
    /// Defaults to the instantiating address
    pub owner: Option<String>,
    pub payment_denom: String,
    pub trade_limits: Option<TradeLimits>,
    /// Platform fee on every mint in basis points, defaults to 0
    pub mint_fee_bps: Option<u16>,
    /// Defaults to the owner
    pub fee_collector: Option<String>,
}

#[cw_serde]
pub struct CollectionInput {
    pub id: String,
    pub name: String,
    pub symbol: String,
    /// Defaults to the sender
    pub creator: Option<String>,
    pub curve: CurveConfig,
    pub total_supply: u64,
    #[serde(default)]
    pub reveal_triggers: RevealTriggers,
    pub rewards: Option<TokenHolderRewards>,
    /// Defaults to 1 (full curve price)
    pub public_price_multiplier: Option<Decimal>,
    #[serde(default)]
    pub phases: Vec<PhaseInput>,
}

/// Fields left as `None` keep their current value.
#[cw_serde]
#[derive(Default)]
pub struct CollectionUpdate {
    pub name: Option<String>,
    /// Only accepted before the first mint
    pub curve: Option<CurveConfig>,
    pub total_supply: Option<u64>,
    pub reveal_triggers: Option<RevealTriggers>,
    pub rewards: Option<TokenHolderRewards>,
    pub public_price_multiplier: Option<Decimal>,
}

#[cw_serde]
pub struct PhaseInput {
    pub id: String,
    pub name: String,
    pub start: u64,
    pub end: u64,
    #[serde(default)]
    pub priority: u32,
    pub token_requirement: Option<TokenRequirement>,
    #[serde(default)]
    pub allowlist_only: bool,
    pub benefits: PhaseBenefits,
}

#[cw_serde]
pub enum ExecuteMsg {
    CreateCollection {
        collection: CollectionInput,
    },
    UpdateCollection {
        collection_id: String,
        update: CollectionUpdate,
    },
    SetPaused {
        collection_id: String,
        paused: bool,
    },
    AddPhase {
        collection_id: String,
        phase: PhaseInput,
    },
    /// Replaces the settings of an existing phase, keeping its statistics
    UpdatePhase {
        collection_id: String,
        phase: PhaseInput,
    },
    /// Only allowed while nothing was minted in the phase
    RemovePhase {
        collection_id: String,
        phase_id: String,
    },
    UpdateAllowlist {
        collection_id: String,
        phase_id: String,
        add: Vec<String>,
        remove: Vec<String>,
    },
    /// Buys `nft_amount` NFTs on the curve. Payment is attached in the
    /// collection denom, any excess is refunded.
    Mint {
        collection_id: String,
        nft_amount: u64,
        /// Rejects the trade when the quote moved above this cost
        max_total_cost: Option<Uint128>,
    },
    /// Forces the reveal of a collection
    Reveal {
        collection_id: String,
    },
    /// Commits a reveal whose trigger is met without a trade, e.g. the time trigger
    EvaluateReveal {
        collection_id: String,
    },
    ClaimRewards {
        collection_id: String,
    },
    WithdrawEscrow {
        collection_id: String,
        amount: Uint128,
        recipient: Option<String>,
    },
    SetEscrowActive {
        collection_id: String,
        active: bool,
    },
    UpdateConfig {
        payment_denom: Option<String>,
        trade_limits: Option<TradeLimits>,
        mint_fee_bps: Option<u16>,
        fee_collector: Option<String>,
    },
    /// Creates a request to change contract ownership.
    ProposeNewOwner {
        owner: String,
        expires_in: u64,
    },
    /// Removes a request to change contract ownership.
    DropOwnershipProposal {},
    /// Claims contract ownership.
    ClaimOwnership {},
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},
    #[returns(Option<OwnershipProposal>)]
    OwnershipProposal {},
    #[returns(CollectionResponse)]
    Collection { collection_id: String },
    #[returns(Vec<CollectionResponse>)]
    Collections {
        start_after: Option<String>,
        limit: Option<u32>,
    },
    #[returns(MintQuoteResponse)]
    MintQuote {
        collection_id: String,
        nft_amount: u64,
        /// Adds the holder reward estimate for this wallet
        wallet: Option<String>,
    },
    #[returns(PriceChartResponse)]
    PriceChart {
        collection_id: String,
        points: Option<u32>,
    },
    #[returns(EligibilityResponse)]
    Eligibility {
        collection_id: String,
        wallet: String,
    },
    /// Uses the active phase when `phase_id` is not set
    #[returns(RemainingMintsResponse)]
    RemainingMints {
        collection_id: String,
        phase_id: Option<String>,
        wallet: String,
    },
    #[returns(Vec<PhaseResponse>)]
    Phases { collection_id: String },
    #[returns(RevealStatusResponse)]
    RevealStatus { collection_id: String },
    #[returns(PendingRewardResponse)]
    PendingReward {
        collection_id: String,
        wallet: String,
    },
    #[returns(Escrow)]
    Escrow { collection_id: String },
    #[returns(Vec<MintTrade>)]
    Trades {
        collection_id: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(WalletStats)]
    WalletStats {
        collection_id: String,
        wallet: String,
    },
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
pub struct CollectionResponse {
    pub collection: Collection,
    pub bonding_progress: Decimal,
    /// Curve price of the next NFT, before any phase multiplier
    pub current_price: Decimal,
    pub is_active: bool,
    pub remaining_supply: u64,
}

#[cw_serde]
pub struct MintQuoteResponse {
    pub price_per_nft: Decimal,
    pub total_cost: Uint128,
    pub price_impact: Decimal,
    /// Progress once the quoted batch is paid
    pub bonding_progress: Decimal,
    pub estimated_reward: Uint128,
    pub reward_tier: Option<RewardTierKind>,
    pub price_multiplier: Decimal,
    pub phase_id: Option<String>,
}

#[cw_serde]
pub struct PricePoint {
    pub raised: Uint128,
    pub price: Decimal,
}

#[cw_serde]
pub struct PriceChartResponse {
    pub points: Vec<PricePoint>,
    pub current_raised: Uint128,
    pub current_price: Decimal,
}

#[cw_serde]
pub struct PhaseResponse {
    pub phase: Phase,
    pub status: PhaseStatus,
}

#[cw_serde]
pub struct EligibilityResponse {
    pub eligible: bool,
    pub current_phase: Option<PhaseResponse>,
    pub reason: Option<String>,
    /// `None` when no phase limits the wallet
    pub remaining: Option<u64>,
    pub price_multiplier: Decimal,
}

#[cw_serde]
pub struct RemainingMintsResponse {
    /// `None` means unbounded
    pub remaining: Option<u64>,
}

#[cw_serde]
pub struct RevealStatusResponse {
    pub revealed: bool,
    pub revealed_at: Option<u64>,
    pub trigger: Option<RevealTrigger>,
    /// A reveal would be committed by `EvaluateReveal` right now
    pub would_reveal_now: bool,
    pub bonding_progress: Decimal,
}

#[cw_serde]
pub struct PendingRewardResponse {
    pub pending: Uint128,
    pub claimed: Uint128,
    pub claimable: bool,
}
