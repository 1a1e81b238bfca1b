use cosmwasm_std::{to_json_binary, Binary, Deps, Env, StdResult, Uint128};
use launchpad::curve::{quote_batch, sample_curve};
use launchpad::phase::{phase_status, remaining_mints, select_active_phase, PhaseStatus};
use launchpad::reveal::should_reveal;
use launchpad::rewards::calculate_reward;

use crate::contract::check_mint_amount;
use crate::error::ContractError;
use crate::msg::{
    CollectionResponse, EligibilityResponse, MintQuoteResponse, PendingRewardResponse,
    PhaseResponse, PriceChartResponse, PricePoint, QueryMsg, RemainingMintsResponse,
    RevealStatusResponse,
};
use crate::state::{
    load_collection, load_phases, read_collections, read_trades, Collection, CONFIG, ESCROWS,
    OWNERSHIP_PROPOSAL, WALLET_STATS,
};
use crate::whitelist::{check_eligibility, wallet_minted};

const DEFAULT_CHART_POINTS: u32 = 20;
const MAX_CHART_POINTS: u32 = 100;

pub fn dispatch(deps: Deps, env: Env, msg: QueryMsg) -> Result<Binary, ContractError> {
    match msg {
        QueryMsg::Config {} => Ok(to_json_binary(&CONFIG.load(deps.storage)?)?),
        QueryMsg::OwnershipProposal {} => {
            Ok(to_json_binary(&OWNERSHIP_PROPOSAL.may_load(deps.storage)?)?)
        }
        QueryMsg::Collection { collection_id } => {
            let collection = load_collection(deps.storage, &collection_id)?;
            Ok(to_json_binary(&collection_response(
                collection,
                env.block.time.seconds(),
            )?)?)
        }
        QueryMsg::Collections { start_after, limit } => {
            let collections = read_collections(deps.storage, start_after, limit)?
                .into_iter()
                .map(|collection| collection_response(collection, env.block.time.seconds()))
                .collect::<StdResult<Vec<_>>>()?;
            Ok(to_json_binary(&collections)?)
        }
        QueryMsg::MintQuote {
            collection_id,
            nft_amount,
            wallet,
        } => Ok(to_json_binary(&query_mint_quote(
            deps,
            env,
            collection_id,
            nft_amount,
            wallet,
        )?)?),
        QueryMsg::PriceChart {
            collection_id,
            points,
        } => Ok(to_json_binary(&query_price_chart(
            deps,
            collection_id,
            points,
        )?)?),
        QueryMsg::Eligibility {
            collection_id,
            wallet,
        } => Ok(to_json_binary(&query_eligibility(
            deps,
            env,
            collection_id,
            wallet,
        )?)?),
        QueryMsg::RemainingMints {
            collection_id,
            phase_id,
            wallet,
        } => Ok(to_json_binary(&query_remaining_mints(
            deps,
            env,
            collection_id,
            phase_id,
            wallet,
        )?)?),
        QueryMsg::Phases { collection_id } => {
            Ok(to_json_binary(&query_phases(deps, env, collection_id)?)?)
        }
        QueryMsg::RevealStatus { collection_id } => Ok(to_json_binary(
            &query_reveal_status(deps, env, collection_id)?,
        )?),
        QueryMsg::PendingReward {
            collection_id,
            wallet,
        } => Ok(to_json_binary(&query_pending_reward(
            deps,
            collection_id,
            wallet,
        )?)?),
        QueryMsg::Escrow { collection_id } => {
            let escrow = ESCROWS.may_load(deps.storage, &collection_id)?.ok_or(
                ContractError::CollectionNotFound { collection_id },
            )?;
            Ok(to_json_binary(&escrow)?)
        }
        QueryMsg::Trades {
            collection_id,
            start_after,
            limit,
        } => {
            load_collection(deps.storage, &collection_id)?;
            Ok(to_json_binary(&read_trades(
                deps.storage,
                &collection_id,
                start_after,
                limit,
            )?)?)
        }
        QueryMsg::WalletStats {
            collection_id,
            wallet,
        } => {
            load_collection(deps.storage, &collection_id)?;
            let wallet = deps.api.addr_validate(&wallet)?;
            let stats = WALLET_STATS
                .may_load(deps.storage, (collection_id.as_str(), &wallet))?
                .unwrap_or_default();
            Ok(to_json_binary(&stats)?)
        }
    }
}

fn collection_response(collection: Collection, now: u64) -> StdResult<CollectionResponse> {
    Ok(CollectionResponse {
        bonding_progress: collection.curve.progress(collection.current_raised),
        current_price: collection.curve.price_at(collection.current_raised)?,
        is_active: collection.is_active_at(now),
        remaining_supply: collection.remaining_supply(),
        collection,
    })
}

/// Prices a batch without touching state. The multiplier is the one of the
/// active phase, or the public one when no phase is running. With a wallet the
/// quote also runs the phase gate and estimates the holder reward the way a
/// mint would.
pub fn query_mint_quote(
    deps: Deps,
    env: Env,
    collection_id: String,
    nft_amount: u64,
    wallet: Option<String>,
) -> Result<MintQuoteResponse, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let collection = load_collection(deps.storage, &collection_id)?;
    let escrow = ESCROWS.load(deps.storage, &collection_id)?;
    let now = env.block.time.seconds();
    if !collection.is_active_at(now) || !escrow.is_active {
        return Err(ContractError::CurveInactive { collection_id });
    }
    check_mint_amount(&collection, &config.trade_limits, nft_amount)?;

    let phases = load_phases(deps.storage, &collection_id)?;
    let active = select_active_phase(&phases, now);
    let price_multiplier = active
        .map(|phase| phase.benefits.price_multiplier)
        .unwrap_or(collection.public_price_multiplier);
    let wallet = wallet
        .map(|wallet| deps.api.addr_validate(&wallet))
        .transpose()?;

    if let Some(wallet) = &wallet {
        let gate = check_eligibility(
            deps,
            &collection_id,
            &phases,
            collection.public_price_multiplier,
            wallet,
            now,
        )?;
        gate.ensure_allows(nft_amount)?;
    }

    let quote = quote_batch(
        &collection.curve,
        collection.current_raised,
        nft_amount,
        price_multiplier,
    )
    .map_err(ContractError::quote_unavailable)?;

    let (estimated_reward, reward_tier) = match (&wallet, &collection.rewards) {
        (Some(wallet), Some(rewards)) if rewards.enabled => {
            let balance = rewards.holding_token.query_balance(&deps.querier, wallet)?;
            let accrued = WALLET_STATS
                .may_load(deps.storage, (collection_id.as_str(), wallet))?
                .map(|stats| stats.accrued_reward)
                .unwrap_or_default();
            let reward = calculate_reward(balance, quote.total_cost, rewards, accrued)?;
            // the mint deposits its share before the reward is capped by the escrow
            let deposit = quote
                .total_cost
                .checked_sub(config.mint_fee(quote.total_cost)?)?;
            let amount = reward
                .reward
                .min(escrow.available().checked_add(deposit)?);
            if amount.is_zero() {
                (amount, None)
            } else {
                (amount, reward.tier)
            }
        }
        _ => (Uint128::zero(), None),
    };

    Ok(MintQuoteResponse {
        price_per_nft: quote.price_per_nft,
        total_cost: quote.total_cost,
        price_impact: quote.price_impact,
        bonding_progress: collection.curve.progress(quote.raised_after),
        estimated_reward,
        reward_tier,
        price_multiplier,
        phase_id: active.map(|phase| phase.id.clone()),
    })
}

pub fn query_price_chart(
    deps: Deps,
    collection_id: String,
    points: Option<u32>,
) -> Result<PriceChartResponse, ContractError> {
    let collection = load_collection(deps.storage, &collection_id)?;
    let points = points
        .unwrap_or(DEFAULT_CHART_POINTS)
        .min(MAX_CHART_POINTS);

    let points = sample_curve(&collection.curve, points)
        .map_err(ContractError::quote_unavailable)?
        .into_iter()
        .map(|(raised, price)| PricePoint { raised, price })
        .collect();

    Ok(PriceChartResponse {
        points,
        current_raised: collection.current_raised,
        current_price: collection.curve.price_at(collection.current_raised)?,
    })
}

pub fn query_eligibility(
    deps: Deps,
    env: Env,
    collection_id: String,
    wallet: String,
) -> Result<EligibilityResponse, ContractError> {
    let collection = load_collection(deps.storage, &collection_id)?;
    let wallet = deps.api.addr_validate(&wallet)?;
    let phases = load_phases(deps.storage, &collection_id)?;

    let gate = check_eligibility(
        deps,
        &collection_id,
        &phases,
        collection.public_price_multiplier,
        &wallet,
        env.block.time.seconds(),
    )?;

    Ok(EligibilityResponse {
        eligible: gate.eligible,
        current_phase: gate.phase.map(|phase| PhaseResponse {
            phase: phase.clone(),
            status: PhaseStatus::Active,
        }),
        reason: gate.reason,
        remaining: gate.remaining,
        price_multiplier: gate.price_multiplier,
    })
}

pub fn query_remaining_mints(
    deps: Deps,
    env: Env,
    collection_id: String,
    phase_id: Option<String>,
    wallet: String,
) -> Result<RemainingMintsResponse, ContractError> {
    load_collection(deps.storage, &collection_id)?;
    let wallet = deps.api.addr_validate(&wallet)?;
    let phases = load_phases(deps.storage, &collection_id)?;

    let phase = match phase_id {
        Some(phase_id) => Some(
            phases
                .iter()
                .find(|phase| phase.id == phase_id)
                .ok_or(ContractError::PhaseNotFound { phase_id })?,
        ),
        None => select_active_phase(&phases, env.block.time.seconds()),
    };

    let remaining = match phase {
        Some(phase) => {
            let minted = wallet_minted(deps, &collection_id, &phase.id, &wallet)?;
            Some(remaining_mints(phase, minted))
        }
        None => None,
    };

    Ok(RemainingMintsResponse { remaining })
}

pub fn query_phases(
    deps: Deps,
    env: Env,
    collection_id: String,
) -> Result<Vec<PhaseResponse>, ContractError> {
    load_collection(deps.storage, &collection_id)?;
    let phases = load_phases(deps.storage, &collection_id)?;
    let now = env.block.time.seconds();
    let active_id = select_active_phase(&phases, now).map(|phase| phase.id.clone());

    Ok(phases
        .iter()
        .map(|phase| PhaseResponse {
            status: phase_status(phase, active_id.as_deref(), now),
            phase: phase.clone(),
        })
        .collect())
}

pub fn query_reveal_status(
    deps: Deps,
    env: Env,
    collection_id: String,
) -> Result<RevealStatusResponse, ContractError> {
    let collection = load_collection(deps.storage, &collection_id)?;
    let would_reveal_now = collection.revealed.is_none()
        && should_reveal(
            &collection.reveal_triggers,
            collection.current_raised,
            collection.current_sold,
            env.block.time.seconds(),
            None,
        );

    Ok(RevealStatusResponse {
        revealed: collection.revealed.is_some(),
        revealed_at: collection.revealed.as_ref().map(|r| r.revealed_at),
        trigger: collection.revealed.as_ref().map(|r| r.trigger),
        would_reveal_now,
        bonding_progress: collection.curve.progress(collection.current_raised),
    })
}

pub fn query_pending_reward(
    deps: Deps,
    collection_id: String,
    wallet: String,
) -> Result<PendingRewardResponse, ContractError> {
    let collection = load_collection(deps.storage, &collection_id)?;
    let wallet = deps.api.addr_validate(&wallet)?;
    let stats = WALLET_STATS
        .may_load(deps.storage, (collection_id.as_str(), &wallet))?
        .unwrap_or_default();

    Ok(PendingRewardResponse {
        claimable: collection.revealed.is_some() && !stats.pending_reward.is_zero(),
        pending: stats.pending_reward,
        claimed: stats.claimed_reward,
    })
}
