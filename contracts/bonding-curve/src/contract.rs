#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    attr, coins, Addr, Api, BankMsg, Binary, Decimal, Deps, DepsMut, Empty, Env, Event,
    MessageInfo, Order, Response, StdError, StdResult, Storage, Uint128,
};
use cw2::{get_contract_version, set_contract_version};
use cw_utils::may_pay;
use launchpad::curve::{quote_batch, BatchQuote};
use launchpad::ownership::{claim_ownership, drop_ownership_proposal, propose_new_owner};
use launchpad::phase::{check_unique_ids, initial_statistics, Phase, PhaseStatistics};
use launchpad::reveal::{evaluate_reveal, RevealRecord};
use launchpad::rewards::{calculate_reward, RewardQuote};
use semver::Version;

use crate::error::ContractError;
use crate::msg::{
    CollectionInput, CollectionUpdate, ExecuteMsg, InstantiateMsg, MigrateMsg, PhaseInput,
    QueryMsg,
};
use crate::query;
use crate::state::{
    load_collection, load_phases, Collection, Config, Escrow, MintTrade, TradeLimits, ALLOWLIST,
    COLLECTIONS, CONFIG, DAILY_VOLUME, ESCROWS, MAX_MINT_FEE_BPS, OWNERSHIP_PROPOSAL, PHASES,
    PHASE_MINTS, TRADES, WALLET_STATS,
};
use crate::whitelist::check_eligibility;

// version info for migration info
const CONTRACT_NAME: &str = concat!("crates.io:loslauncher__", env!("CARGO_PKG_NAME"));
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

const SECONDS_PER_DAY: u64 = 86_400;
const MAX_ID_LENGTH: usize = 64;

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let owner = match msg.owner {
        Some(owner) => deps.api.addr_validate(&owner)?,
        None => info.sender,
    };
    validate_denom(&msg.payment_denom)?;
    let mint_fee_bps = msg.mint_fee_bps.unwrap_or_default();
    validate_mint_fee(mint_fee_bps)?;
    let fee_collector = match msg.fee_collector {
        Some(collector) => deps.api.addr_validate(&collector)?,
        None => owner.clone(),
    };

    let config = Config {
        owner: owner.clone(),
        payment_denom: msg.payment_denom.clone(),
        trade_limits: msg.trade_limits.unwrap_or_default(),
        mint_fee_bps,
        fee_collector: fee_collector.clone(),
    };
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "instantiate"),
        attr("owner", owner),
        attr("payment_denom", msg.payment_denom),
        attr("mint_fee_bps", mint_fee_bps.to_string()),
        attr("fee_collector", fee_collector),
    ]))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    deps.api
        .debug(format!("WASMDEBUG: execute: received msg: {:?}", msg).as_str());
    match msg {
        ExecuteMsg::CreateCollection { collection } => {
            execute_create_collection(deps, env, info, collection)
        }
        ExecuteMsg::UpdateCollection {
            collection_id,
            update,
        } => execute_update_collection(deps, env, info, collection_id, update),
        ExecuteMsg::SetPaused {
            collection_id,
            paused,
        } => execute_set_paused(deps, info, collection_id, paused),
        ExecuteMsg::AddPhase {
            collection_id,
            phase,
        } => execute_add_phase(deps, info, collection_id, phase),
        ExecuteMsg::UpdatePhase {
            collection_id,
            phase,
        } => execute_update_phase(deps, info, collection_id, phase),
        ExecuteMsg::RemovePhase {
            collection_id,
            phase_id,
        } => execute_remove_phase(deps, info, collection_id, phase_id),
        ExecuteMsg::UpdateAllowlist {
            collection_id,
            phase_id,
            add,
            remove,
        } => execute_update_allowlist(deps, info, collection_id, phase_id, add, remove),
        ExecuteMsg::Mint {
            collection_id,
            nft_amount,
            max_total_cost,
        } => execute_mint(deps, env, info, collection_id, nft_amount, max_total_cost),
        ExecuteMsg::Reveal { collection_id } => execute_reveal(deps, env, info, collection_id),
        ExecuteMsg::EvaluateReveal { collection_id } => {
            execute_evaluate_reveal(deps, env, collection_id)
        }
        ExecuteMsg::ClaimRewards { collection_id } => {
            execute_claim_rewards(deps, env, info, collection_id)
        }
        ExecuteMsg::WithdrawEscrow {
            collection_id,
            amount,
            recipient,
        } => execute_withdraw_escrow(deps, env, info, collection_id, amount, recipient),
        ExecuteMsg::SetEscrowActive {
            collection_id,
            active,
        } => execute_set_escrow_active(deps, info, collection_id, active),
        ExecuteMsg::UpdateConfig {
            payment_denom,
            trade_limits,
            mint_fee_bps,
            fee_collector,
        } => execute_update_config(
            deps,
            info,
            payment_denom,
            trade_limits,
            mint_fee_bps,
            fee_collector,
        ),
        ExecuteMsg::ProposeNewOwner { owner, expires_in } => {
            let config: Config = CONFIG.load(deps.storage)?;
            propose_new_owner(
                deps,
                info,
                env,
                owner,
                expires_in,
                config.owner,
                OWNERSHIP_PROPOSAL,
            )
            .map_err(Into::into)
        }
        ExecuteMsg::DropOwnershipProposal {} => {
            let config: Config = CONFIG.load(deps.storage)?;
            drop_ownership_proposal(deps, info, config.owner, OWNERSHIP_PROPOSAL)
                .map_err(Into::into)
        }
        ExecuteMsg::ClaimOwnership {} => {
            claim_ownership(deps, info, env, OWNERSHIP_PROPOSAL, |deps, new_owner| {
                CONFIG.update::<_, StdError>(deps.storage, |mut v| {
                    v.owner = new_owner;
                    Ok(v)
                })?;
                Ok(())
            })
            .map_err(Into::into)
        }
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> Result<Binary, ContractError> {
    query::dispatch(deps, env, msg)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let contract_info = get_contract_version(deps.storage)?;
    if contract_info.contract != CONTRACT_NAME {
        return Err(ContractError::CannotMigrate {
            previous_contract: contract_info.contract,
        });
    }
    let contract_version: Version = contract_info.version.parse()?;
    let current_version: Version = CONTRACT_VERSION.parse()?;
    if contract_version < current_version {
        set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
        Ok(Response::new().add_attributes(vec![
            attr("action", "migrate"),
            attr("from_version", contract_info.version),
            attr("to_version", CONTRACT_VERSION),
        ]))
    } else {
        Err(ContractError::CannotMigrate {
            previous_contract: contract_info.version,
        })
    }
}

/// Creates a collection together with its escrow and initial phases.
/// Only the contract owner can call this.
pub fn execute_create_collection(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    input: CollectionInput,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized {});
    }

    validate_collection_id(&input.id)?;
    if COLLECTIONS.has(deps.storage, &input.id) {
        return Err(ContractError::CollectionExists {
            collection_id: input.id,
        });
    }

    let creator = match input.creator {
        Some(creator) => deps.api.addr_validate(&creator)?,
        None => info.sender,
    };
    let collection = Collection {
        id: input.id,
        name: input.name,
        symbol: input.symbol,
        creator,
        curve: input.curve,
        total_supply: input.total_supply,
        current_raised: Uint128::zero(),
        current_sold: 0,
        is_paused: false,
        reveal_triggers: input.reveal_triggers,
        revealed: None,
        rewards: input.rewards,
        public_price_multiplier: input.public_price_multiplier.unwrap_or(Decimal::one()),
        trade_count: 0,
        created_at: env.block.time.seconds(),
    };
    validate_collection(deps.api, &collection)?;

    let phases = input
        .phases
        .into_iter()
        .map(|phase| build_phase(deps.api, phase))
        .collect::<Result<Vec<_>, _>>()?;
    check_unique_ids(&phases).map_err(ContractError::invalid_config)?;

    let escrow = Escrow {
        escrow_address: env.contract.address,
        denom: config.payment_denom,
        total_deposited: Uint128::zero(),
        total_distributed: Uint128::zero(),
        reserved_rewards: Uint128::zero(),
        is_active: true,
    };

    COLLECTIONS.save(deps.storage, &collection.id, &collection)?;
    PHASES.save(deps.storage, &collection.id, &phases)?;
    ESCROWS.save(deps.storage, &collection.id, &escrow)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "create_collection"),
        attr("collection_id", &collection.id),
        attr("creator", collection.creator),
        attr("bonding_cap", collection.curve.bonding_cap),
        attr("starting_price", collection.curve.starting_price.to_string()),
        attr("max_price", collection.curve.max_price.to_string()),
        attr("phases", phases.len().to_string()),
        attr("denom", escrow.denom),
    ]))
}

pub fn execute_update_collection(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collection_id: String,
    update: CollectionUpdate,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut collection = load_collection(deps.storage, &collection_id)?;
    assert_collection_admin(&config, &collection, &info.sender)?;
    if collection.revealed.is_some() {
        return Err(ContractError::AlreadyRevealed { collection_id });
    }

    if let Some(name) = update.name {
        collection.name = name;
    }
    if let Some(curve) = update.curve {
        if collection.current_sold > 0 {
            return Err(ContractError::InvalidConfig {
                reason: "curve can not change after the first mint".to_string(),
            });
        }
        collection.curve = curve;
    }
    if let Some(total_supply) = update.total_supply {
        collection.total_supply = total_supply;
    }
    if let Some(reveal_triggers) = update.reveal_triggers {
        collection.reveal_triggers = reveal_triggers;
    }
    if let Some(rewards) = update.rewards {
        collection.rewards = Some(rewards);
    }
    if let Some(multiplier) = update.public_price_multiplier {
        collection.public_price_multiplier = multiplier;
    }
    validate_collection(deps.api, &collection)?;

    // new triggers may already be satisfied
    let reveal = commit_reveal(&mut collection, env.block.time.seconds());
    COLLECTIONS.save(deps.storage, &collection_id, &collection)?;

    let mut response = Response::new().add_attributes(vec![
        attr("action", "update_collection"),
        attr("collection_id", collection_id),
        attr("reveal_triggered", reveal.is_some().to_string()),
    ]);
    if let Some(event) = reveal {
        response = response.add_event(event);
    }
    Ok(response)
}

pub fn execute_set_paused(
    deps: DepsMut,
    info: MessageInfo,
    collection_id: String,
    paused: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut collection = load_collection(deps.storage, &collection_id)?;
    assert_collection_admin(&config, &collection, &info.sender)?;

    collection.is_paused = paused;
    COLLECTIONS.save(deps.storage, &collection_id, &collection)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "set_paused"),
        attr("collection_id", collection_id),
        attr("paused", paused.to_string()),
    ]))
}

pub fn execute_add_phase(
    deps: DepsMut,
    info: MessageInfo,
    collection_id: String,
    input: PhaseInput,
) -> Result<Response, ContractError> {
    let mut phases = load_admin_phases(deps.as_ref(), &info.sender, &collection_id)?;

    let phase = build_phase(deps.api, input)?;
    let phase_id = phase.id.clone();
    phases.push(phase);
    check_unique_ids(&phases).map_err(ContractError::invalid_config)?;
    PHASES.save(deps.storage, &collection_id, &phases)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "add_phase"),
        attr("collection_id", collection_id),
        attr("phase_id", phase_id),
    ]))
}

pub fn execute_update_phase(
    deps: DepsMut,
    info: MessageInfo,
    collection_id: String,
    input: PhaseInput,
) -> Result<Response, ContractError> {
    let mut phases = load_admin_phases(deps.as_ref(), &info.sender, &collection_id)?;
    let index = phase_index(&phases, &input.id)?;

    let minted = phases[index].statistics.total_minted;
    let mut phase = build_phase(deps.api, input)?;
    if phase.benefits.max_mints < minted {
        return Err(ContractError::InvalidConfig {
            reason: format!(
                "phase {} already minted {}, max_mints can not go below it",
                phase.id, minted
            ),
        });
    }
    phase.statistics = PhaseStatistics {
        remaining_mints: phase.benefits.max_mints - minted,
        ..phases[index].statistics.clone()
    };
    let phase_id = phase.id.clone();
    phases[index] = phase;
    PHASES.save(deps.storage, &collection_id, &phases)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "update_phase"),
        attr("collection_id", collection_id),
        attr("phase_id", phase_id),
    ]))
}

pub fn execute_remove_phase(
    deps: DepsMut,
    info: MessageInfo,
    collection_id: String,
    phase_id: String,
) -> Result<Response, ContractError> {
    let mut phases = load_admin_phases(deps.as_ref(), &info.sender, &collection_id)?;
    let index = phase_index(&phases, &phase_id)?;
    if phases[index].statistics.total_minted > 0 {
        return Err(ContractError::InvalidConfig {
            reason: format!("phase {} already has mints", phase_id),
        });
    }
    phases.remove(index);
    PHASES.save(deps.storage, &collection_id, &phases)?;

    let listed = ALLOWLIST
        .prefix((collection_id.as_str(), phase_id.as_str()))
        .keys(deps.storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<Addr>>>()?;
    for wallet in listed {
        ALLOWLIST.remove(
            deps.storage,
            (collection_id.as_str(), phase_id.as_str(), &wallet),
        );
    }

    Ok(Response::new().add_attributes(vec![
        attr("action", "remove_phase"),
        attr("collection_id", collection_id),
        attr("phase_id", phase_id),
    ]))
}

pub fn execute_update_allowlist(
    deps: DepsMut,
    info: MessageInfo,
    collection_id: String,
    phase_id: String,
    add: Vec<String>,
    remove: Vec<String>,
) -> Result<Response, ContractError> {
    let phases = load_admin_phases(deps.as_ref(), &info.sender, &collection_id)?;
    phase_index(&phases, &phase_id)?;

    let key_prefix = (collection_id.as_str(), phase_id.as_str());
    for wallet in &add {
        let wallet = deps.api.addr_validate(wallet)?;
        ALLOWLIST.save(
            deps.storage,
            (key_prefix.0, key_prefix.1, &wallet),
            &Empty {},
        )?;
    }
    for wallet in &remove {
        let wallet = deps.api.addr_validate(wallet)?;
        ALLOWLIST.remove(deps.storage, (key_prefix.0, key_prefix.1, &wallet));
    }

    Ok(Response::new().add_attributes(vec![
        attr("action", "update_allowlist"),
        attr("collection_id", &collection_id),
        attr("phase_id", &phase_id),
        attr("added", add.len().to_string()),
        attr("removed", remove.len().to_string()),
    ]))
}

/// Buys `nft_amount` NFTs on the bonding curve of a collection.
///
/// Runs the phase gate, prices the batch unit by unit, enforces the trade
/// limits and takes the payment. Counters, phase statistics, the trade record,
/// the reveal and the holder reward are then all written in the same
/// transaction.
pub fn execute_mint(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collection_id: String,
    nft_amount: u64,
    max_total_cost: Option<Uint128>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut collection = load_collection(deps.storage, &collection_id)?;
    let mut escrow = ESCROWS.load(deps.storage, &collection_id)?;
    let now = env.block.time.seconds();
    let wallet = info.sender.clone();

    if !collection.is_active_at(now) || !escrow.is_active {
        return Err(ContractError::CurveInactive { collection_id });
    }
    check_mint_amount(&collection, &config.trade_limits, nft_amount)?;

    let mut phases = load_phases(deps.storage, &collection_id)?;
    let (active_index, multiplier) = {
        let gate = check_eligibility(
            deps.as_ref(),
            &collection_id,
            &phases,
            collection.public_price_multiplier,
            &wallet,
            now,
        )?;
        gate.ensure_allows(nft_amount)?;
        let index = gate
            .phase
            .and_then(|active| phases.iter().position(|p| p.id == active.id));
        (index, gate.price_multiplier)
    };

    let quote = quote_batch(
        &collection.curve,
        collection.current_raised,
        nft_amount,
        multiplier,
    )
    .map_err(ContractError::quote_unavailable)?;
    if let Some(max_total_cost) = max_total_cost {
        if quote.total_cost > max_total_cost {
            return Err(ContractError::TradeLimit {
                reason: format!(
                    "total cost {} is above the accepted {}",
                    quote.total_cost, max_total_cost
                ),
            });
        }
    }
    let day = now / SECONDS_PER_DAY;
    let daily_volume = check_trade_limits(
        deps.storage,
        &config.trade_limits,
        &collection_id,
        &wallet,
        day,
        &quote,
    )?;

    let paid = may_pay(&info, &escrow.denom)?;
    if paid < quote.total_cost {
        return Err(ContractError::InsufficientFunds {
            required: quote.total_cost,
            provided: paid,
        });
    }
    let refund = paid.checked_sub(quote.total_cost)?;
    let fee = config.mint_fee(quote.total_cost)?;
    let deposit = quote.total_cost.checked_sub(fee)?;

    let first_token_id = collection.current_sold + 1;
    collection.current_raised = collection.current_raised.checked_add(quote.total_cost)?;
    collection.current_sold = collection
        .current_sold
        .checked_add(nft_amount)
        .ok_or_else(|| StdError::generic_err("sold counter overflow"))?;
    escrow.total_deposited = escrow.total_deposited.checked_add(deposit)?;

    let phase_id = match active_index {
        Some(index) => {
            let phase = &mut phases[index];
            let key = (collection_id.as_str(), phase.id.as_str(), &wallet);
            let minted = PHASE_MINTS.may_load(deps.storage, key)?.unwrap_or_default();
            PHASE_MINTS.save(deps.storage, key, &(minted + nft_amount))?;
            phase.record_mint(nft_amount, quote.total_cost, minted == 0)?;
            Some(phase.id.clone())
        }
        None => None,
    };
    if active_index.is_some() {
        PHASES.save(deps.storage, &collection_id, &phases)?;
    }

    let stats_key = (collection_id.as_str(), &wallet);
    let mut stats = WALLET_STATS
        .may_load(deps.storage, stats_key)?
        .unwrap_or_default();
    stats.total_minted += nft_amount;
    stats.total_spent = stats.total_spent.checked_add(quote.total_cost)?;

    let reward = match &collection.rewards {
        Some(rewards) if rewards.enabled => {
            let balance = rewards.holding_token.query_balance(&deps.querier, &wallet)?;
            calculate_reward(balance, quote.total_cost, rewards, stats.accrued_reward)?
        }
        _ => RewardQuote::default(),
    };
    // rewards are paid from the escrow, never promise more than it holds
    let reward_amount = reward.reward.min(escrow.available());
    let reward_eligible = !reward_amount.is_zero();
    stats.accrued_reward = stats.accrued_reward.checked_add(reward_amount)?;
    stats.pending_reward = stats.pending_reward.checked_add(reward_amount)?;
    escrow.reserved_rewards = escrow.reserved_rewards.checked_add(reward_amount)?;
    WALLET_STATS.save(deps.storage, stats_key, &stats)?;

    let trade = MintTrade {
        id: collection.trade_count,
        collection_id: collection_id.clone(),
        wallet: wallet.clone(),
        phase_id: phase_id.clone(),
        nft_amount,
        first_token_id,
        price_per_nft: quote.price_per_nft,
        total_cost: quote.total_cost,
        timestamp: now,
        reward_eligible,
        estimated_reward: reward_amount,
        reward_tier: reward.tier.filter(|_| reward_eligible),
    };
    TRADES.save(deps.storage, (collection_id.as_str(), trade.id), &trade)?;
    collection.trade_count += 1;
    DAILY_VOLUME.save(
        deps.storage,
        (collection_id.as_str(), &wallet, day),
        &daily_volume,
    )?;

    let reveal = commit_reveal(&mut collection, now);
    COLLECTIONS.save(deps.storage, &collection_id, &collection)?;
    ESCROWS.save(deps.storage, &collection_id, &escrow)?;

    let mut response = Response::new().add_attributes(vec![
        attr("action", "mint"),
        attr("collection_id", &collection_id),
        attr("wallet", &wallet),
        attr("phase_id", phase_id.unwrap_or_else(|| "public".to_string())),
        attr("nfts_received", nft_amount.to_string()),
        attr("first_token_id", first_token_id.to_string()),
        attr("price_per_nft", quote.price_per_nft.to_string()),
        attr("total_cost", quote.total_cost),
        attr("price_impact", quote.price_impact.to_string()),
        attr("reveal_triggered", reveal.is_some().to_string()),
        attr("reward_eligible", reward_eligible.to_string()),
        attr("reward", reward_amount),
        attr("mint_fee", fee),
    ]);
    if !fee.is_zero() {
        response = response.add_message(BankMsg::Send {
            to_address: config.fee_collector.to_string(),
            amount: coins(fee.u128(), &escrow.denom),
        });
    }
    if !refund.is_zero() {
        response = response
            .add_message(BankMsg::Send {
                to_address: wallet.to_string(),
                amount: coins(refund.u128(), &escrow.denom),
            })
            .add_attribute("refund", refund);
    }
    if let Some(event) = reveal {
        response = response.add_event(event);
    }
    Ok(response)
}

/// Forces the reveal of a collection. Sets the manual trigger so that every
/// later evaluation agrees.
pub fn execute_reveal(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collection_id: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut collection = load_collection(deps.storage, &collection_id)?;
    assert_collection_admin(&config, &collection, &info.sender)?;
    if collection.revealed.is_some() {
        return Err(ContractError::AlreadyRevealed { collection_id });
    }

    collection.reveal_triggers.manual_reveal = true;
    let event = commit_reveal(&mut collection, env.block.time.seconds())
        .ok_or_else(|| StdError::generic_err("manual reveal was not recorded"))?;
    COLLECTIONS.save(deps.storage, &collection_id, &collection)?;

    Ok(Response::new()
        .add_attributes(vec![
            attr("action", "reveal"),
            attr("collection_id", collection_id),
        ])
        .add_event(event))
}

/// Anyone can commit a reveal that became due without a trade.
pub fn execute_evaluate_reveal(
    deps: DepsMut,
    env: Env,
    collection_id: String,
) -> Result<Response, ContractError> {
    let mut collection = load_collection(deps.storage, &collection_id)?;
    let reveal = commit_reveal(&mut collection, env.block.time.seconds());

    let mut response = Response::new().add_attributes(vec![
        attr("action", "evaluate_reveal"),
        attr("collection_id", &collection_id),
        attr("reveal_triggered", reveal.is_some().to_string()),
        attr("revealed", collection.revealed.is_some().to_string()),
    ]);
    if let Some(event) = reveal {
        COLLECTIONS.save(deps.storage, &collection_id, &collection)?;
        response = response.add_event(event);
    }
    Ok(response)
}

pub fn execute_claim_rewards(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collection_id: String,
) -> Result<Response, ContractError> {
    let mut collection = load_collection(deps.storage, &collection_id)?;
    let reveal = commit_due_reveal(deps.storage, &mut collection, env.block.time.seconds())?;
    if collection.revealed.is_none() {
        return Err(ContractError::RewardsLocked {});
    }

    let key = (collection_id.as_str(), &info.sender);
    let mut stats = WALLET_STATS.may_load(deps.storage, key)?.unwrap_or_default();
    let amount = stats.pending_reward;
    if amount.is_zero() {
        return Err(ContractError::NothingToClaim {});
    }

    let mut escrow = ESCROWS.load(deps.storage, &collection_id)?;
    escrow.distribute(amount)?;
    escrow.reserved_rewards = escrow.reserved_rewards.checked_sub(amount)?;
    stats.pending_reward = Uint128::zero();
    stats.claimed_reward = stats.claimed_reward.checked_add(amount)?;

    ESCROWS.save(deps.storage, &collection_id, &escrow)?;
    WALLET_STATS.save(deps.storage, key, &stats)?;

    Ok(Response::new()
        .add_message(BankMsg::Send {
            to_address: info.sender.to_string(),
            amount: coins(amount.u128(), &escrow.denom),
        })
        .add_attributes(vec![
            attr("action", "claim_rewards"),
            attr("collection_id", &collection_id),
            attr("wallet", &info.sender),
            attr("amount", amount),
        ])
        .add_events(reveal))
}

/// Pays out collected funds once the collection is revealed. Accrued holder
/// rewards stay reserved.
pub fn execute_withdraw_escrow(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collection_id: String,
    amount: Uint128,
    recipient: Option<String>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut collection = load_collection(deps.storage, &collection_id)?;
    assert_collection_admin(&config, &collection, &info.sender)?;
    let reveal = commit_due_reveal(deps.storage, &mut collection, env.block.time.seconds())?;
    if collection.revealed.is_none() {
        return Err(ContractError::EscrowLocked {});
    }
    if amount.is_zero() {
        return Err(ContractError::InvalidConfig {
            reason: "withdraw amount must be positive".to_string(),
        });
    }

    let mut escrow = ESCROWS.load(deps.storage, &collection_id)?;
    let available = escrow.available();
    if amount > available {
        return Err(ContractError::EscrowInsufficient {
            available,
            requested: amount,
        });
    }
    escrow.distribute(amount)?;
    ESCROWS.save(deps.storage, &collection_id, &escrow)?;

    let recipient = match recipient {
        Some(recipient) => deps.api.addr_validate(&recipient)?,
        None => info.sender,
    };

    Ok(Response::new()
        .add_message(BankMsg::Send {
            to_address: recipient.to_string(),
            amount: coins(amount.u128(), &escrow.denom),
        })
        .add_attributes(vec![
            attr("action", "withdraw_escrow"),
            attr("collection_id", collection_id),
            attr("recipient", recipient),
            attr("amount", amount),
            attr("total_distributed", escrow.total_distributed),
        ])
        .add_events(reveal))
}

pub fn execute_set_escrow_active(
    deps: DepsMut,
    info: MessageInfo,
    collection_id: String,
    active: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized {});
    }

    let mut escrow = ESCROWS
        .may_load(deps.storage, &collection_id)?
        .ok_or_else(|| ContractError::CollectionNotFound {
            collection_id: collection_id.clone(),
        })?;
    escrow.is_active = active;
    ESCROWS.save(deps.storage, &collection_id, &escrow)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "set_escrow_active"),
        attr("collection_id", collection_id),
        attr("active", active.to_string()),
    ]))
}

pub fn execute_update_config(
    deps: DepsMut,
    info: MessageInfo,
    payment_denom: Option<String>,
    trade_limits: Option<TradeLimits>,
    mint_fee_bps: Option<u16>,
    fee_collector: Option<String>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized {});
    }

    let mut attributes = vec![attr("action", "update_config")];

    if let Some(denom) = payment_denom {
        validate_denom(&denom)?;
        attributes.push(attr("payment_denom", &denom));
        config.payment_denom = denom;
    }
    if let Some(limits) = trade_limits {
        config.trade_limits = limits;
        attributes.push(attr("trade_limits", "updated"));
    }
    if let Some(bps) = mint_fee_bps {
        validate_mint_fee(bps)?;
        config.mint_fee_bps = bps;
        attributes.push(attr("mint_fee_bps", bps.to_string()));
    }
    if let Some(collector) = fee_collector {
        config.fee_collector = deps.api.addr_validate(&collector)?;
        attributes.push(attr("fee_collector", &config.fee_collector));
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes(attributes))
}

/// Records the reveal when a trigger is met. Returns the `reveal` event for a
/// new reveal, `None` otherwise.
fn commit_reveal(collection: &mut Collection, now: u64) -> Option<Event> {
    if collection.revealed.is_some() {
        return None;
    }
    let trigger = evaluate_reveal(
        &collection.reveal_triggers,
        collection.current_raised,
        collection.current_sold,
        now,
        None,
    )?;
    collection.revealed = Some(RevealRecord {
        revealed_at: now,
        trigger,
    });

    Some(
        Event::new("reveal")
            .add_attribute("collection_id", &collection.id)
            .add_attribute("trigger", trigger.to_string())
            .add_attribute("revealed_at", now.to_string())
            .add_attribute("current_raised", collection.current_raised)
            .add_attribute("current_sold", collection.current_sold.to_string()),
    )
}

/// Commits a reveal that became due since the last write, so payouts do not
/// wait for an `EvaluateReveal` call.
fn commit_due_reveal(
    storage: &mut dyn Storage,
    collection: &mut Collection,
    now: u64,
) -> StdResult<Option<Event>> {
    let reveal = commit_reveal(collection, now);
    if reveal.is_some() {
        COLLECTIONS.save(storage, &collection.id, collection)?;
    }
    Ok(reveal)
}

/// Bounds a requested amount by the remaining supply and the per-trade limit
/// before any pricing work is done.
pub(crate) fn check_mint_amount(
    collection: &Collection,
    limits: &TradeLimits,
    nft_amount: u64,
) -> Result<(), ContractError> {
    if nft_amount == 0 {
        return Err(ContractError::QuoteUnavailable {
            reason: "nft amount must be positive".to_string(),
        });
    }
    if nft_amount > collection.remaining_supply() {
        return Err(ContractError::NotEligible {
            reason: format!(
                "only {} NFTs left in {}",
                collection.remaining_supply(),
                collection.id
            ),
        });
    }
    if let Some(max) = limits.max_nfts_per_trade {
        if nft_amount > max {
            return Err(ContractError::TradeLimit {
                reason: format!("at most {} NFTs per trade", max),
            });
        }
    }
    Ok(())
}

/// Applies the price impact and daily volume limits. Returns the wallet's
/// daily volume including this trade.
fn check_trade_limits(
    storage: &dyn Storage,
    limits: &TradeLimits,
    collection_id: &str,
    wallet: &Addr,
    day: u64,
    quote: &BatchQuote,
) -> Result<Uint128, ContractError> {
    if let Some(max) = limits.max_price_impact {
        // quotes report the impact in percent
        let max_percent = max.checked_mul(Decimal::from_ratio(100u128, 1u128))?;
        if quote.price_impact > max_percent {
            return Err(ContractError::TradeLimit {
                reason: format!(
                    "price impact {}% is above {}%",
                    quote.price_impact, max_percent
                ),
            });
        }
    }

    let volume = DAILY_VOLUME
        .may_load(storage, (collection_id, wallet, day))?
        .unwrap_or_default()
        .checked_add(quote.total_cost)?;
    if let Some(max) = limits.max_daily_volume {
        if volume > max {
            return Err(ContractError::TradeLimit {
                reason: format!("daily volume {} would exceed {}", volume, max),
            });
        }
    }
    Ok(volume)
}

fn assert_collection_admin(
    config: &Config,
    collection: &Collection,
    sender: &Addr,
) -> Result<(), ContractError> {
    if *sender != config.owner && *sender != collection.creator {
        return Err(ContractError::Unauthorized {});
    }
    Ok(())
}

/// Phases of a collection the sender administers. Revealed collections no
/// longer accept phase changes.
fn load_admin_phases(
    deps: Deps,
    sender: &Addr,
    collection_id: &str,
) -> Result<Vec<Phase>, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let collection = load_collection(deps.storage, collection_id)?;
    assert_collection_admin(&config, &collection, sender)?;
    if collection.revealed.is_some() {
        return Err(ContractError::AlreadyRevealed {
            collection_id: collection_id.to_string(),
        });
    }
    Ok(load_phases(deps.storage, collection_id)?)
}

fn phase_index(phases: &[Phase], phase_id: &str) -> Result<usize, ContractError> {
    phases
        .iter()
        .position(|p| p.id == phase_id)
        .ok_or_else(|| ContractError::PhaseNotFound {
            phase_id: phase_id.to_string(),
        })
}

fn build_phase(api: &dyn Api, input: PhaseInput) -> Result<Phase, ContractError> {
    let phase = Phase {
        id: input.id,
        name: input.name,
        start: input.start,
        end: input.end,
        priority: input.priority,
        token_requirement: input.token_requirement,
        allowlist_only: input.allowlist_only,
        statistics: initial_statistics(&input.benefits),
        benefits: input.benefits,
    };
    phase.validate(api).map_err(ContractError::invalid_config)?;
    Ok(phase)
}

fn validate_collection(api: &dyn Api, collection: &Collection) -> Result<(), ContractError> {
    if collection.name.trim().is_empty() || collection.symbol.trim().is_empty() {
        return Err(ContractError::InvalidConfig {
            reason: "name and symbol can not be empty".to_string(),
        });
    }
    if collection.total_supply == 0 || collection.total_supply < collection.current_sold {
        return Err(ContractError::InvalidConfig {
            reason: format!(
                "total_supply must be positive and at least the {} already sold",
                collection.current_sold
            ),
        });
    }
    if collection.public_price_multiplier > Decimal::one() {
        return Err(ContractError::InvalidConfig {
            reason: "public price multiplier can not be above 1".to_string(),
        });
    }
    collection
        .curve
        .validate()
        .map_err(ContractError::invalid_config)?;
    collection
        .reveal_triggers
        .validate()
        .map_err(ContractError::invalid_config)?;
    if let Some(rewards) = &collection.rewards {
        rewards.validate(api).map_err(ContractError::invalid_config)?;
    }
    Ok(())
}

fn validate_collection_id(id: &str) -> Result<(), ContractError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_ID_LENGTH
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ContractError::InvalidConfig {
            reason: format!(
                "collection id must be 1-{} characters of [a-zA-Z0-9_-]",
                MAX_ID_LENGTH
            ),
        });
    }
    Ok(())
}

fn validate_mint_fee(bps: u16) -> Result<(), ContractError> {
    if bps > MAX_MINT_FEE_BPS {
        return Err(ContractError::InvalidConfig {
            reason: format!("mint fee {} bps is above {} bps", bps, MAX_MINT_FEE_BPS),
        });
    }
    Ok(())
}

fn validate_denom(denom: &str) -> StdResult<()> {
    if denom.trim().is_empty() {
        return Err(StdError::generic_err("payment denom can not be empty"));
    }
    Ok(())
}
