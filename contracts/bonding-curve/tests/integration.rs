use std::str::FromStr;

use bonding_curve::msg::{
    CollectionInput, EligibilityResponse, ExecuteMsg, InstantiateMsg, PendingRewardResponse,
    PhaseInput, QueryMsg, RevealStatusResponse,
};
use bonding_curve::state::{Escrow, MintTrade};
use cosmwasm_std::{coin, coins, Addr, Decimal, Uint128};
use cw20::Cw20Coin;
use cw_multi_test::{App, BankKeeper, ContractWrapper, Executor};
use launchpad::asset::TokenInfo;
use launchpad::curve::{CurveConfig, CurveShape};
use launchpad::phase::{PhaseBenefits, PhaseStatus, TokenRequirement};
use launchpad::reveal::{RevealTrigger, RevealTriggers};
use launchpad::rewards::{RewardTier, RewardTiers, TokenHolderRewards};

const OWNER: &str = "owner";
const DENOM: &str = "ulos";
const COLLECTION: &str = "losbros";

fn mock_app() -> App {
    let mut app = App::default();
    app.init_modules(|router, _api, storage| {
        router.bank = BankKeeper::new();
        for wallet in ["whale", "pleb", "buyer"] {
            router
                .bank
                .init_balance(storage, &Addr::unchecked(wallet), vec![coin(10_000, DENOM)])
                .unwrap();
        }
    });
    app
}

fn tier(min: u128, multiplier: &str) -> RewardTier {
    RewardTier {
        min_holdings: Uint128::new(min),
        reward_multiplier: Decimal::from_str(multiplier).unwrap(),
        max_reward: None,
    }
}

fn init_contracts(app: &mut App) -> (Addr, Addr) {
    let owner = Addr::unchecked(OWNER);

    let token_code_id = app.store_code(Box::new(ContractWrapper::new(
        cw20_base::contract::execute,
        cw20_base::contract::instantiate,
        cw20_base::contract::query,
    )));
    let token = app
        .instantiate_contract(
            token_code_id,
            owner.clone(),
            &cw20_base::msg::InstantiateMsg {
                name: String::from("Los Token"),
                symbol: String::from("LOL"),
                decimals: 6,
                initial_balances: vec![
                    Cw20Coin {
                        address: "whale".to_string(),
                        amount: Uint128::new(2_600_000),
                    },
                    Cw20Coin {
                        address: "pleb".to_string(),
                        amount: Uint128::new(10),
                    },
                ],
                mint: None,
                marketing: None,
            },
            &[],
            "LOL",
            None,
        )
        .unwrap();

    let launcher_code_id = app.store_code(Box::new(ContractWrapper::new(
        bonding_curve::contract::execute,
        bonding_curve::contract::instantiate,
        bonding_curve::contract::query,
    )));
    let launcher = app
        .instantiate_contract(
            launcher_code_id,
            owner.clone(),
            &InstantiateMsg {
                owner: None,
                payment_denom: DENOM.to_string(),
                trade_limits: None,
                mint_fee_bps: None,
                fee_collector: None,
            },
            &[],
            "launcher",
            None,
        )
        .unwrap();

    let now = app.block_info().time.seconds();
    let holding_token = TokenInfo::Cw20 {
        contract_addr: token.clone(),
    };
    let collection = CollectionInput {
        id: COLLECTION.to_string(),
        name: "Los Bros".to_string(),
        symbol: "LOSBROS".to_string(),
        creator: None,
        curve: CurveConfig {
            shape: CurveShape::Linear,
            bonding_cap: Uint128::new(10_000_000),
            starting_price: Decimal::from_str("100").unwrap(),
            max_price: Decimal::from_str("1000").unwrap(),
        },
        total_supply: 10_000,
        reveal_triggers: RevealTriggers {
            nft_sold_trigger: Some(8_000),
            ..RevealTriggers::default()
        },
        rewards: Some(TokenHolderRewards {
            enabled: true,
            reward_percentage: Decimal::percent(15),
            minimum_holdings: Uint128::new(100_000),
            holding_token: holding_token.clone(),
            tiers: RewardTiers {
                whale: tier(2_500_000, "2.0"),
                diamond: tier(1_000_000, "1.5"),
                gold: tier(500_000, "1.25"),
                silver: tier(100_000, "1.0"),
            },
            max_reward_per_wallet: None,
        }),
        public_price_multiplier: None,
        phases: vec![PhaseInput {
            id: "holders".to_string(),
            name: "Holders".to_string(),
            start: now - 10,
            end: now + 1_000,
            priority: 1,
            token_requirement: Some(TokenRequirement {
                token: holding_token,
                minimum_balance: Uint128::new(1_000_000),
                symbol: "LOL".to_string(),
                decimals: 6,
            }),
            allowlist_only: false,
            benefits: PhaseBenefits {
                price_multiplier: Decimal::percent(50),
                max_mints: 100,
                max_mints_per_wallet: 5,
            },
        }],
    };
    app.execute_contract(
        owner,
        launcher.clone(),
        &ExecuteMsg::CreateCollection { collection },
        &[],
    )
    .unwrap();

    (launcher, token)
}

fn mint_msg(nft_amount: u64) -> ExecuteMsg {
    ExecuteMsg::Mint {
        collection_id: COLLECTION.to_string(),
        nft_amount,
        max_total_cost: None,
    }
}

fn balance(app: &App, address: &str) -> u128 {
    app.wrap().query_balance(address, DENOM).unwrap().amount.u128()
}

#[test]
fn holder_phase_gates_on_cw20_balance() {
    let mut app = mock_app();
    let (launcher, _) = init_contracts(&mut app);

    let eligibility: EligibilityResponse = app
        .wrap()
        .query_wasm_smart(
            &launcher,
            &QueryMsg::Eligibility {
                collection_id: COLLECTION.to_string(),
                wallet: "pleb".to_string(),
            },
        )
        .unwrap();
    assert!(!eligibility.eligible);
    assert_eq!(
        eligibility.current_phase.unwrap().status,
        PhaseStatus::Active
    );

    let err = app
        .execute_contract(
            Addr::unchecked("pleb"),
            launcher.clone(),
            &mint_msg(1),
            &coins(100, DENOM),
        )
        .unwrap_err();
    assert_eq!(
        err.root_cause().to_string(),
        "Wallet is not eligible: Holders requires 1000000 LOL, wallet holds 10"
    );
    // failed mints keep the funds with the sender
    assert_eq!(balance(&app, "pleb"), 10_000);

    // half price for holders, the excess comes back
    app.execute_contract(
        Addr::unchecked("whale"),
        launcher.clone(),
        &mint_msg(1),
        &coins(100, DENOM),
    )
    .unwrap();
    assert_eq!(balance(&app, "whale"), 9_950);
    assert_eq!(balance(&app, launcher.as_str()), 50);
}

#[test]
fn full_launch_cycle() {
    let mut app = mock_app();
    let (launcher, _) = init_contracts(&mut app);

    app.execute_contract(
        Addr::unchecked("whale"),
        launcher.clone(),
        &mint_msg(1),
        &coins(50, DENOM),
    )
    .unwrap();

    // public sale once the holders phase is over
    app.update_block(|b| {
        b.height += 500;
        b.time = b.time.plus_seconds(2_000);
    });
    app.execute_contract(
        Addr::unchecked("buyer"),
        launcher.clone(),
        &mint_msg(1),
        &coins(101, DENOM),
    )
    .unwrap();

    let trades: Vec<MintTrade> = app
        .wrap()
        .query_wasm_smart(
            &launcher,
            &QueryMsg::Trades {
                collection_id: COLLECTION.to_string(),
                start_after: None,
                limit: None,
            },
        )
        .unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].phase_id, Some("holders".to_string()));
    assert_eq!(trades[0].total_cost, Uint128::new(50));
    // 15% * 2.0 of 50
    assert_eq!(trades[0].estimated_reward, Uint128::new(15));
    assert_eq!(trades[1].phase_id, None);
    assert_eq!(trades[1].first_token_id, 2);
    assert!(!trades[1].reward_eligible);

    let err = app
        .execute_contract(
            Addr::unchecked("whale"),
            launcher.clone(),
            &ExecuteMsg::ClaimRewards {
                collection_id: COLLECTION.to_string(),
            },
            &[],
        )
        .unwrap_err();
    assert_eq!(
        err.root_cause().to_string(),
        "Rewards can only be claimed after the reveal"
    );

    app.execute_contract(
        Addr::unchecked(OWNER),
        launcher.clone(),
        &ExecuteMsg::Reveal {
            collection_id: COLLECTION.to_string(),
        },
        &[],
    )
    .unwrap();
    let status: RevealStatusResponse = app
        .wrap()
        .query_wasm_smart(
            &launcher,
            &QueryMsg::RevealStatus {
                collection_id: COLLECTION.to_string(),
            },
        )
        .unwrap();
    assert_eq!(status.trigger, Some(RevealTrigger::Manual));

    let err = app
        .execute_contract(
            Addr::unchecked("buyer"),
            launcher.clone(),
            &mint_msg(1),
            &coins(200, DENOM),
        )
        .unwrap_err();
    assert_eq!(
        err.root_cause().to_string(),
        "Bonding curve of collection losbros is not active"
    );

    app.execute_contract(
        Addr::unchecked("whale"),
        launcher.clone(),
        &ExecuteMsg::ClaimRewards {
            collection_id: COLLECTION.to_string(),
        },
        &[],
    )
    .unwrap();
    assert_eq!(balance(&app, "whale"), 10_000 - 50 + 15);

    let pending: PendingRewardResponse = app
        .wrap()
        .query_wasm_smart(
            &launcher,
            &QueryMsg::PendingReward {
                collection_id: COLLECTION.to_string(),
                wallet: "whale".to_string(),
            },
        )
        .unwrap();
    assert_eq!(pending.claimed, Uint128::new(15));
    assert!(!pending.claimable);

    // 50 + 101 deposited, 15 paid as reward
    let err = app
        .execute_contract(
            Addr::unchecked(OWNER),
            launcher.clone(),
            &ExecuteMsg::WithdrawEscrow {
                collection_id: COLLECTION.to_string(),
                amount: Uint128::new(137),
                recipient: Some("treasury".to_string()),
            },
            &[],
        )
        .unwrap_err();
    assert_eq!(
        err.root_cause().to_string(),
        "Escrow has 136 available, requested 137"
    );

    app.execute_contract(
        Addr::unchecked(OWNER),
        launcher.clone(),
        &ExecuteMsg::WithdrawEscrow {
            collection_id: COLLECTION.to_string(),
            amount: Uint128::new(136),
            recipient: Some("treasury".to_string()),
        },
        &[],
    )
    .unwrap();
    assert_eq!(balance(&app, "treasury"), 136);
    assert_eq!(balance(&app, launcher.as_str()), 0);

    let escrow: Escrow = app
        .wrap()
        .query_wasm_smart(
            &launcher,
            &QueryMsg::Escrow {
                collection_id: COLLECTION.to_string(),
            },
        )
        .unwrap();
    assert_eq!(escrow.total_deposited, escrow.total_distributed);
}
