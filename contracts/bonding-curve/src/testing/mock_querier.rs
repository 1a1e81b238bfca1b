use std::collections::HashMap;

use cosmwasm_std::testing::{
    mock_dependencies_with_balances, MockApi, MockQuerier, MockStorage,
};
use cosmwasm_std::{
    from_json, to_json_binary, Coin, ContractResult, Empty, OwnedDeps, SystemError, SystemResult,
    Uint128, WasmQuery,
};
use cw20::{BalanceResponse, Cw20QueryMsg};

/// Mock dependencies with bank balances plus a single cw20 token contract
/// answering balance queries.
pub fn mock_dependencies_with_token(
    bank: &[(&str, &[Coin])],
    token: &str,
    holders: &[(&str, u128)],
) -> OwnedDeps<MockStorage, MockApi, MockQuerier, Empty> {
    let mut deps = mock_dependencies_with_balances(bank);
    set_cw20_balances(&mut deps.querier, token, holders);
    deps
}

pub fn set_cw20_balances(querier: &mut MockQuerier, token: &str, holders: &[(&str, u128)]) {
    let token = token.to_string();
    let balances: HashMap<String, Uint128> = holders
        .iter()
        .map(|(holder, amount)| (holder.to_string(), Uint128::new(*amount)))
        .collect();

    querier.update_wasm(move |query| match query {
        WasmQuery::Smart { contract_addr, msg } if *contract_addr == token => {
            match from_json::<Cw20QueryMsg>(msg) {
                Ok(Cw20QueryMsg::Balance { address }) => {
                    let balance = balances.get(&address).copied().unwrap_or_default();
                    SystemResult::Ok(ContractResult::Ok(
                        to_json_binary(&BalanceResponse { balance }).unwrap(),
                    ))
                }
                _ => SystemResult::Err(SystemError::UnsupportedRequest {
                    kind: "cw20 query".to_string(),
                }),
            }
        }
        WasmQuery::Smart { contract_addr, .. } => SystemResult::Err(SystemError::NoSuchContract {
            addr: contract_addr.clone(),
        }),
        _ => SystemResult::Err(SystemError::UnsupportedRequest {
            kind: "wasm".to_string(),
        }),
    });
}
