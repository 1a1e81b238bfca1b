use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{
    to_json_binary, Addr, Api, QuerierWrapper, QueryRequest, StdError, StdResult, Uint128,
    WasmQuery,
};
use cw20::{BalanceResponse, Cw20QueryMsg};

/// A token whose balance can be looked up for a wallet: either a bank denom or
/// a cw20 contract.
#[cw_serde]
pub enum TokenInfo {
    Native { denom: String },
    Cw20 { contract_addr: Addr },
}

impl fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenInfo::Native { denom } => write!(f, "{}", denom),
            TokenInfo::Cw20 { contract_addr } => write!(f, "{}", contract_addr),
        }
    }
}

impl TokenInfo {
    /// Returns the balance of `account` in this token.
    pub fn query_balance(&self, querier: &QuerierWrapper, account: &Addr) -> StdResult<Uint128> {
        match self {
            TokenInfo::Native { denom } => Ok(querier.query_balance(account, denom)?.amount),
            TokenInfo::Cw20 { contract_addr } => {
                cw20_get_balance(querier, contract_addr.clone(), account.clone())
            }
        }
    }

    pub fn check(&self, api: &dyn Api) -> StdResult<()> {
        match self {
            TokenInfo::Native { denom } if denom.trim().is_empty() => {
                Err(StdError::generic_err("Native token denom can not be empty"))
            }
            TokenInfo::Native { .. } => Ok(()),
            TokenInfo::Cw20 { contract_addr } => {
                api.addr_validate(contract_addr.as_str())?;
                Ok(())
            }
        }
    }
}

/// Helper function to get CW20 token balance of the user
pub fn cw20_get_balance(
    querier: &QuerierWrapper,
    token_address: Addr,
    account_addr: Addr,
) -> StdResult<Uint128> {
    let query: BalanceResponse = querier.query(&QueryRequest::Wasm(WasmQuery::Smart {
        contract_addr: token_address.into(),
        msg: to_json_binary(&Cw20QueryMsg::Balance {
            address: account_addr.into(),
        })?,
    }))?;

    Ok(query.balance)
}
