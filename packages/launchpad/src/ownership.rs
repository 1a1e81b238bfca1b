use cosmwasm_schema::cw_serde;
use cosmwasm_std::{attr, Addr, DepsMut, Env, MessageInfo, Response, StdError, StdResult};
use cw_storage_plus::Item;

/// Longest a proposal may stay open (14 days)
pub const MAX_PROPOSAL_TTL: u64 = 1_209_600;

/// A pending transfer of contract ownership.
#[cw_serde]
pub struct OwnershipProposal {
    pub owner: Addr,
    /// Block time (seconds) after which the proposal can no longer be claimed
    pub ttl: u64,
}

/// Creates a proposal to hand the contract over to `new_owner`.
/// Only the current `owner` may call this.
pub fn propose_new_owner(
    deps: DepsMut,
    info: MessageInfo,
    env: Env,
    new_owner: String,
    expires_in: u64,
    owner: Addr,
    proposal: Item<OwnershipProposal>,
) -> StdResult<Response> {
    if info.sender != owner {
        return Err(StdError::generic_err("Unauthorized"));
    }

    let new_owner = deps.api.addr_validate(&new_owner)?;
    if new_owner == owner {
        return Err(StdError::generic_err("New owner cannot be same"));
    }
    if expires_in > MAX_PROPOSAL_TTL {
        return Err(StdError::generic_err(format!(
            "Parameter expires_in cannot be higher than {}",
            MAX_PROPOSAL_TTL
        )));
    }

    proposal.save(
        deps.storage,
        &OwnershipProposal {
            owner: new_owner.clone(),
            ttl: env.block.time.seconds() + expires_in,
        },
    )?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "propose_new_owner"),
        attr("new_owner", new_owner),
    ]))
}

pub fn drop_ownership_proposal(
    deps: DepsMut,
    info: MessageInfo,
    owner: Addr,
    proposal: Item<OwnershipProposal>,
) -> StdResult<Response> {
    if info.sender != owner {
        return Err(StdError::generic_err("Unauthorized"));
    }

    proposal.remove(deps.storage);

    Ok(Response::new().add_attribute("action", "drop_ownership_proposal"))
}

/// Accepts a pending proposal. `callback` stores the new owner wherever the
/// calling contract keeps it.
pub fn claim_ownership(
    deps: DepsMut,
    info: MessageInfo,
    env: Env,
    proposal: Item<OwnershipProposal>,
    callback: fn(DepsMut, Addr) -> StdResult<()>,
) -> StdResult<Response> {
    let p = proposal
        .may_load(deps.storage)?
        .ok_or_else(|| StdError::generic_err("Ownership proposal not found"))?;

    if info.sender != p.owner {
        return Err(StdError::generic_err("Unauthorized"));
    }
    if env.block.time.seconds() > p.ttl {
        return Err(StdError::generic_err("Ownership proposal expired"));
    }

    proposal.remove(deps.storage);
    callback(deps, p.owner.clone())?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "claim_ownership"),
        attr("new_owner", p.owner),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::{mock_dependencies, mock_env, mock_info};

    const PROPOSAL: Item<OwnershipProposal> = Item::new("ownership_proposal");
    const OWNER: Item<Addr> = Item::new("owner");

    fn store_owner(deps: DepsMut, owner: Addr) -> StdResult<()> {
        OWNER.save(deps.storage, &owner)
    }

    #[test]
    fn proposal_flow() {
        let mut deps = mock_dependencies();
        let owner = Addr::unchecked("owner");
        OWNER.save(deps.as_mut().storage, &owner).unwrap();

        let err = propose_new_owner(
            deps.as_mut(),
            mock_info("stranger", &[]),
            mock_env(),
            "heir".to_string(),
            100,
            owner.clone(),
            PROPOSAL,
        )
        .unwrap_err();
        assert_eq!(err, StdError::generic_err("Unauthorized"));

        propose_new_owner(
            deps.as_mut(),
            mock_info("owner", &[]),
            mock_env(),
            "heir".to_string(),
            100,
            owner,
            PROPOSAL,
        )
        .unwrap();

        let err = claim_ownership(
            deps.as_mut(),
            mock_info("stranger", &[]),
            mock_env(),
            PROPOSAL,
            store_owner,
        )
        .unwrap_err();
        assert_eq!(err, StdError::generic_err("Unauthorized"));

        let mut late = mock_env();
        late.block.time = late.block.time.plus_seconds(101);
        let err = claim_ownership(
            deps.as_mut(),
            mock_info("heir", &[]),
            late,
            PROPOSAL,
            store_owner,
        )
        .unwrap_err();
        assert_eq!(err, StdError::generic_err("Ownership proposal expired"));

        claim_ownership(
            deps.as_mut(),
            mock_info("heir", &[]),
            mock_env(),
            PROPOSAL,
            store_owner,
        )
        .unwrap();
        assert_eq!(OWNER.load(&deps.storage).unwrap(), Addr::unchecked("heir"));
        assert!(PROPOSAL.may_load(&deps.storage).unwrap().is_none());
    }

    #[test]
    fn ttl_is_bounded() {
        let mut deps = mock_dependencies();
        let err = propose_new_owner(
            deps.as_mut(),
            mock_info("owner", &[]),
            mock_env(),
            "heir".to_string(),
            MAX_PROPOSAL_TTL + 1,
            Addr::unchecked("owner"),
            PROPOSAL,
        )
        .unwrap_err();
        assert!(err.to_string().contains("expires_in"));
    }
}
