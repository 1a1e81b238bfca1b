use cosmwasm_std::{Addr, Decimal, Deps, StdResult};
use launchpad::phase::{remaining_mints, select_active_phase, Phase};

use crate::error::ContractError;
use crate::state::{ALLOWLIST, PHASE_MINTS};

/// Outcome of the phase gate for one wallet at one instant.
pub struct Eligibility<'a> {
    pub eligible: bool,
    pub phase: Option<&'a Phase>,
    pub reason: Option<String>,
    /// `None` when no phase is active
    pub remaining: Option<u64>,
    pub price_multiplier: Decimal,
}

impl Eligibility<'_> {
    /// Fails with `NotEligible` unless the wallet may mint `nft_amount` now.
    pub fn ensure_allows(&self, nft_amount: u64) -> Result<(), ContractError> {
        if !self.eligible {
            return Err(ContractError::NotEligible {
                reason: self.reason.clone().unwrap_or_default(),
            });
        }
        match self.remaining {
            Some(remaining) if nft_amount > remaining => Err(ContractError::NotEligible {
                reason: format!("wallet can mint {} more in this phase", remaining),
            }),
            _ => Ok(()),
        }
    }
}

/// Runs the phase gate. Without an active phase every wallet may mint at the
/// public multiplier. During a phase the wallet has to be on the allowlist
/// (for allowlist-only phases) and hold the required token.
pub fn check_eligibility<'a>(
    deps: Deps,
    collection_id: &str,
    phases: &'a [Phase],
    public_multiplier: Decimal,
    wallet: &Addr,
    now: u64,
) -> StdResult<Eligibility<'a>> {
    let phase = match select_active_phase(phases, now) {
        Some(phase) => phase,
        None => {
            return Ok(Eligibility {
                eligible: true,
                phase: None,
                reason: None,
                remaining: None,
                price_multiplier: public_multiplier,
            })
        }
    };

    let minted = wallet_minted(deps, collection_id, &phase.id, wallet)?;
    let mut gate = Eligibility {
        eligible: true,
        phase: Some(phase),
        reason: None,
        remaining: Some(remaining_mints(phase, minted)),
        price_multiplier: phase.benefits.price_multiplier,
    };

    if phase.allowlist_only
        && !ALLOWLIST.has(deps.storage, (collection_id, phase.id.as_str(), wallet))
    {
        gate.eligible = false;
        gate.reason = Some(format!("{} is not on the {} allowlist", wallet, phase.name));
        return Ok(gate);
    }

    if let Some(requirement) = &phase.token_requirement {
        let balance = requirement.token.query_balance(&deps.querier, wallet)?;
        if balance < requirement.minimum_balance {
            gate.eligible = false;
            gate.reason = Some(format!(
                "{} requires {} {}, wallet holds {}",
                phase.name, requirement.minimum_balance, requirement.symbol, balance
            ));
        }
    }

    Ok(gate)
}

pub fn wallet_minted(
    deps: Deps,
    collection_id: &str,
    phase_id: &str,
    wallet: &Addr,
) -> StdResult<u64> {
    Ok(PHASE_MINTS
        .may_load(deps.storage, (collection_id, phase_id, wallet))?
        .unwrap_or_default())
}
