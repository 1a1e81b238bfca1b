use cosmwasm_std::{OverflowError, StdError, Uint128};
use cw_utils::PaymentError;
use thiserror::Error;

/// Every failure of the launch contract. Any error not covered by a named
/// variant surfaces through `Std`.
#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Payment(#[from] PaymentError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Collection {collection_id} not found")]
    CollectionNotFound { collection_id: String },

    #[error("Collection {collection_id} already exists")]
    CollectionExists { collection_id: String },

    #[error("Bonding curve of collection {collection_id} is not active")]
    CurveInactive { collection_id: String },

    #[error("Collection {collection_id} is already revealed")]
    AlreadyRevealed { collection_id: String },

    #[error("Wallet is not eligible: {reason}")]
    NotEligible { reason: String },

    #[error("Insufficient funds: required {required}, provided {provided}")]
    InsufficientFunds {
        required: Uint128,
        provided: Uint128,
    },

    #[error("Quote unavailable: {reason}")]
    QuoteUnavailable { reason: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Trade limit exceeded: {reason}")]
    TradeLimit { reason: String },

    #[error("Phase {phase_id} not found")]
    PhaseNotFound { phase_id: String },

    #[error("Escrow has {available} available, requested {requested}")]
    EscrowInsufficient {
        available: Uint128,
        requested: Uint128,
    },

    #[error("Escrow funds are locked until the collection is revealed")]
    EscrowLocked {},

    #[error("Rewards can only be claimed after the reveal")]
    RewardsLocked {},

    #[error("Nothing to claim")]
    NothingToClaim {},

    #[error("Cannot migrate from different contract type: {previous_contract}")]
    CannotMigrate { previous_contract: String },

    #[error("Semver parsing error: {0}")]
    SemVer(String),
}

impl From<semver::Error> for ContractError {
    fn from(err: semver::Error) -> Self {
        Self::SemVer(err.to_string())
    }
}

impl From<OverflowError> for ContractError {
    fn from(o: OverflowError) -> Self {
        StdError::from(o).into()
    }
}

impl ContractError {
    /// Wraps a validation failure from the shared launchpad types.
    pub fn invalid_config(err: StdError) -> Self {
        match err {
            StdError::GenericErr { msg, .. } => ContractError::InvalidConfig { reason: msg },
            other => ContractError::InvalidConfig {
                reason: other.to_string(),
            },
        }
    }

    pub fn quote_unavailable(err: StdError) -> Self {
        match err {
            StdError::GenericErr { msg, .. } => ContractError::QuoteUnavailable { reason: msg },
            other => ContractError::QuoteUnavailable {
                reason: other.to_string(),
            },
        }
    }
}
