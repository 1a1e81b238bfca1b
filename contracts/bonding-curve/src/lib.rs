pub mod contract;
mod error;
pub mod msg;
pub mod query;
pub mod state;
pub mod whitelist;

pub use crate::error::ContractError;

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod testing;
