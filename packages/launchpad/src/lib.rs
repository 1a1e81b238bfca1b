//! Domain types and pure math shared by the bonding-curve launch contract.
//!
//! Nothing in this crate touches contract storage. The contract loads its
//! state, hands it to these functions and persists whatever they return.

pub mod asset;
pub mod curve;
pub mod math;
pub mod ownership;
pub mod phase;
pub mod reveal;
pub mod rewards;
