//! Policy checks run by the gatekeeper.
//!
//! Each check is independent and returns `Some(BlockReason)` to block.

pub mod danger;
pub mod delegation;
pub mod integrity;
