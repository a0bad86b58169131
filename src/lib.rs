//! # Sedn Core
//!
//! Transfer-execution core for multi-chain, gasless stablecoin transfers: a
//! transfer intent becomes signed forwarder meta-transactions, relayed,
//! confirmed, and, for recipients not yet known to the system, later claimed
//! against a secret commitment. Withdrawals aggregate per-chain balances
//! into a single destination payout, bridging where needed.

pub mod bridge;
pub mod chains;
pub mod claims;
pub mod config;
pub mod constants;
pub mod error;
pub mod execution;
pub mod executor;
pub mod fees;
pub mod forwarder;
pub mod planner;
pub mod poll;
pub mod relay;
pub mod signers;
pub mod types;
pub mod withdraw;
