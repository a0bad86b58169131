//! Core constants.

use std::time::Duration;

/// Gas limit attached to every forwarder meta-transaction.
///
/// Exact gas estimation of the inner call is impractical client-side, so a
/// generous fixed upper bound is signed into the request instead.
pub const META_TX_GAS_LIMIT: u64 = 1_000_000;

/// Safety margin the relay adds on top of its own `estimateGas` result when
/// executing a verified forwarder request.
pub const RELAY_GAS_BUFFER: u64 = 1_000_000;

/// Interval between transaction receipt lookups.
///
/// Read replicas and indexers lag block inclusion, so a single lookup right
/// after submission is unreliable; receipts are polled on this cadence until
/// the deadline.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Interval between balance lookups when waiting for a balance delta.
pub const BALANCE_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default bound on waiting for a single transaction receipt.
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Validity horizon signed into forwarder requests, in seconds.
pub const META_TX_VALIDITY_SECS: u64 = 3_600;

/// Length of the randomly generated claim solution string.
pub const SOLUTION_LENGTH: usize = 32;

/// Default validity horizon for a claim authorization, in seconds.
pub const DEFAULT_CLAIM_VALIDITY_SECS: u64 = 3_600;
