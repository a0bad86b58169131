//! Bounded polling primitives.
//!
//! Chain state reaches read replicas and indexers some time after block
//! inclusion, so a single lookup right after submission is unreliable;
//! bounded re-polling is required for correctness, not just UX. Each wait is
//! a plain suspend-on-await loop with an explicit deadline: no timer state
//! survives past the call, and cancellation is the timeout itself.

use crate::{
    constants::{BALANCE_POLL_INTERVAL, RECEIPT_POLL_INTERVAL},
    error::{SednError, TimeoutError},
    types::{IERC20, ISedn},
};
use alloy::{
    primitives::{Address, B256, I256, U256},
    providers::{DynProvider, Provider},
    rpc::types::TransactionReceipt,
};
use std::{future::Future, time::Duration};
use tokio::time::{Instant, sleep};
use tracing::trace;

/// How a balance delta qualifies as the awaited change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceComparator {
    /// Strictly increased relative to the baseline. Recipient-side claim
    /// confirmation.
    Increased,
    /// Changed in either direction. Sender-side movement confirmation.
    Changed,
}

impl BalanceComparator {
    fn matches(&self, baseline: U256, current: U256) -> bool {
        match self {
            Self::Increased => current > baseline,
            Self::Changed => current != baseline,
        }
    }
}

/// Polls `lookup` every `interval` until it yields a value or `max_wait`
/// elapses.
///
/// A timeout is not proof of failure: the awaited condition may still
/// materialize after the deadline, so callers must treat it as "unknown",
/// distinctly from a revert.
pub async fn wait_until<T, F, Fut>(
    max_wait: Duration,
    interval: Duration,
    target: &'static str,
    mut lookup: F,
) -> Result<T, SednError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, SednError>>,
{
    let deadline = Instant::now() + max_wait;
    loop {
        if let Some(value) = lookup().await? {
            return Ok(value);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(TimeoutError { max_wait, target }.into());
        }
        trace!(?target, remaining = ?(deadline - now), "condition not met, polling again");
        sleep(interval.min(deadline - now)).await;
    }
}

/// Waits for the receipt of `tx_hash`, polling every
/// [`RECEIPT_POLL_INTERVAL`].
pub async fn watch_receipt(
    provider: &DynProvider,
    tx_hash: B256,
    max_wait: Duration,
) -> Result<TransactionReceipt, SednError> {
    wait_until(max_wait, RECEIPT_POLL_INTERVAL, "transaction receipt", || async move {
        Ok(provider.get_transaction_receipt(tx_hash).await?)
    })
    .await
}

/// Waits for a balance read through `fetch` to satisfy `comparator` against
/// `baseline`, polling every [`BALANCE_POLL_INTERVAL`].
///
/// Returns the signed delta relative to the baseline.
pub async fn watch_balance<F, Fut>(
    max_wait: Duration,
    baseline: U256,
    comparator: BalanceComparator,
    mut fetch: F,
) -> Result<I256, SednError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<U256, SednError>>,
{
    wait_until(max_wait, BALANCE_POLL_INTERVAL, "balance change", move || {
        let current = fetch();
        async move {
            let current = current.await?;
            if comparator.matches(baseline, current) {
                return Ok(Some(signed_delta(baseline, current)?));
            }
            Ok(None)
        }
    })
    .await
}

/// Waits for a change in `account`'s external token balance.
pub async fn watch_token_balance(
    provider: &DynProvider,
    token: Address,
    account: Address,
    baseline: U256,
    comparator: BalanceComparator,
    max_wait: Duration,
) -> Result<I256, SednError> {
    let token = IERC20::new(token, provider.clone());
    watch_balance(max_wait, baseline, comparator, || {
        let token = token.clone();
        async move { Ok(token.balanceOf(account).call().await?) }
    })
    .await
}

/// Waits for a change in `account`'s in-protocol balance.
pub async fn watch_sedn_balance(
    provider: &DynProvider,
    sedn: Address,
    account: Address,
    baseline: U256,
    comparator: BalanceComparator,
    max_wait: Duration,
) -> Result<I256, SednError> {
    let sedn = ISedn::new(sedn, provider.clone());
    watch_balance(max_wait, baseline, comparator, || {
        let sedn = sedn.clone();
        async move { Ok(sedn.balanceOf(account).call().await?) }
    })
    .await
}

fn signed_delta(baseline: U256, current: U256) -> Result<I256, SednError> {
    let delta = if current >= baseline {
        I256::try_from(current - baseline)
    } else {
        I256::try_from(baseline - current).map(|delta| -delta)
    };
    delta.map_err(|_| eyre::eyre!("balance delta exceeds I256 range").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test(start_paused = true)]
    async fn unchanged_balance_times_out_idempotently() {
        let max_wait = Duration::from_secs(60);
        for _ in 0..2 {
            let result = watch_balance(max_wait, U256::from(1_000_000), BalanceComparator::Increased, || async {
                Ok(U256::from(1_000_000))
            })
            .await;
            assert!(matches!(result, Err(SednError::Timeout(_))));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn increase_yields_positive_delta() {
        let calls = AtomicU64::new(0);
        let delta = watch_balance(
            Duration::from_secs(60),
            U256::from(1_000_000),
            BalanceComparator::Increased,
            || {
                let seen = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    // The chain catches up on the second poll tick.
                    if seen == 0 {
                        Ok(U256::from(1_000_000))
                    } else {
                        Ok(U256::from(1_500_000))
                    }
                }
            },
        )
        .await
        .unwrap();
        assert_eq!(delta, I256::try_from(500_000).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn changed_comparator_sees_decreases() {
        let delta = watch_balance(
            Duration::from_secs(60),
            U256::from(1_000_000),
            BalanceComparator::Changed,
            || async { Ok(U256::ZERO) },
        )
        .await
        .unwrap();
        assert_eq!(delta, -I256::try_from(1_000_000).unwrap());

        // A decrease is not an increase.
        let result = watch_balance(
            Duration::from_secs(60),
            U256::from(1_000_000),
            BalanceComparator::Increased,
            || async { Ok(U256::ZERO) },
        )
        .await;
        assert!(matches!(result, Err(SednError::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_until_returns_as_soon_as_the_lookup_yields() {
        let start = Instant::now();
        let value = wait_until(Duration::from_secs(60), Duration::from_secs(5), "value", || async {
            Ok(Some(42))
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_errors_propagate_immediately() {
        let result: Result<(), _> =
            wait_until(Duration::from_secs(60), Duration::from_secs(5), "value", || async {
                Err(eyre::eyre!("rpc exploded").into())
            })
            .await;
        assert!(matches!(result, Err(SednError::Internal(_))));
    }
}
