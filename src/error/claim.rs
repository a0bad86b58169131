use alloy::primitives::Address;
use thiserror::Error;

/// Errors related to the claim protocol.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The authorization's validity window has already passed.
    #[error("claim authorization expired at {valid_until}, now {now}")]
    Expired {
        /// Expiry of the authorization as a unix timestamp.
        valid_until: u64,
        /// Current unix timestamp at the time of the check.
        now: u64,
    },
    /// The secret has already been claimed on-chain.
    ///
    /// Terminal: a secret is claimable at most once, so retrying is useless.
    #[error("secret already claimed")]
    AlreadyClaimed,
    /// The solution does not hash to the committed secret.
    #[error("solution does not match committed secret")]
    SolutionMismatch,
    /// The authorization was signed by the wrong verifier key.
    #[error("claim authorization signed by {got}, trusted verifier is {expected}")]
    UntrustedVerifier {
        /// The configured trusted verifier.
        expected: Address,
        /// The address the authorization signature recovered to.
        got: Address,
    },
    /// A bridged claim was attempted without a validated route payload.
    ///
    /// The route must be fetched and validated before the claim transaction
    /// is constructed, since the claim and the bridge hop share one
    /// transaction.
    #[error("bridged claim requires a pre-validated route")]
    MissingRoute,
}
