//! Claim protocol for transfers to unknown recipients.
//!
//! Value sent to an unresolved identifier sits locked on-chain against
//! `keccak256(solution)`. Once the recipient resolves to an address, the
//! trusted verifier signs an authorization binding the secret to that
//! address with an expiry, and the receiver claims by revealing the
//! solution. Per commitment the lifecycle is
//! `committed → authorized → claimed | expired`.

use crate::{
    bridge::{RouteQuery, RouteSource},
    error::{ClaimError, SednError},
    signers::PayloadSigner,
    types::{SednCall, Secret, Solution, TransactionDescriptor},
};
use alloy::primitives::{Address, B256, ChainId, Keccak256, Signature, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lifecycle state of one commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimState {
    /// The secret is committed on-chain with a locked amount.
    Committed,
    /// The verifier has bound the secret to a receiver address.
    Authorized,
    /// The locked value was paid out. Terminal: the contract marks the
    /// secret claimed, and a second claim fails deterministically.
    Claimed,
    /// The authorization expired unclaimed. The funds stay locked and are
    /// recoverable only through a separate administrative path.
    Expired,
}

/// An authorization binding a committed secret to a receiver address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimAuthorization {
    /// The resolved receiver to pay.
    pub receiver: Address,
    /// Expiry as a unix timestamp; must still be in the future at claim time.
    pub valid_until: u64,
    /// The commitment being authorized.
    pub secret: Secret,
}

impl ClaimAuthorization {
    /// The packed hash the verifier signs:
    /// `keccak256(receiver ‖ validUntil ‖ secret)`.
    ///
    /// The field ordering is a compatibility constant of the deployed
    /// on-chain verifier logic; changing it strands otherwise-valid
    /// authorizations.
    pub fn signing_hash(&self) -> B256 {
        let mut hasher = Keccak256::new();
        hasher.update(self.receiver);
        hasher.update(U256::from(self.valid_until).to_be_bytes::<32>());
        hasher.update(self.secret.0);
        hasher.finalize()
    }

    /// Signs the authorization with the trusted verifier key.
    ///
    /// The hash is signed under the EIP-191 personal-message prefix (not
    /// EIP-712) and decomposed into `(v, r, s)` for on-chain verification.
    pub async fn sign(
        &self,
        verifier: &dyn PayloadSigner,
    ) -> eyre::Result<SignedClaimAuthorization> {
        let signature = verifier.sign_message(self.signing_hash().as_slice()).await?;
        Ok(SignedClaimAuthorization {
            authorization: *self,
            v: 27 + signature.v() as u8,
            r: B256::from(signature.r().to_be_bytes::<32>()),
            s: B256::from(signature.s().to_be_bytes::<32>()),
        })
    }
}

/// A verifier-signed [`ClaimAuthorization`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedClaimAuthorization {
    /// The signed authorization.
    pub authorization: ClaimAuthorization,
    /// Recovery id, 27 or 28.
    pub v: u8,
    /// `r` component.
    pub r: B256,
    /// `s` component.
    pub s: B256,
}

impl SignedClaimAuthorization {
    /// Recovers the signing verifier address.
    pub fn recover_verifier(&self) -> Result<Address, SednError> {
        let signature = Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            self.v == 28,
        );
        Ok(signature.recover_address_from_msg(self.authorization.signing_hash().as_slice())?)
    }

    /// Checks the authorization against the configured trusted verifier and
    /// the clock.
    pub fn ensure_valid(&self, trusted_verifier: Address, now: u64) -> Result<(), ClaimError> {
        let got = self.recover_verifier().map_err(|_| ClaimError::UntrustedVerifier {
            expected: trusted_verifier,
            got: Address::ZERO,
        })?;
        if got != trusted_verifier {
            return Err(ClaimError::UntrustedVerifier { expected: trusted_verifier, got });
        }
        if self.authorization.valid_until <= now {
            return Err(ClaimError::Expired {
                valid_until: self.authorization.valid_until,
                now,
            });
        }
        Ok(())
    }
}

/// One commitment tracked through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingClaim {
    /// Chain holding the locked value.
    pub chain_id: ChainId,
    /// The commitment.
    pub secret: Secret,
    /// The locked amount.
    pub amount: U256,
    /// Current lifecycle state.
    pub state: ClaimState,
    /// The authorization, once the verifier issued one.
    pub authorization: Option<SignedClaimAuthorization>,
}

impl PendingClaim {
    /// Records a commitment freshly observed on-chain.
    pub fn committed(chain_id: ChainId, secret: Secret, amount: U256) -> Self {
        Self { chain_id, secret, amount, state: ClaimState::Committed, authorization: None }
    }

    /// Attaches a verifier authorization, advancing to `Authorized`.
    pub fn authorize(
        &mut self,
        authorization: SignedClaimAuthorization,
        trusted_verifier: Address,
        now: u64,
    ) -> Result<(), ClaimError> {
        match self.state {
            ClaimState::Committed => {}
            ClaimState::Claimed => return Err(ClaimError::AlreadyClaimed),
            ClaimState::Expired => {
                return Err(ClaimError::Expired {
                    valid_until: self.authorization.map(|a| a.authorization.valid_until).unwrap_or(0),
                    now,
                });
            }
            // Re-authorizing (e.g. with a fresh expiry) is allowed.
            ClaimState::Authorized => {}
        }
        if authorization.authorization.secret != self.secret {
            return Err(ClaimError::SolutionMismatch);
        }
        authorization.ensure_valid(trusted_verifier, now)?;
        self.authorization = Some(authorization);
        self.state = ClaimState::Authorized;
        Ok(())
    }

    /// Marks the commitment expired if its authorization lapsed.
    pub fn expire_if_due(&mut self, now: u64) {
        if self.state == ClaimState::Authorized
            && self.authorization.is_some_and(|a| a.authorization.valid_until <= now)
        {
            self.state = ClaimState::Expired;
        }
    }

    /// Marks the commitment claimed.
    ///
    /// A second call is an error: claiming is single-use by contract, and
    /// callers must treat it as non-retryable.
    pub fn mark_claimed(&mut self) -> Result<(), ClaimError> {
        if self.state == ClaimState::Claimed {
            return Err(ClaimError::AlreadyClaimed);
        }
        self.state = ClaimState::Claimed;
        Ok(())
    }
}

/// Builds the same-chain claim descriptor for a resolved receiver.
///
/// The descriptor executes as the receiver: the claim is relayed like any
/// other meta-transaction, so the receiver needs no gas.
pub fn build_claim(
    chain_id: ChainId,
    solution: &Solution,
    signed: &SignedClaimAuthorization,
) -> Result<TransactionDescriptor, ClaimError> {
    if solution.secret() != signed.authorization.secret {
        return Err(ClaimError::SolutionMismatch);
    }
    Ok(TransactionDescriptor::new(
        chain_id,
        signed.authorization.receiver,
        SednCall::Claim {
            solution: solution.clone(),
            secret: signed.authorization.secret,
            till: U256::from(signed.authorization.valid_until),
            v: signed.v,
            r: signed.r,
            s: signed.s,
        },
    ))
}

/// Builds a claim that bridges the released value to another chain in the
/// same transaction.
///
/// The route is fetched and validated before the descriptor is constructed:
/// claim and bridge hop are one transaction, so a bad payload would strand
/// the released funds rather than fail cleanly.
pub async fn build_bridge_claim(
    route_source: &dyn RouteSource,
    query: RouteQuery,
    solution: &Solution,
    signed: &SignedClaimAuthorization,
) -> Result<TransactionDescriptor, SednError> {
    if solution.secret() != signed.authorization.secret {
        return Err(ClaimError::SolutionMismatch.into());
    }
    let route = route_source.best_route(&query).await?;
    debug!(
        from_chain = query.from_chain_id,
        to_chain = query.to_chain_id,
        bridge = %route.bridge_impl,
        "routing bridged claim"
    );
    Ok(TransactionDescriptor::new(
        query.from_chain_id,
        signed.authorization.receiver,
        SednCall::BridgeClaim {
            solution: solution.clone(),
            secret: signed.authorization.secret,
            till: U256::from(signed.authorization.valid_until),
            v: signed.v,
            r: signed.r,
            s: signed.s,
            user_request: route.user_request,
            bridge_impl: route.bridge_impl,
        },
    ))
}

/// Classifies a claim revert reason into the protocol's terminal states.
///
/// "Already claimed" and "expired" are deterministic contract outcomes and
/// must not be retried; anything else is surfaced as-is.
pub fn classify_claim_revert(reason: Option<&str>) -> Option<ClaimError> {
    let reason = reason?.to_ascii_lowercase();
    if reason.contains("claimed") {
        Some(ClaimError::AlreadyClaimed)
    } else if reason.contains("expired") || reason.contains("till") {
        Some(ClaimError::Expired { valid_until: 0, now: 0 })
    } else {
        None
    }
}
