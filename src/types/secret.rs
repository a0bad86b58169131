//! Commit-reveal primitives for transfers to unknown recipients.

use crate::constants::SOLUTION_LENGTH;
use alloy::primitives::{B256, keccak256};
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The commitment funds are locked against on-chain.
///
/// The contract stores locked value keyed by this hash, not by recipient
/// identity: whoever presents the matching [`Solution`] is paid.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(pub B256);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&self.0).finish()
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The claim credential, generated client-side at send time.
///
/// Never leaves the orchestration layer until claim time; it reaches the
/// eventual claimant out of band. The mapping from external recipient
/// identifier to solution lives outside the chain.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Solution(String);

impl Solution {
    /// Generates a fresh random solution.
    ///
    /// A new solution is drawn per transfer; reusing one across transfers
    /// would let an earlier claimant unlock later commitments.
    pub fn generate() -> Self {
        let solution = rand::rng()
            .sample_iter(Alphanumeric)
            .take(SOLUTION_LENGTH)
            .map(char::from)
            .collect();
        Self(solution)
    }

    /// The commitment for this solution.
    pub fn secret(&self) -> Secret {
        Secret(keccak256(self.0.as_bytes()))
    }

    /// The raw solution string, as revealed on-chain at claim time.
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Solution {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// The solution is a bearer credential. Keep it out of logs.
impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Solution(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_binds_to_solution() {
        let solution = Solution::from("correct horse battery staple");
        assert_eq!(
            solution.secret().0,
            keccak256("correct horse battery staple".as_bytes())
        );
        assert_ne!(solution.secret(), Solution::from("correct horse").secret());
    }

    #[test]
    fn generated_solutions_are_unique() {
        let a = Solution::generate();
        let b = Solution::generate();
        assert_eq!(a.reveal().len(), SOLUTION_LENGTH);
        assert_ne!(a.secret(), b.secret());
    }

    #[test]
    fn debug_redacts_the_credential() {
        let solution = Solution::from("supersecret");
        assert_eq!(format!("{solution:?}"), "Solution(..)");
    }
}
