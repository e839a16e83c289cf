//! Winner identity verification.

use crate::{Error, Result};
use lootpool_types::Pool;
use tracing::warn;

/// Allow iff the claimant exactly matches the identity recorded at win time.
///
/// Exact string equality on the stored value, no normalization. A pool with
/// no recorded winner denies everyone. Denials are logged with both
/// identities for the audit trail; the returned error carries neither, and no
/// claim-state detail, so a non-winner cannot probe whether the prize has
/// been claimed.
pub fn verify_winner(pool: &Pool, claimant: &str) -> Result<()> {
    match pool.recorded_winner.as_deref() {
        Some(winner) if winner == claimant => Ok(()),
        recorded => {
            warn!(
                pool_id = pool.id,
                claimant,
                recorded_winner = ?recorded,
                "claim denied: requester is not the recorded winner"
            );
            Err(Error::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lootpool_types::RewardKind;

    fn pool(recorded_winner: Option<&str>) -> Pool {
        Pool {
            id: 1,
            tenant_id: None,
            name: "Test Pool".to_string(),
            recorded_winner: recorded_winner.map(str::to_string),
            reward_descriptor: "m".repeat(40),
            reward_kind: Some(RewardKind::NonFungible),
            settled: true,
        }
    }

    #[test]
    fn test_exact_match_allows() {
        assert!(verify_winner(&pool(Some("alice")), "alice").is_ok());
    }

    #[test]
    fn test_mismatch_denies() {
        assert!(matches!(
            verify_winner(&pool(Some("alice")), "bob"),
            Err(Error::Forbidden)
        ));
    }

    #[test]
    fn test_no_normalization() {
        assert!(matches!(
            verify_winner(&pool(Some("alice")), "Alice"),
            Err(Error::Forbidden)
        ));
        assert!(matches!(
            verify_winner(&pool(Some("alice")), "alice "),
            Err(Error::Forbidden)
        ));
    }

    #[test]
    fn test_unrecorded_winner_denies() {
        assert!(matches!(
            verify_winner(&pool(None), "alice"),
            Err(Error::Forbidden)
        ));
    }
}
