//! Read-only claimability reporting.

use crate::{resolver, Error, Result};
use lootpool_store::Store;
use lootpool_types::{Eligibility, RewardKind};

/// Report whether `user_id` could claim the pool's prize right now.
///
/// Reuses the resolver and classifier, applies the winner check as a
/// predicate instead of a rejection, and stops before the state machine.
/// Clients poll this to decide whether to render a claim action.
pub async fn check(
    store: &dyn Store,
    pool_id: u64,
    user_id: &str,
    tenant_id: Option<u64>,
) -> Result<Eligibility> {
    if user_id.is_empty() {
        return Err(Error::Validation("userId is required"));
    }

    let pool = resolver::resolve_pool(store, pool_id, tenant_id).await?;
    let is_nft_jackpot = pool.effective_reward_kind() == RewardKind::NonFungible;
    let is_winner = pool.recorded_winner.as_deref() == Some(user_id);

    // A pool whose win record has not been written yet reports as unclaimed.
    let claimed = match resolver::resolve_win(store, pool_id, None, tenant_id).await {
        Ok(win) => win.claimed,
        Err(Error::NotFound(_)) => false,
        Err(err) => return Err(err),
    };

    Ok(Eligibility {
        is_winner,
        is_nft_jackpot,
        nft_mint: is_nft_jackpot.then(|| pool.reward_descriptor.clone()),
        claimed,
        can_claim: is_winner && is_nft_jackpot && !claimed && pool.settled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lootpool_store::MemoryStore;
    use lootpool_types::{Pool, WinKind, WinRecord};
    use std::sync::Arc;

    const MINT: &str = "3N2pzHkLq9vTwXbRf4mYd7GcJsE5uAnB8QhVxZ";

    async fn seeded(settled: bool) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .put_pool(Pool {
                id: 42,
                tenant_id: None,
                name: "Mega Jackpot".to_string(),
                recorded_winner: Some("alice".to_string()),
                reward_descriptor: MINT.to_string(),
                reward_kind: None,
                settled,
            })
            .await
            .unwrap();
        store
            .put_win(WinRecord {
                id: 1,
                pool_id: 42,
                tenant_id: None,
                winner: "alice".to_string(),
                kind: WinKind::FinalSettlement,
                claimed: false,
                claimed_at: None,
                transfer_reference: None,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_winner_can_claim() {
        let store = seeded(true).await;
        let report = check(store.as_ref(), 42, "alice", None).await.unwrap();
        assert!(report.is_winner);
        assert!(report.is_nft_jackpot);
        assert!(!report.claimed);
        assert!(report.can_claim);
        assert_eq!(report.nft_mint.as_deref(), Some(MINT));
    }

    #[tokio::test]
    async fn test_non_winner_cannot_claim() {
        let store = seeded(true).await;
        let report = check(store.as_ref(), 42, "bob", None).await.unwrap();
        assert!(!report.is_winner);
        assert!(!report.can_claim);
    }

    #[tokio::test]
    async fn test_unsettled_pool_blocks_claim() {
        let store = seeded(false).await;
        let report = check(store.as_ref(), 42, "alice", None).await.unwrap();
        assert!(report.is_winner);
        assert!(!report.can_claim);
    }

    #[tokio::test]
    async fn test_claimed_record_reported() {
        let store = seeded(true).await;
        store.claim_win(1, 100).await.unwrap();
        let report = check(store.as_ref(), 42, "alice", None).await.unwrap();
        assert!(report.claimed);
        assert!(!report.can_claim);
    }

    #[tokio::test]
    async fn test_missing_win_record_is_unclaimed() {
        let store = Arc::new(MemoryStore::new());
        store
            .put_pool(Pool {
                id: 42,
                tenant_id: None,
                name: "Mega Jackpot".to_string(),
                recorded_winner: Some("alice".to_string()),
                reward_descriptor: MINT.to_string(),
                reward_kind: None,
                settled: true,
            })
            .await
            .unwrap();
        let report = check(store.as_ref(), 42, "alice", None).await.unwrap();
        assert!(!report.claimed);
        assert!(report.can_claim);
    }
}
