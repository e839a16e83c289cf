//! Concurrency properties of the claim state machine.

use lootpool_gate::ClaimGate;
use lootpool_store::{MemoryStore, Store};
use lootpool_types::{ClaimOutcome, ClaimRequest, Pool, WinKind, WinRecord};
use std::sync::Arc;

const MINT: &str = "3N2pzHkLq9vTwXbRf4mYd7GcJsE5uAnB8QhVxZ";
const CONCURRENT_CLAIMS: usize = 32;

async fn seeded_store() -> Arc<MemoryStore> {
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

/// N concurrent claims produce exactly one physical transition: one caller is
/// told it authorized, every other caller succeeds with `AlreadyClaimed`.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_claims_authorize_exactly_once() {
    let store = seeded_store().await;
    let gate = ClaimGate::new(store.clone());

    let mut handles = Vec::with_capacity(CONCURRENT_CLAIMS);
    for _ in 0..CONCURRENT_CLAIMS {
        let gate = gate.clone();
        handles.push(tokio::spawn(async move {
            gate.authorize_claim(&ClaimRequest {
                claimant: "alice".to_string(),
                pool_id: 42,
                tenant_id: None,
                prize_win_id: None,
            })
            .await
        }));
    }

    let mut authorized = 0;
    let mut already_claimed = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            ClaimOutcome::Authorized { .. } => authorized += 1,
            ClaimOutcome::AlreadyClaimed { .. } => already_claimed += 1,
        }
    }

    assert_eq!(authorized, 1, "exactly one caller performs the transition");
    assert_eq!(already_claimed, CONCURRENT_CLAIMS - 1);

    let win = store.get_win(1).await.unwrap().unwrap();
    assert!(win.claimed);
    assert!(win.claimed_at.is_some());
}

/// Late duplicates after the race all observe the same claim timestamp.
#[tokio::test]
async fn late_retries_observe_stable_timestamp() {
    let store = seeded_store().await;
    let gate = ClaimGate::new(store.clone());
    let request = ClaimRequest {
        claimant: "alice".to_string(),
        pool_id: 42,
        tenant_id: None,
        prize_win_id: None,
    };

    gate.authorize_claim(&request).await.unwrap();
    let recorded = store.get_win(1).await.unwrap().unwrap().claimed_at;
    assert!(recorded.is_some());

    for _ in 0..4 {
        match gate.authorize_claim(&request).await.unwrap() {
            ClaimOutcome::AlreadyClaimed { claimed_at, .. } => {
                assert_eq!(claimed_at, recorded);
            }
            other => panic!("expected AlreadyClaimed, got {other:?}"),
        }
    }
}
