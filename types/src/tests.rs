use super::*;
use proptest::prelude::*;

fn pool(descriptor: &str, kind: Option<RewardKind>) -> Pool {
    Pool {
        id: 1,
        tenant_id: None,
        name: "Test Pool".to_string(),
        recorded_winner: Some("alice".to_string()),
        reward_descriptor: descriptor.to_string(),
        reward_kind: kind,
        settled: true,
    }
}

#[test]
fn test_classify_length_boundaries() {
    assert_eq!(RewardKind::classify(&"a".repeat(31)), RewardKind::Media);
    assert_eq!(
        RewardKind::classify(&"a".repeat(32)),
        RewardKind::NonFungible
    );
    assert_eq!(
        RewardKind::classify(&"a".repeat(44)),
        RewardKind::NonFungible
    );
    assert_eq!(RewardKind::classify(&"a".repeat(45)), RewardKind::Media);
}

#[test]
fn test_classify_rejects_paths_and_urls() {
    // Length alone is in range for all of these.
    assert_eq!(
        RewardKind::classify("https://cdn.example.com/prize.png"),
        RewardKind::Media
    );
    assert_eq!(
        RewardKind::classify(&format!("{}.png", "a".repeat(30))),
        RewardKind::Media
    );
    assert_eq!(
        RewardKind::classify(&format!("images/{}", "a".repeat(28))),
        RewardKind::Media
    );
}

#[test]
fn test_classify_accepts_ledger_address() {
    // 38 characters, no '.' or '/'.
    let mint = "3N2pzHkLq9vTwXbRf4mYd7GcJsE5uAnB8QhVxZ";
    assert_eq!(mint.len(), 38);
    assert_eq!(RewardKind::classify(mint), RewardKind::NonFungible);
}

#[test]
fn test_effective_reward_kind_prefers_explicit_tag() {
    // A descriptor the heuristic would call an address, tagged Media.
    let tagged = pool(&"a".repeat(40), Some(RewardKind::Media));
    assert_eq!(tagged.effective_reward_kind(), RewardKind::Media);

    // Legacy row without a tag falls back to the heuristic.
    let legacy = pool(&"a".repeat(40), None);
    assert_eq!(legacy.effective_reward_kind(), RewardKind::NonFungible);
}

#[test]
fn test_win_invariants() {
    let win = WinRecord {
        id: 7,
        pool_id: 1,
        tenant_id: None,
        winner: "alice".to_string(),
        kind: WinKind::FinalSettlement,
        claimed: false,
        claimed_at: None,
        transfer_reference: None,
    };
    win.validate_invariants().expect("valid invariants");

    let mut claimed_without_ts = win.clone();
    claimed_without_ts.claimed = true;
    assert_eq!(
        claimed_without_ts.validate_invariants(),
        Err(WinInvariantError::ClaimedWithoutTimestamp { id: 7 })
    );

    let mut ts_without_claim = win.clone();
    ts_without_claim.claimed_at = Some(1);
    assert_eq!(
        ts_without_claim.validate_invariants(),
        Err(WinInvariantError::TimestampWithoutClaim { id: 7 })
    );

    let mut empty_winner = win;
    empty_winner.winner.clear();
    assert_eq!(
        empty_winner.validate_invariants(),
        Err(WinInvariantError::EmptyWinner { id: 7 })
    );
}

#[test]
fn test_win_record_json_roundtrip() {
    let win = WinRecord {
        id: 42,
        pool_id: 9,
        tenant_id: Some(3),
        winner: "alice".to_string(),
        kind: WinKind::FinalSettlement,
        claimed: true,
        claimed_at: Some(1_700_000_000),
        transfer_reference: Some("sig-abc".to_string()),
    };
    let encoded = serde_json::to_string(&win).unwrap();
    let decoded: WinRecord = serde_json::from_str(&encoded).unwrap();
    assert_eq!(win, decoded);
}

proptest! {
    /// Any descriptor containing '.' or '/' is Media regardless of length,
    /// and NonFungible classifications always sit inside the length window.
    #[test]
    fn prop_classifier_boundary(descriptor in "[ -~]{0,64}") {
        let kind = RewardKind::classify(&descriptor);
        if descriptor.contains('.') || descriptor.contains('/') {
            prop_assert_eq!(kind, RewardKind::Media);
        }
        if kind == RewardKind::NonFungible {
            prop_assert!(descriptor.len() >= MIN_ASSET_ADDRESS_LENGTH);
            prop_assert!(descriptor.len() <= MAX_ASSET_ADDRESS_LENGTH);
        }
    }
}
