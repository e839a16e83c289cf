//! The claim entry point and its exactly-once state machine.

use crate::{eligibility, reconcile, resolver, verifier, Error, Result};
use lootpool_store::Store;
use lootpool_types::{ClaimOutcome, ClaimRequest, Eligibility, RewardKind, WinRecord};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Outcome of the conditional update, before it is joined with pool data.
enum ClaimTransition {
    /// This caller performed the false-to-true transition.
    Performed,
    /// Another request claimed the record first; its row state is returned.
    Lost(WinRecord),
}

/// The prize claim authorization gate.
///
/// Holds no per-request state; any number of concurrent requests may share
/// one instance. Correctness is delegated entirely to the store's conditional
/// atomic update of the win row.
#[derive(Clone)]
pub struct ClaimGate {
    store: Arc<dyn Store>,
}

impl ClaimGate {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Authorize taking possession of a pool's prize.
    ///
    /// Safe to call any number of times: once a record is claimed, every
    /// later call returns [`ClaimOutcome::AlreadyClaimed`] with the original
    /// timestamp and never re-mutates the row.
    pub async fn authorize_claim(&self, request: &ClaimRequest) -> Result<ClaimOutcome> {
        if request.claimant.is_empty() {
            return Err(Error::Validation("userId is required"));
        }
        let store = self.store.as_ref();

        let pool = resolver::resolve_pool(store, request.pool_id, request.tenant_id).await?;
        if pool.effective_reward_kind() != RewardKind::NonFungible {
            return Err(Error::UnsupportedReward);
        }
        verifier::verify_winner(&pool, &request.claimant)?;

        let win =
            resolver::resolve_win(store, pool.id, request.prize_win_id, request.tenant_id).await?;
        // An explicit prizeWinId may name any row; one belonging to a
        // different pool must not claim against this pool's prize.
        if win.pool_id != pool.id {
            warn!(
                pool_id = pool.id,
                win_id = win.id,
                win_pool_id = win.pool_id,
                claimant = %request.claimant,
                "claim denied: win record belongs to a different pool"
            );
            return Err(Error::NotFound("prize win"));
        }
        // The win row records its own winner identity; a row that names
        // someone else is denied exactly like a pool mismatch.
        if win.winner != request.claimant {
            warn!(
                pool_id = pool.id,
                win_id = win.id,
                claimant = %request.claimant,
                recorded_winner = %win.winner,
                "claim denied: win record names a different winner"
            );
            return Err(Error::Forbidden);
        }

        if win.claimed {
            return Ok(ClaimOutcome::AlreadyClaimed {
                claimed_at: win.claimed_at,
                transfer_reference: win.transfer_reference,
            });
        }

        match self.try_claim(win.id).await? {
            ClaimTransition::Performed => {
                reconcile::resolve_cart_entries(store, &request.claimant, &pool.reward_descriptor)
                    .await;
                Ok(ClaimOutcome::Authorized {
                    nft_mint: pool.reward_descriptor,
                    pool_name: pool.name,
                })
            }
            ClaimTransition::Lost(win) => Ok(ClaimOutcome::AlreadyClaimed {
                claimed_at: win.claimed_at,
                transfer_reference: win.transfer_reference,
            }),
        }
    }

    /// Read-only claimability report; never mutates state, safe to poll.
    pub async fn check_eligibility(
        &self,
        pool_id: u64,
        user_id: &str,
        tenant_id: Option<u64>,
    ) -> Result<Eligibility> {
        eligibility::check(self.store.as_ref(), pool_id, user_id, tenant_id).await
    }

    /// The exactly-once core: one conditional atomic update, and a re-read to
    /// disambiguate when it applies to no row.
    ///
    /// The re-read is what makes ambiguous outcomes (lost races, requests
    /// retried after a timeout mid-update) safe: an already-applied update is
    /// reported as a lost race rather than re-attempted blindly.
    async fn try_claim(&self, win_id: u64) -> Result<ClaimTransition> {
        let claimed_at = unix_now();
        if self.store.claim_win(win_id, claimed_at).await?.is_some() {
            return Ok(ClaimTransition::Performed);
        }
        match self.store.get_win(win_id).await? {
            Some(win) if win.claimed => Ok(ClaimTransition::Lost(win)),
            Some(_) => Err(Error::TransientClaimFailure),
            None => Err(Error::NotFound("prize win")),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
