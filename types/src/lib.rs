//! Common types used throughout lootpool.
//!
//! The claim-authorization gate operates on three persisted records — [`Pool`],
//! [`WinRecord`], and [`PendingDelivery`] — plus a handful of transient
//! request/result shapes. All three records are created by external flows
//! (admin tooling, the draw process, checkout); the gate only ever flips
//! `WinRecord::claimed` and `PendingDelivery::delivered`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum length of a ledger asset address.
pub const MIN_ASSET_ADDRESS_LENGTH: usize = 32;

/// Maximum length of a ledger asset address.
pub const MAX_ASSET_ADDRESS_LENGTH: usize = 44;

/// Classification of a pool's reward descriptor.
///
/// Legacy rows store only the descriptor string, so classification falls back
/// to a shape heuristic: a string of 32-44 characters containing neither `/`
/// nor `.` matches the address encoding of the target ledger, while URLs and
/// file paths always contain one of the two. Newly created pools carry an
/// explicit tag and never hit the heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    /// A uniquely identified on-ledger item, referenced by address.
    NonFungible,
    /// A conventional media reference (image URL, file path) handled by the
    /// fungible/off-chain reward flow.
    Media,
}

impl RewardKind {
    /// Classify a reward descriptor by shape.
    pub fn classify(descriptor: &str) -> Self {
        let len = descriptor.len();
        if (MIN_ASSET_ADDRESS_LENGTH..=MAX_ASSET_ADDRESS_LENGTH).contains(&len)
            && !descriptor.contains('/')
            && !descriptor.contains('.')
        {
            Self::NonFungible
        } else {
            Self::Media
        }
    }
}

/// A configured reward pool ("jackpot").
///
/// Read-only from the gate's perspective. `tenant_id` of `None` marks a
/// legacy row that predates tenant partitioning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: u64,
    pub tenant_id: Option<u64>,
    pub name: String,
    /// Identity recorded by the external draw process. `None` until the draw
    /// selects a winner; the verifier treats `None` as an unconditional deny.
    pub recorded_winner: Option<String>,
    pub reward_descriptor: String,
    /// Explicit reward tag for records created after the tag was introduced.
    /// Legacy rows leave this unset and are classified by shape.
    pub reward_kind: Option<RewardKind>,
    /// Whether the draw has concluded.
    pub settled: bool,
}

impl Pool {
    /// Effective reward kind: the explicit tag when present, otherwise the
    /// shape heuristic over the stored descriptor.
    pub fn effective_reward_kind(&self) -> RewardKind {
        self.reward_kind
            .unwrap_or_else(|| RewardKind::classify(&self.reward_descriptor))
    }
}

/// Kinds of win events the draw/settlement process records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinKind {
    /// The pool's final settlement; the only kind this gate authorizes.
    FinalSettlement,
    /// Intermediate/bonus wins recorded by the external system.
    Bonus,
}

/// One finalized win event for a pool.
///
/// `id` is the row's storage key; the logical identity is the composite
/// `(pool_id, winner, kind, tenant_id)`. Invariant: `claimed` transitions
/// false to true at most once and never back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRecord {
    pub id: u64,
    pub pool_id: u64,
    pub tenant_id: Option<u64>,
    pub winner: String,
    pub kind: WinKind,
    pub claimed: bool,
    /// Unix seconds at which the claim was authorized.
    pub claimed_at: Option<u64>,
    /// Reference to the executed on-ledger transfer, written by the external
    /// transfer step after authorization. Never written by the gate.
    pub transfer_reference: Option<String>,
}

/// A reward won but not yet handed over, tracked for the winner's "cart".
///
/// `reward_reference` matches the pool's reward descriptor by value, not by
/// foreign key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDelivery {
    pub id: u64,
    pub winner: String,
    pub reward_reference: String,
    pub tenant_id: Option<u64>,
    pub delivered: bool,
}

/// A request to authorize taking possession of a prize. Transient, never
/// persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimRequest {
    /// Self-reported identity of the requester. Authorization binds to the
    /// recorded winner identity, never to this value alone.
    pub claimant: String,
    pub pool_id: u64,
    /// Tenant scope; `None` resolves under the legacy/default tenant.
    pub tenant_id: Option<u64>,
    /// Explicit win row to claim. When absent, the pool's final-settlement
    /// win is resolved instead.
    pub prize_win_id: Option<u64>,
}

/// Outcome of a successful claim authorization. Both variants are success:
/// either this caller performed the one authorization, or some earlier caller
/// already did and the request is an idempotent repeat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller performed the false-to-true transition.
    Authorized {
        /// Ledger address of the prize asset; the caller executes the
        /// transfer against it afterward.
        nft_mint: String,
        pool_name: String,
    },
    /// The record was already claimed (earlier request or lost race).
    AlreadyClaimed {
        claimed_at: Option<u64>,
        transfer_reference: Option<String>,
    },
}

/// Read-only claimability report for a `(pool, user)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub is_winner: bool,
    pub is_nft_jackpot: bool,
    pub nft_mint: Option<String>,
    pub claimed: bool,
    pub can_claim: bool,
}

/// Violations of the win-record invariants, checked by store backends before
/// accepting externally seeded rows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WinInvariantError {
    #[error("claimed win {id} is missing claimed_at")]
    ClaimedWithoutTimestamp { id: u64 },
    #[error("unclaimed win {id} carries claimed_at")]
    TimestampWithoutClaim { id: u64 },
    #[error("win {id} has empty winner identity")]
    EmptyWinner { id: u64 },
}

impl WinRecord {
    /// Check internal consistency of the record.
    pub fn validate_invariants(&self) -> Result<(), WinInvariantError> {
        if self.winner.is_empty() {
            return Err(WinInvariantError::EmptyWinner { id: self.id });
        }
        if self.claimed && self.claimed_at.is_none() {
            return Err(WinInvariantError::ClaimedWithoutTimestamp { id: self.id });
        }
        if !self.claimed && self.claimed_at.is_some() {
            return Err(WinInvariantError::TimestampWithoutClaim { id: self.id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
