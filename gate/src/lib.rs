//! Prize claim authorization gate.
//!
//! Decides, for a single previously-recorded jackpot win, whether a requester
//! may take possession of the prize, and guarantees the authorization happens
//! at most once even under concurrent, retried, or duplicated requests. The
//! guarantee comes from one place only: the store's conditional atomic update
//! of the win row (`claimed: false -> true`). Everything else is plain
//! request-scoped work with no cross-request state.
//!
//! A claim request flows resolver -> classifier -> verifier -> state machine
//! -> reconciler, each stage short-circuiting with a specific rejection. The
//! read-only eligibility query reuses the first three stages and stops there.

pub mod claim;
pub mod eligibility;
pub mod reconcile;
pub mod resolver;
pub mod verifier;

pub use claim::ClaimGate;

use lootpool_store::StoreError;
use thiserror::Error;

/// Error type for gate operations.
///
/// A lost race is deliberately absent: the conditional update applying to no
/// row while a re-read shows `claimed = true` is surfaced as
/// [`lootpool_types::ClaimOutcome::AlreadyClaimed`], a success.
#[derive(Error, Debug)]
pub enum Error {
    /// A required request field is missing or empty. Terminal.
    #[error("{0}")]
    Validation(&'static str),
    /// Pool or win record absent after fallback resolution. Terminal.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Requester is not the recorded winner. Terminal; the message carries no
    /// identity or claim-state detail.
    #[error("access denied")]
    Forbidden,
    /// The pool's reward is not a non-fungible asset; this flow does not
    /// apply. Terminal.
    #[error("pool reward is not a non-fungible asset")]
    UnsupportedReward,
    /// The conditional update applied to no row but the re-read still shows
    /// the record unclaimed. The caller may retry the whole request.
    #[error("failed to process claim")]
    TransientClaimFailure,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for gate operations.
pub type Result<T> = std::result::Result<T, Error>;
