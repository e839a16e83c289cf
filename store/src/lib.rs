//! Storage backends for lootpool records.
//!
//! The gate's exactly-once guarantee rests entirely on
//! [`Store::claim_win`]: a single conditional update of one win row that
//! either performs the false-to-true `claimed` transition and returns the
//! updated row, or touches nothing. Every backend must provide that per-row
//! atomicity; nothing else in the trait is contention-sensitive.

pub mod memory;
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use lootpool_types::{PendingDelivery, Pool, WinInvariantError, WinKind, WinRecord};
use thiserror::Error;

/// Error type for store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("invariant violation: {0}")]
    Invariant(#[from] WinInvariantError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Tenant scoping applied to a lookup.
///
/// `Scoped` and `Unscoped` are the strict filters; `Any` is the fallback pass
/// used by the resolver for rows that predate tenant partitioning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TenantFilter {
    /// Row must carry exactly this tenant id.
    Scoped(u64),
    /// Row must carry no tenant id (legacy/default tenant).
    Unscoped,
    /// No tenant constraint.
    Any,
}

impl TenantFilter {
    /// Whether a row with the given tenant id passes this filter.
    pub fn matches(&self, tenant_id: Option<u64>) -> bool {
        match self {
            Self::Scoped(tenant) => tenant_id == Some(*tenant),
            Self::Unscoped => tenant_id.is_none(),
            Self::Any => true,
        }
    }
}

/// Point lookups and the single conditional claim update over lootpool
/// records.
///
/// `put_*` operations exist for the external flows that own record creation
/// (draw process, admin tooling) and for tests; the gate itself only reads
/// and claims.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch a pool by id under a tenant filter.
    async fn find_pool(&self, pool_id: u64, tenant: TenantFilter) -> Result<Option<Pool>>;

    /// Fetch a win row by its storage id under a tenant filter.
    async fn find_win_by_id(&self, win_id: u64, tenant: TenantFilter)
        -> Result<Option<WinRecord>>;

    /// Fetch the win of the given kind for a pool under a tenant filter.
    /// When multiple rows match, the lowest id wins, deterministically.
    async fn find_win_by_pool(
        &self,
        pool_id: u64,
        kind: WinKind,
        tenant: TenantFilter,
    ) -> Result<Option<WinRecord>>;

    /// Unfiltered re-read of a win row, used to disambiguate a rejected
    /// conditional update.
    async fn get_win(&self, win_id: u64) -> Result<Option<WinRecord>>;

    /// The conditional atomic update: set `claimed = true, claimed_at` on the
    /// row iff it is currently unclaimed, returning the updated row.
    ///
    /// Returns `Ok(None)` when the update applied to no row — either the row
    /// is already claimed or it does not exist; the caller re-reads with
    /// [`Store::get_win`] to tell the two apart.
    async fn claim_win(&self, win_id: u64, claimed_at: u64) -> Result<Option<WinRecord>>;

    /// Mark matching undelivered pending-delivery entries as delivered,
    /// returning how many rows changed.
    async fn resolve_pending_deliveries(
        &self,
        winner: &str,
        reward_reference: &str,
        tenant: TenantFilter,
    ) -> Result<usize>;

    /// Insert or replace a pool record.
    async fn put_pool(&self, pool: Pool) -> Result<()>;

    /// Insert or replace a win record. Rejects internally inconsistent rows.
    async fn put_win(&self, win: WinRecord) -> Result<()>;

    /// Insert or replace a pending-delivery entry.
    async fn put_pending_delivery(&self, entry: PendingDelivery) -> Result<()>;
}
