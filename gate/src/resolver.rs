//! Tenant-scoped record resolution with legacy fallback.
//!
//! Older records predate tenant partitioning and carry no tenant id, while
//! newer records always do. A strict single-filter lookup would report such
//! rows missing whenever a tenant context is supplied, so resolution is two
//! steps: the strict filter first, then an unconstrained retry. The fallback
//! hit is logged so per-tenant data can eventually be backfilled.

use crate::{Error, Result};
use lootpool_store::{Store, TenantFilter};
use lootpool_types::{Pool, WinKind, WinRecord};
use tracing::warn;

fn strict_filter(tenant: Option<u64>) -> TenantFilter {
    match tenant {
        Some(tenant) => TenantFilter::Scoped(tenant),
        None => TenantFilter::Unscoped,
    }
}

/// Resolve a pool by id under the request's tenant scope.
pub async fn resolve_pool(
    store: &dyn Store,
    pool_id: u64,
    tenant: Option<u64>,
) -> Result<Pool> {
    if let Some(pool) = store.find_pool(pool_id, strict_filter(tenant)).await? {
        return Ok(pool);
    }
    match store.find_pool(pool_id, TenantFilter::Any).await? {
        Some(pool) => {
            warn!(
                pool_id,
                requested_tenant = ?tenant,
                stored_tenant = ?pool.tenant_id,
                "pool resolved outside requested tenant scope"
            );
            Ok(pool)
        }
        None => Err(Error::NotFound("pool")),
    }
}

/// Resolve a win record under the request's tenant scope: by explicit row id
/// when the request names one, otherwise the pool's final-settlement win.
pub async fn resolve_win(
    store: &dyn Store,
    pool_id: u64,
    prize_win_id: Option<u64>,
    tenant: Option<u64>,
) -> Result<WinRecord> {
    if let Some(win) = find_win(store, pool_id, prize_win_id, strict_filter(tenant)).await? {
        return Ok(win);
    }
    match find_win(store, pool_id, prize_win_id, TenantFilter::Any).await? {
        Some(win) => {
            warn!(
                pool_id,
                win_id = win.id,
                requested_tenant = ?tenant,
                stored_tenant = ?win.tenant_id,
                "win resolved outside requested tenant scope"
            );
            Ok(win)
        }
        None => Err(Error::NotFound("prize win")),
    }
}

async fn find_win(
    store: &dyn Store,
    pool_id: u64,
    prize_win_id: Option<u64>,
    filter: TenantFilter,
) -> Result<Option<WinRecord>> {
    match prize_win_id {
        Some(win_id) => Ok(store.find_win_by_id(win_id, filter).await?),
        None => Ok(store
            .find_win_by_pool(pool_id, WinKind::FinalSettlement, filter)
            .await?),
    }
}
