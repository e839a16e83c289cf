//! In-memory store, used by tests and single-process deployments.

use crate::{Result, Store, TenantFilter};
use async_trait::async_trait;
use lootpool_types::{PendingDelivery, Pool, WinKind, WinRecord};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    pools: BTreeMap<u64, Pool>,
    wins: BTreeMap<u64, WinRecord>,
    deliveries: BTreeMap<u64, PendingDelivery>,
}

/// Map-backed [`Store`]. The claim transition runs inside one write-lock
/// critical section, which stands in for the datastore's per-row atomic
/// conditional update.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_pool(&self, pool_id: u64, tenant: TenantFilter) -> Result<Option<Pool>> {
        let inner = self.inner.read().await;
        Ok(inner
            .pools
            .get(&pool_id)
            .filter(|pool| tenant.matches(pool.tenant_id))
            .cloned())
    }

    async fn find_win_by_id(
        &self,
        win_id: u64,
        tenant: TenantFilter,
    ) -> Result<Option<WinRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .wins
            .get(&win_id)
            .filter(|win| tenant.matches(win.tenant_id))
            .cloned())
    }

    async fn find_win_by_pool(
        &self,
        pool_id: u64,
        kind: WinKind,
        tenant: TenantFilter,
    ) -> Result<Option<WinRecord>> {
        let inner = self.inner.read().await;
        // BTreeMap iteration order makes the lowest-id match deterministic.
        Ok(inner
            .wins
            .values()
            .find(|win| {
                win.pool_id == pool_id && win.kind == kind && tenant.matches(win.tenant_id)
            })
            .cloned())
    }

    async fn get_win(&self, win_id: u64) -> Result<Option<WinRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.wins.get(&win_id).cloned())
    }

    async fn claim_win(&self, win_id: u64, claimed_at: u64) -> Result<Option<WinRecord>> {
        let mut inner = self.inner.write().await;
        match inner.wins.get_mut(&win_id) {
            Some(win) if !win.claimed => {
                win.claimed = true;
                win.claimed_at = Some(claimed_at);
                Ok(Some(win.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn resolve_pending_deliveries(
        &self,
        winner: &str,
        reward_reference: &str,
        tenant: TenantFilter,
    ) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let mut resolved = 0;
        for entry in inner.deliveries.values_mut() {
            if !entry.delivered
                && entry.winner == winner
                && entry.reward_reference == reward_reference
                && tenant.matches(entry.tenant_id)
            {
                entry.delivered = true;
                resolved += 1;
            }
        }
        Ok(resolved)
    }

    async fn put_pool(&self, pool: Pool) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.pools.insert(pool.id, pool);
        Ok(())
    }

    async fn put_win(&self, win: WinRecord) -> Result<()> {
        win.validate_invariants()?;
        let mut inner = self.inner.write().await;
        inner.wins.insert(win.id, win);
        Ok(())
    }

    async fn put_pending_delivery(&self, entry: PendingDelivery) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.deliveries.insert(entry.id, entry);
        Ok(())
    }
}
