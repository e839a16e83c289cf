//! Redis-backed store.
//!
//! Records are JSON values under prefixed keys, with small id-sets as
//! secondary indexes (wins per pool, cart entries per winner). The claim
//! transition runs as a Lua script: Redis executes scripts on its single
//! command thread, which supplies the per-row conditional-update atomicity
//! the gate's exactly-once guarantee rests on.

use crate::{Result, Store, TenantFilter};
use async_trait::async_trait;
use lootpool_types::{PendingDelivery, Pool, WinKind, WinRecord};
use redis::AsyncCommands;
use tokio::sync::Mutex;

/// Conditional claim update. KEYS[1] is the win row, ARGV[1] the claim
/// timestamp. Returns the updated row, or nil when the row is missing or
/// already claimed (the caller re-reads to tell the two apart).
const CLAIM_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then return false end
local win = cjson.decode(raw)
if win.claimed then return false end
win.claimed = true
win.claimed_at = tonumber(ARGV[1])
local updated = cjson.encode(win)
redis.call('SET', KEYS[1], updated)
return updated
"#;

pub struct RedisStore {
    client: redis::Client,
    connection: Mutex<Option<redis::aio::ConnectionManager>>,
    prefix: String,
    claim_script: redis::Script,
}

impl RedisStore {
    pub fn new(url: &str, prefix: String) -> std::result::Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
            prefix,
            claim_script: redis::Script::new(CLAIM_SCRIPT),
        })
    }

    fn pool_key(&self, pool_id: u64) -> String {
        format!("{}pool:{}", self.prefix, pool_id)
    }

    fn win_key(&self, win_id: u64) -> String {
        format!("{}win:{}", self.prefix, win_id)
    }

    fn pool_wins_key(&self, pool_id: u64) -> String {
        format!("{}pool-wins:{}", self.prefix, pool_id)
    }

    fn delivery_key(&self, id: u64) -> String {
        format!("{}delivery:{}", self.prefix, id)
    }

    fn cart_key(&self, winner: &str) -> String {
        format!("{}cart:{}", self.prefix, winner)
    }

    /// Build the connection manager on first use; drop it on command failure
    /// so the next call reconnects.
    async fn connection(&self) -> Result<redis::aio::ConnectionManager> {
        let mut guard = self.connection.lock().await;
        match guard.as_ref() {
            // ConnectionManager clones share the underlying multiplexed pipe.
            Some(conn) => Ok(conn.clone()),
            None => {
                let conn = self.client.get_connection_manager().await?;
                *guard = Some(conn.clone());
                Ok(conn)
            }
        }
    }

    async fn reset_connection(&self) {
        let mut guard = self.connection.lock().await;
        *guard = None;
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: String) -> Result<Option<T>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = match conn.get(key).await {
            Ok(raw) => raw,
            Err(err) => {
                self.reset_connection().await;
                return Err(err.into());
            }
        };
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_json<T: serde::Serialize>(&self, key: String, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        let mut conn = self.connection().await?;
        if let Err(err) = conn.set::<_, _, ()>(key, raw).await {
            self.reset_connection().await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn set_members(&self, key: String) -> Result<Vec<u64>> {
        let mut conn = self.connection().await?;
        match conn.smembers(key).await {
            Ok(ids) => Ok(ids),
            Err(err) => {
                self.reset_connection().await;
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn find_pool(&self, pool_id: u64, tenant: TenantFilter) -> Result<Option<Pool>> {
        let pool: Option<Pool> = self.get_json(self.pool_key(pool_id)).await?;
        Ok(pool.filter(|pool| tenant.matches(pool.tenant_id)))
    }

    async fn find_win_by_id(
        &self,
        win_id: u64,
        tenant: TenantFilter,
    ) -> Result<Option<WinRecord>> {
        let win: Option<WinRecord> = self.get_json(self.win_key(win_id)).await?;
        Ok(win.filter(|win| tenant.matches(win.tenant_id)))
    }

    async fn find_win_by_pool(
        &self,
        pool_id: u64,
        kind: WinKind,
        tenant: TenantFilter,
    ) -> Result<Option<WinRecord>> {
        let mut ids = self.set_members(self.pool_wins_key(pool_id)).await?;
        ids.sort_unstable();
        for id in ids {
            let win: Option<WinRecord> = self.get_json(self.win_key(id)).await?;
            if let Some(win) = win {
                if win.kind == kind && tenant.matches(win.tenant_id) {
                    return Ok(Some(win));
                }
            }
        }
        Ok(None)
    }

    async fn get_win(&self, win_id: u64) -> Result<Option<WinRecord>> {
        self.get_json(self.win_key(win_id)).await
    }

    async fn claim_win(&self, win_id: u64, claimed_at: u64) -> Result<Option<WinRecord>> {
        let mut conn = self.connection().await?;
        let updated: Option<String> = match self
            .claim_script
            .key(self.win_key(win_id))
            .arg(claimed_at)
            .invoke_async(&mut conn)
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                self.reset_connection().await;
                return Err(err.into());
            }
        };
        match updated {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn resolve_pending_deliveries(
        &self,
        winner: &str,
        reward_reference: &str,
        tenant: TenantFilter,
    ) -> Result<usize> {
        let ids = self.set_members(self.cart_key(winner)).await?;
        let mut resolved = 0;
        for id in ids {
            let entry: Option<PendingDelivery> = self.get_json(self.delivery_key(id)).await?;
            let Some(mut entry) = entry else { continue };
            if entry.delivered
                || entry.reward_reference != reward_reference
                || !tenant.matches(entry.tenant_id)
            {
                continue;
            }
            entry.delivered = true;
            self.set_json(self.delivery_key(id), &entry).await?;
            resolved += 1;
        }
        Ok(resolved)
    }

    async fn put_pool(&self, pool: Pool) -> Result<()> {
        self.set_json(self.pool_key(pool.id), &pool).await
    }

    async fn put_win(&self, win: WinRecord) -> Result<()> {
        win.validate_invariants()?;
        self.set_json(self.win_key(win.id), &win).await?;
        let mut conn = self.connection().await?;
        if let Err(err) = conn
            .sadd::<_, _, ()>(self.pool_wins_key(win.pool_id), win.id)
            .await
        {
            self.reset_connection().await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn put_pending_delivery(&self, entry: PendingDelivery) -> Result<()> {
        self.set_json(self.delivery_key(entry.id), &entry).await?;
        let mut conn = self.connection().await?;
        if let Err(err) = conn
            .sadd::<_, _, ()>(self.cart_key(&entry.winner), entry.id)
            .await
        {
            self.reset_connection().await;
            return Err(err.into());
        }
        Ok(())
    }
}
