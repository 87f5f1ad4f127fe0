//! Redis-backed stores.

use super::{ttl_millis, CounterStore, KeyValueStore, StoreResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// INCR, then PEXPIRE only when the counter was just created.
///
/// Running both inside one script keeps concurrent callers from ever observing a
/// counter without expiry, and keeps later increments from pushing the expiry out.
const INCR_WITH_EXPIRE_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

/// Open a reconnecting connection manager shared by all Redis stores.
pub async fn connect(url: &str) -> StoreResult<ConnectionManager> {
    let client = redis::Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;
    info!(url = %url, "connected to redis");
    Ok(manager)
}

#[derive(Clone)]
pub struct RedisCounterStore {
    conn: ConnectionManager,
    script: Arc<redis::Script>,
}

impl RedisCounterStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            script: Arc::new(redis::Script::new(INCR_WITH_EXPIRE_SCRIPT)),
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr_with_expire(&self, key: &str, ttl: Duration) -> StoreResult<u64> {
        let mut conn = self.conn.clone();
        let count: i64 = self
            .script
            .key(key)
            .arg(ttl_millis(ttl))
            .invoke_async(&mut conn)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn get_count(&self, key: &str) -> StoreResult<Option<u64>> {
        let mut conn = self.conn.clone();
        let count: Option<i64> = conn.get(key).await?;
        Ok(count.map(|c| c.max(0) as u64))
    }

    async fn delete_counter(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[derive(Clone)]
pub struct RedisKeyValueStore {
    conn: ConnectionManager,
}

impl RedisKeyValueStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
