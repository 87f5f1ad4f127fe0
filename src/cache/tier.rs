//! The contract every cache tier implements.

use crate::store::{StoreError, StoreResult};
use crate::types::TtlLevel;
use async_trait::async_trait;

/// One cache layer holding serialized values.
///
/// The tier resolves a [`TtlLevel`] to its own seconds; callers never pass a concrete
/// duration.
#[async_trait]
pub trait CacheTier: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    async fn put(&self, key: &str, value: &[u8], ttl_level: TtlLevel) -> StoreResult<()>;

    async fn invalidate(&self, key: &str) -> StoreResult<()>;

    fn name(&self) -> &'static str;
}

/// Outcome of one tier read. A failure is a value, handled like a miss by the proxy.
#[derive(Debug)]
pub enum TierRead {
    Hit(Vec<u8>),
    Miss,
    Failed(StoreError),
}

impl TierRead {
    pub fn is_hit(&self) -> bool {
        matches!(self, TierRead::Hit(_))
    }
}

impl From<StoreResult<Option<Vec<u8>>>> for TierRead {
    fn from(result: StoreResult<Option<Vec<u8>>>) -> Self {
        match result {
            Ok(Some(bytes)) => TierRead::Hit(bytes),
            Ok(None) => TierRead::Miss,
            Err(e) => TierRead::Failed(e),
        }
    }
}
