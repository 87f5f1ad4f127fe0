//! Per-request envelope

use super::HotspotLevel;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Business classification of a request, produced by a [`RequestClassifier`].
///
/// [`RequestClassifier`]: crate::policy::RequestClassifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    /// Widely shared reads such as product detail pages.
    HighReuseRead,
    /// Reads tailored to one user (recommendations, history).
    PersonalizedRead,
    /// Orders, payments, stock deductions.
    StrongConsistencyWrite,
    NonCriticalWrite,
    AsyncCallback,
}

impl RequestType {
    pub fn is_read(self) -> bool {
        matches!(
            self,
            RequestType::HighReuseRead | RequestType::PersonalizedRead
        )
    }
}

/// Request envelope passed through the pipeline.
///
/// Owned by the caller for its whole lifetime; the scheduler only fills in the fields
/// it derives (`hotspot_level`, `request_type`, `cache_allowed`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub request_id: String,
    /// Key used for both counting and caching (e.g. a sku id).
    pub cache_key: String,
    /// Counter namespace, so equal key text of different entity types does not collide.
    pub biz_type: String,
    pub hotspot_level: Option<HotspotLevel>,
    pub request_type: Option<RequestType>,
    pub cache_allowed: Option<bool>,
    pub user_id: Option<String>,
    /// Origin of the request (web, app, api).
    pub source: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl RequestContext {
    pub const DEFAULT_BIZ_TYPE: &'static str = "default";

    pub fn new(cache_key: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            cache_key: cache_key.into(),
            biz_type: Self::DEFAULT_BIZ_TYPE.to_string(),
            hotspot_level: None,
            request_type: None,
            cache_allowed: None,
            user_id: None,
            source: None,
            timestamp: now_millis(),
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = id.into();
        self
    }

    pub fn with_biz_type(mut self, biz_type: impl Into<String>) -> Self {
        self.biz_type = biz_type.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_request_type(mut self, request_type: RequestType) -> Self {
        self.request_type = Some(request_type);
        self
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_has_defaults() {
        let ctx = RequestContext::new("sku:42");
        assert_eq!(ctx.cache_key, "sku:42");
        assert_eq!(ctx.biz_type, "default");
        assert!(!ctx.request_id.is_empty());
        assert!(ctx.hotspot_level.is_none());
        assert!(ctx.timestamp > 0);
    }

    #[test]
    fn builder_overrides() {
        let ctx = RequestContext::new("42")
            .with_request_id("req-1")
            .with_biz_type("product")
            .with_source("app")
            .with_request_type(RequestType::PersonalizedRead);
        assert_eq!(ctx.request_id, "req-1");
        assert_eq!(ctx.biz_type, "product");
        assert_eq!(ctx.source.as_deref(), Some("app"));
        assert!(ctx.request_type.unwrap().is_read());
        assert!(!RequestType::AsyncCallback.is_read());
    }
}
