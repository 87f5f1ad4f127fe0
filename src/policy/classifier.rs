use crate::types::{RequestContext, RequestType};
use tracing::debug;

/// Assigns a [`RequestType`] and answers which pipeline stages apply to it.
pub trait RequestClassifier: Send + Sync {
    fn classify(&self, ctx: &RequestContext) -> RequestType;

    /// Whether requests of this type are counted.
    fn requires_statistics(&self, request_type: RequestType) -> bool;

    /// Whether requests of this type may be served from or written to cache.
    fn is_cacheable(&self, request_type: RequestType) -> bool;
}

/// Honors a type the caller already set and treats everything else as a shared read.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRequestClassifier;

impl RequestClassifier for DefaultRequestClassifier {
    fn classify(&self, ctx: &RequestContext) -> RequestType {
        let request_type = ctx.request_type.unwrap_or(RequestType::HighReuseRead);
        debug!(request_id = %ctx.request_id, request_type = ?request_type, "request classified");
        request_type
    }

    fn requires_statistics(&self, request_type: RequestType) -> bool {
        request_type.is_read()
    }

    fn is_cacheable(&self, request_type: RequestType) -> bool {
        request_type.is_read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_high_reuse_read() {
        let classifier = DefaultRequestClassifier;
        assert_eq!(
            classifier.classify(&RequestContext::new("k")),
            RequestType::HighReuseRead
        );
        let write = RequestContext::new("k").with_request_type(RequestType::NonCriticalWrite);
        assert_eq!(classifier.classify(&write), RequestType::NonCriticalWrite);
    }

    #[test]
    fn only_reads_are_counted_and_cached() {
        let classifier = DefaultRequestClassifier;
        for t in [RequestType::HighReuseRead, RequestType::PersonalizedRead] {
            assert!(classifier.requires_statistics(t));
            assert!(classifier.is_cacheable(t));
        }
        for t in [
            RequestType::StrongConsistencyWrite,
            RequestType::NonCriticalWrite,
            RequestType::AsyncCallback,
        ] {
            assert!(!classifier.requires_statistics(t));
            assert!(!classifier.is_cacheable(t));
        }
    }
}
