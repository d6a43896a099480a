//! # Trace context provider
//!
//! The provider ties a [`Config`] to a [`ContextPool`]: every context it
//! hands out is checked out of the pool and derived before the caller sees
//! it, and goes back to the pool when the guard is dropped.
use crate::config::Config;
use apm_context::propagation::{Extractor, Injector, TraceContextPropagator};
use apm_context::{apm_debug, ContextPool, PooledContext, Sampler, TraceContext};

/// Hands out pooled, derived [`TraceContext`]s.
#[derive(Debug)]
pub struct TraceContextProvider {
    config: Config,
    pool: ContextPool,
    propagator: TraceContextPropagator,
}

impl Default for TraceContextProvider {
    fn default() -> Self {
        TraceContextProvider::builder().build()
    }
}

impl TraceContextProvider {
    /// Create a new [`TraceContextProvider`] builder.
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Config associated with this provider.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The pool contexts are checked out of.
    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    /// Starts a new trace. The configured sampler decides whether it is
    /// recorded.
    pub fn start_root(&self) -> PooledContext<'_> {
        let mut cx = self.pool.checkout();
        cx.as_root(self.sampler());
        cx
    }

    /// Continues the trace named by an incoming `traceparent` header, or
    /// starts a new one if the header is absent or rejected.
    pub fn continue_from_header(&self, header: Option<&str>) -> PooledContext<'_> {
        let mut cx = self.pool.checkout();
        cx.as_child_of_header_or_root(header.map(str::trim), self.sampler());
        cx
    }

    /// Like [`continue_from_header`](Self::continue_from_header), reading the
    /// header from a carrier.
    pub fn continue_from_carrier(&self, extractor: &dyn Extractor) -> PooledContext<'_> {
        let mut cx = self.pool.checkout();
        if !self.propagator.extract(&mut cx, extractor) {
            cx.as_root(self.sampler());
        }
        cx
    }

    /// Derives a child of an in-process parent. An unset parent starts a new
    /// trace instead.
    pub fn child_of(&self, parent: &TraceContext) -> PooledContext<'_> {
        let mut cx = self.pool.checkout();
        if !cx.as_child_of(parent) {
            apm_debug!(name: "TraceContextProvider.InvalidParent");
            cx.as_root(self.sampler());
        }
        cx
    }

    /// Continues a trace handed over as a binary snapshot.
    ///
    /// Returns `None` if the snapshot is rejected; the pooled slot is
    /// returned immediately.
    pub fn continue_from_bytes(&self, bytes: &[u8]) -> Option<PooledContext<'_>> {
        let mut cx = self.pool.checkout();
        cx.as_child_of_bytes(bytes).then_some(cx)
    }

    /// Writes the outgoing header of `cx` into a carrier.
    pub fn inject(&self, cx: &TraceContext, injector: &mut dyn Injector) {
        self.propagator.inject(cx, injector)
    }

    fn sampler(&self) -> &dyn Sampler {
        self.config.sampler.as_ref()
    }
}

/// Builder for [`TraceContextProvider`].
#[derive(Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// The sdk [`Config`] that this provider will use.
    pub fn with_config(self, config: Config) -> Self {
        Builder { config }
    }

    /// The sampler consulted for new traces.
    pub fn with_sampler<S: Sampler + 'static>(mut self, sampler: S) -> Self {
        self.config = self.config.with_sampler(sampler);
        self
    }

    /// Maximum number of idle contexts kept for reuse.
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.config = self.config.with_pool_capacity(capacity);
        self
    }

    /// Create a new provider from this configuration.
    pub fn build(self) -> TraceContextProvider {
        let pool = ContextPool::with_capacity(self.config.pool_capacity);
        TraceContextProvider {
            config: self.config,
            pool,
            propagator: TraceContextPropagator::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConstantSampler;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const HEADER: &str = "00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01";

    #[derive(Debug, Default, Clone)]
    struct CountingSampler(Arc<AtomicUsize>);

    impl Sampler for CountingSampler {
        fn decide(&self) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    #[test]
    fn start_root_consults_sampler_once() {
        let sampler = CountingSampler::default();
        let provider = TraceContextProvider::builder()
            .with_sampler(sampler.clone())
            .build();

        let root = provider.start_root();
        assert!(root.is_root());
        assert!(!root.is_sampled());

        let child = provider.child_of(&root);
        let grandchild = provider.child_of(&child);
        assert!(grandchild.is_child_of(&child));
        assert_eq!(sampler.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn continue_from_header_never_samples() {
        let sampler = CountingSampler::default();
        let provider = TraceContextProvider::builder()
            .with_sampler(sampler.clone())
            .build();

        let cx = provider.continue_from_header(Some(HEADER));
        assert!(cx.is_sampled());
        assert_eq!(cx.incoming_header().as_str(), HEADER);
        assert_eq!(sampler.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn continue_from_header_falls_back_to_root() {
        let provider = TraceContextProvider::builder()
            .with_sampler(ConstantSampler::ALWAYS_ON)
            .build();

        for header in [None, Some(""), Some("00-garbage")] {
            let cx = provider.continue_from_header(header);
            assert!(cx.is_root(), "{header:?}");
            assert!(cx.is_sampled());
        }
    }

    #[test]
    fn carrier_round_trip() {
        let provider = TraceContextProvider::builder()
            .with_sampler(ConstantSampler::ALWAYS_ON)
            .build();
        let root = provider.start_root();

        let mut carrier: HashMap<String, String> = HashMap::new();
        provider.inject(&root, &mut carrier);
        let remote = provider.continue_from_carrier(&carrier);
        assert!(remote.is_child_of(&root));

        let fallback = provider.continue_from_carrier(&HashMap::<String, String>::new());
        assert!(fallback.is_root());
        assert_ne!(fallback.trace_id(), root.trace_id());
    }

    #[test]
    fn default_provider_survives_huge_pool_size() {
        temp_env::with_var(
            crate::APM_CONTEXT_POOL_SIZE,
            Some("18446744073709551615"),
            || {
                let provider = TraceContextProvider::default();
                assert_eq!(provider.config().pool_capacity, crate::MAX_POOL_CAPACITY);
                assert!(provider.start_root().is_valid());
            },
        );
    }

    #[test]
    fn child_of_unset_parent_starts_root() {
        let provider = TraceContextProvider::default();
        let cx = provider.child_of(&TraceContext::new());
        assert!(cx.is_root());
    }

    #[test]
    fn continue_from_bytes() {
        let provider = TraceContextProvider::builder()
            .with_pool_capacity(4)
            .build();
        let root = provider.start_root();
        let bytes = root.serialize();

        let cx = provider.continue_from_bytes(&bytes).unwrap();
        assert!(cx.is_child_of(&root));
        assert_eq!(cx.clock(), root.clock());
        drop(cx);

        let available = provider.pool().available();
        assert!(provider.continue_from_bytes(&bytes[1..]).is_none());
        assert_eq!(provider.pool().available(), available);
    }

    #[test]
    fn contexts_return_to_pool() {
        let provider = TraceContextProvider::builder()
            .with_pool_capacity(2)
            .build();
        assert_eq!(provider.pool().available(), 2);
        {
            let _a = provider.start_root();
            let _b = provider.start_root();
            assert_eq!(provider.pool().available(), 0);
        }
        assert_eq!(provider.pool().available(), 2);
        assert_eq!(provider.config().pool_capacity, 2);
    }
}
