use super::header::TRACEPARENT_HEADER;
use super::{Extractor, Injector};
use crate::context::TraceContext;

/// Moves a [`TraceContext`] in and out of a carrier under the `traceparent`
/// key.
///
/// `traceparent: 00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01`
#[derive(Clone, Debug, Default)]
pub struct TraceContextPropagator {
    _private: (),
}

impl TraceContextPropagator {
    /// Create a new `TraceContextPropagator`.
    pub fn new() -> Self {
        TraceContextPropagator { _private: () }
    }

    /// Writes the outgoing header of `cx`. Nothing is written for a context
    /// that is not valid.
    pub fn inject(&self, cx: &TraceContext, injector: &mut dyn Injector) {
        if cx.is_valid() {
            injector.set(TRACEPARENT_HEADER, cx.outgoing_header().into());
        }
    }

    /// Derives `cx` from the carrier's header.
    ///
    /// Returns `false`, leaving `cx` untouched, if the header is absent or
    /// rejected.
    pub fn extract(&self, cx: &mut TraceContext, extractor: &dyn Extractor) -> bool {
        match extractor.get(TRACEPARENT_HEADER) {
            Some(header) => cx.as_child_of_header(header.trim()),
            None => false,
        }
    }
}
