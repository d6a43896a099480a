//! Distributed trace context engine for APM agents.
//!
//! Every unit of work an agent records (a transaction, a span, an outgoing
//! call) carries a [`TraceContext`]: the id of the trace it belongs to, its
//! own id, the id of its parent and a flags byte whose lowest bit says
//! whether the trace is recorded.
//!
//! # Deriving contexts
//!
//! ```
//! use apm_context::{Sampler, TraceContext};
//!
//! #[derive(Debug)]
//! struct Always;
//!
//! impl Sampler for Always {
//!     fn decide(&self) -> bool {
//!         true
//!     }
//! }
//!
//! // Incoming request without a usable header: start a new trace.
//! let mut transaction = TraceContext::new();
//! let continued = transaction.as_child_of_header_or_root(Some("not a header"), &Always);
//! assert!(!continued);
//! assert!(transaction.is_root());
//!
//! // Child work inherits trace id, flags and clock anchor.
//! let mut span = TraceContext::new();
//! assert!(span.as_child_of(&transaction));
//! assert!(span.is_child_of(&transaction));
//!
//! // Outgoing call: the header names `span` as the parent of the next hop.
//! let header = span.outgoing_header();
//! let mut downstream = TraceContext::new();
//! assert!(downstream.as_child_of_header(header.as_str()));
//! assert_eq!(downstream.trace_id(), transaction.trace_id());
//! ```
//!
//! # Malformed input
//!
//! Headers and binary snapshots come from outside the process. Rejections
//! never surface as errors to instrumentation: the derivation entry points
//! return `false`, leave the context untouched and log the reason at debug
//! level. The codecs in [`propagation`] expose the typed [`ContextError`] for
//! callers that want it.
//!
//! # Crate Feature Flags
//!
//! * `internal-logs`: emits the crate's own diagnostics through `tracing`.
//!   Enabled by default.
//! * `testing`: exposes [`IncrementIdGenerator`] for predictable ids.
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(
    docsrs,
    feature(doc_cfg, doc_auto_cfg),
    deny(rustdoc::broken_intra_doc_links)
)]

mod clock;
mod context;
mod error;
mod id_generator;
mod ids;
mod internal_logging;
mod pool;
pub mod propagation;
mod sampling;

pub use clock::ClockAnchor;
pub use context::TraceContext;
pub use error::{ContextError, ContextResult};
#[cfg(any(feature = "testing", test))]
pub use id_generator::IncrementIdGenerator;
pub use id_generator::{
    generate_span_id, generate_trace_id, random_u64, IdGenerator, RandomIdGenerator,
};
pub use ids::{
    SpanId, TraceFlags, TraceId, SPAN_ID_BYTES, SPAN_ID_HEX_LEN, TRACE_ID_BYTES, TRACE_ID_HEX_LEN,
};
pub use pool::{ContextPool, PooledContext};
pub use sampling::Sampler;

#[doc(hidden)]
pub mod _private {
    #[cfg(feature = "internal-logs")]
    pub use tracing::{debug, error, info, warn}; // re-export
}
