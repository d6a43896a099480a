//! Sampling strategies, configuration and a pooled context provider for
//! [`apm_context`].
//!
//! # Getting Started
//!
//! ```
//! use apm_context_sdk::{ProbabilitySampler, TraceContextProvider};
//! use std::collections::HashMap;
//!
//! let provider = TraceContextProvider::builder()
//!     .with_sampler(ProbabilitySampler::new(0.1))
//!     .with_pool_capacity(64)
//!     .build();
//!
//! // Incoming request.
//! let transaction = provider.continue_from_header(Some(
//!     "00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01",
//! ));
//! assert!(transaction.is_sampled());
//!
//! // Outgoing call.
//! let span = provider.child_of(&transaction);
//! let mut headers: HashMap<String, String> = HashMap::new();
//! provider.inject(&span, &mut headers);
//! assert!(headers.contains_key("traceparent"));
//! ```
//!
//! The sampler and pool size can also be chosen through the environment;
//! see [`Config`].
//!
//! # Crate Feature Flags
//!
//! * `internal-logs`: emits the SDK's own diagnostics (configuration
//!   fallbacks, clock rewinds) through `tracing`. Enabled by default.
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

mod config;
mod provider;
mod rate_limit;
mod sampler;

pub use config::{
    Config, APM_CONTEXT_POOL_SIZE, APM_TRACES_SAMPLER, APM_TRACES_SAMPLER_ARG, MAX_POOL_CAPACITY,
};
pub use provider::{Builder, TraceContextProvider};
pub use sampler::{ConstantSampler, ProbabilitySampler, RateLimitingSampler};
