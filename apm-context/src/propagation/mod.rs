//! # Context propagation
//!
//! A [`TraceContext`] crosses process boundaries as a `traceparent` header
//! ([`header`]) and crosses boundaries without text headers, such as a
//! handoff to another worker, as a fixed-width binary snapshot ([`binary`]).
//!
//! Instrumentation hands its request or response headers to the
//! [`TraceContextPropagator`] through the [`Injector`] and [`Extractor`]
//! carrier traits.
//!
//! [`TraceContext`]: crate::TraceContext
use std::borrow::Cow;
use std::collections::HashMap;
use std::env;
use std::hash::BuildHasher;
use std::process::Command;

pub mod binary;
pub mod header;
mod trace_context;

pub use trace_context::TraceContextPropagator;

/// Write side of a header carrier, such as an outgoing request.
pub trait Injector {
    /// Stores `value` under the header name `key`.
    fn set(&mut self, key: &str, value: String);
}

/// Read side of a header carrier, such as an incoming request.
pub trait Extractor {
    /// The value stored under the header name `key`, if any.
    fn get(&self, key: &str) -> Option<Cow<'_, str>>;
}

/// Header names are stored lower-cased, so lookups ignore case.
impl<S: BuildHasher> Injector for HashMap<String, String, S> {
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_ascii_lowercase(), value);
    }
}

impl<S: BuildHasher> Extractor for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        HashMap::get(self, &key.to_ascii_lowercase())
            .map(|value| Cow::Borrowed(value.as_str()))
    }
}

/// Passes the context to a child process through its environment. The
/// header name becomes an upper-case variable name, `TRACEPARENT`.
impl Injector for Command {
    fn set(&mut self, key: &str, value: String) {
        self.env(key.to_ascii_uppercase(), value);
    }
}

/// Reads the context a parent process passed through the environment with
/// the [`Command`] injector.
#[derive(Debug, Default)]
pub struct EnvExtractor {
    _private: (),
}

impl EnvExtractor {
    /// Creates an extractor over the current process environment.
    pub fn new() -> Self {
        EnvExtractor { _private: () }
    }
}

impl Extractor for EnvExtractor {
    fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        env::var(key.to_ascii_uppercase()).ok().map(Cow::Owned)
    }
}
