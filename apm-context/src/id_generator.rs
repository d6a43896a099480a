//! Id Generator
#[cfg(any(feature = "testing", test))]
pub use increment::IncrementIdGenerator;

use crate::ids::{SpanId, TraceId};
use rand::{rngs, Rng, SeedableRng};
use std::cell::RefCell;
use std::fmt;

/// Interface for generating IDs
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Generate a new, non-empty `TraceId`
    fn new_trace_id(&self) -> TraceId;

    /// Generate a new, non-empty `SpanId`
    fn new_span_id(&self) -> SpanId;
}

/// Default [`IdGenerator`] implementation.
///
/// Generates Trace and Span ids using a per-thread random number generator
/// seeded from the operating system.
#[derive(Clone, Debug, Default)]
pub struct RandomIdGenerator {
    _private: (),
}

impl IdGenerator for RandomIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        CURRENT_RNG.with_borrow_mut(|rng| loop {
            let id = TraceId::from(rng.random::<u128>());
            if !id.is_empty() {
                return id;
            }
        })
    }

    fn new_span_id(&self) -> SpanId {
        CURRENT_RNG.with_borrow_mut(|rng| loop {
            let id = SpanId::from(rng.random::<u64>());
            if !id.is_empty() {
                return id;
            }
        })
    }
}

thread_local! {
    /// Store random number generator for each thread
    static CURRENT_RNG: RefCell<rngs::SmallRng> = RefCell::new(rngs::SmallRng::from_os_rng());
}

/// Generates a random, non-empty trace id.
pub fn generate_trace_id() -> TraceId {
    RandomIdGenerator::default().new_trace_id()
}

/// Generates a random, non-empty span id.
pub fn generate_span_id() -> SpanId {
    RandomIdGenerator::default().new_span_id()
}

/// Draws a random `u64` from the same per-thread generator used for ids.
pub fn random_u64() -> u64 {
    CURRENT_RNG.with_borrow_mut(|rng| rng.random::<u64>())
}

#[cfg(any(feature = "testing", test))]
mod increment {
    use super::IdGenerator;
    use crate::ids::{SpanId, TraceId};
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;

    /// [`IdGenerator`] implementation that increments a counter for each new ID. This helps produce
    /// predictable IDs for testing.
    #[derive(Clone, Debug)]
    pub struct IncrementIdGenerator(Arc<AtomicU64>);

    impl IncrementIdGenerator {
        /// Create a new [`IncrementIdGenerator`]
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl Default for IncrementIdGenerator {
        fn default() -> Self {
            Self(Arc::new(AtomicU64::new(1)))
        }
    }

    impl IdGenerator for IncrementIdGenerator {
        fn new_trace_id(&self) -> TraceId {
            TraceId::from(self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst) as u128)
        }

        fn new_span_id(&self) -> SpanId {
            SpanId::from(self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
        }
    }
}
