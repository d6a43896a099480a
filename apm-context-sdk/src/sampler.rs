//! # Sampling strategies
//!
//! Each strategy is an independent implementation of
//! [`apm_context::Sampler`]. The decision is taken once per trace, when its
//! root context is created; every derived context inherits it.
use crate::rate_limit::LeakyBucket;
use apm_context::{random_u64, Sampler};
use std::fmt;
use std::sync::Mutex;

/// Samples every trace or none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstantSampler {
    decision: bool,
}

impl ConstantSampler {
    /// Records every trace.
    pub const ALWAYS_ON: ConstantSampler = ConstantSampler { decision: true };

    /// Records no trace.
    pub const ALWAYS_OFF: ConstantSampler = ConstantSampler { decision: false };

    /// Returns the sampler that always decides `decision`.
    pub const fn of(decision: bool) -> Self {
        ConstantSampler { decision }
    }
}

impl Sampler for ConstantSampler {
    fn decide(&self) -> bool {
        self.decision
    }
}

/// Samples a given fraction of traces.
///
/// Ratios below 0 are treated as 0 and ratios above 1 as 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbabilitySampler {
    ratio: f64,
    upper_bound: u64,
}

impl ProbabilitySampler {
    /// Creates a sampler recording `ratio` of all traces.
    pub fn new(ratio: f64) -> Self {
        let ratio = if ratio.is_nan() {
            0.0
        } else {
            ratio.clamp(0.0, 1.0)
        };
        ProbabilitySampler {
            ratio,
            upper_bound: (ratio * (1u64 << 63) as f64) as u64,
        }
    }

    /// The effective sampling ratio.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

impl Sampler for ProbabilitySampler {
    fn decide(&self) -> bool {
        if self.ratio >= 1.0 {
            return true;
        }
        (random_u64() >> 1) < self.upper_bound
    }
}

/// Samples at most a given number of traces per second.
///
/// Allowance accumulates while traces are not started, up to one second
/// worth of traces and at least one trace. A rate of zero records nothing.
pub struct RateLimitingSampler {
    per_second: f64,
    bucket: Mutex<LeakyBucket>,
}

impl RateLimitingSampler {
    /// Creates a sampler recording up to `per_second` traces per second.
    pub fn new(per_second: f64) -> Self {
        let per_second = if per_second.is_nan() {
            0.0
        } else {
            per_second.max(0.0)
        };
        let bucket_size = if per_second > 0.0 {
            per_second.max(1.0)
        } else {
            0.0
        };
        RateLimitingSampler {
            per_second,
            bucket: Mutex::new(LeakyBucket::new(bucket_size, per_second)),
        }
    }

    /// The configured rate.
    pub fn per_second(&self) -> f64 {
        self.per_second
    }
}

impl Sampler for RateLimitingSampler {
    fn decide(&self) -> bool {
        self.bucket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .should_sample()
    }
}

impl fmt::Debug for RateLimitingSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitingSampler")
            .field("per_second", &self.per_second)
            .finish()
    }
}
