//! SDK Configuration
//!
//! Configuration selects the sampler consulted for new traces and the size
//! of the context pool. Defaults can be overridden through environment
//! variables and then through the `with_*` methods.
use crate::sampler::{ConstantSampler, ProbabilitySampler, RateLimitingSampler};
use apm_context::{apm_warn, ContextPool, Sampler};
use std::env;
use std::str::FromStr;

/// Selects the sampler: `always_on`, `always_off`, `probability` or `rate_limited`.
pub const APM_TRACES_SAMPLER: &str = "APM_TRACES_SAMPLER";
/// Ratio for `probability`, traces per second for `rate_limited`.
pub const APM_TRACES_SAMPLER_ARG: &str = "APM_TRACES_SAMPLER_ARG";
/// Number of idle contexts the pool retains.
pub const APM_CONTEXT_POOL_SIZE: &str = "APM_CONTEXT_POOL_SIZE";

const DEFAULT_RATE_PER_SECOND: f64 = 100.0;

/// Largest pool size accepted from `APM_CONTEXT_POOL_SIZE`.
pub const MAX_POOL_CAPACITY: usize = 65_536;

/// Context provider configuration
#[derive(Debug)]
#[non_exhaustive]
pub struct Config {
    /// The sampler consulted once per new trace
    pub sampler: Box<dyn Sampler>,

    /// Maximum number of idle contexts kept for reuse
    pub pool_capacity: usize,
}

impl Config {
    /// Replaces the sampler.
    pub fn with_sampler<S: Sampler + 'static>(mut self, sampler: S) -> Self {
        self.sampler = Box::new(sampler);
        self
    }

    /// Replaces the pool capacity.
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }
}

impl Default for Config {
    /// Create default configuration, honoring `APM_*` environment variables.
    fn default() -> Self {
        let mut config = Config {
            sampler: Box::new(ConstantSampler::ALWAYS_ON),
            pool_capacity: ContextPool::DEFAULT_CAPACITY,
        };

        if let Ok(size) = env::var(APM_CONTEXT_POOL_SIZE) {
            match usize::from_str(size.trim()) {
                Ok(capacity) if capacity <= MAX_POOL_CAPACITY => config.pool_capacity = capacity,
                Ok(_) => {
                    apm_warn!(
                        name: "ContextProvider.Config.PoolSizeTooLarge",
                        message = "APM_CONTEXT_POOL_SIZE exceeds the maximum pool size. Using the maximum: 65536",
                        apm_context_pool_size = size.as_str()
                    );
                    config.pool_capacity = MAX_POOL_CAPACITY;
                }
                Err(_) => {
                    apm_warn!(
                        name: "ContextProvider.Config.InvalidPoolSize",
                        message = "APM_CONTEXT_POOL_SIZE must be a non-negative integer. Using the default: 512",
                        apm_context_pool_size = size.as_str()
                    );
                }
            }
        }

        let sampler_arg = env::var(APM_TRACES_SAMPLER_ARG).ok();
        if let Ok(sampler) = env::var(APM_TRACES_SAMPLER) {
            config.sampler = match sampler.as_str() {
                "always_on" => Box::new(ConstantSampler::ALWAYS_ON),
                "always_off" => Box::new(ConstantSampler::ALWAYS_OFF),
                "probability" => {
                    if let Some(r) = parse_arg(sampler_arg.as_deref()) {
                        Box::new(ProbabilitySampler::new(r))
                    } else {
                        apm_warn!(
                            name: "ContextProvider.Config.InvalidSamplerArgument",
                            message = "APM_TRACES_SAMPLER is set to 'probability' but APM_TRACES_SAMPLER_ARG is missing or invalid. Falling back to default ratio: 1.0",
                            apm_traces_sampler_arg = format!("{:?}", sampler_arg)
                        );
                        Box::new(ProbabilitySampler::new(1.0))
                    }
                }
                "rate_limited" => {
                    if let Some(rate) = parse_arg(sampler_arg.as_deref()) {
                        Box::new(RateLimitingSampler::new(rate))
                    } else {
                        apm_warn!(
                            name: "ContextProvider.Config.InvalidSamplerArgument",
                            message = "APM_TRACES_SAMPLER is set to 'rate_limited' but APM_TRACES_SAMPLER_ARG is missing or invalid. Falling back to default rate: 100 traces per second",
                            apm_traces_sampler_arg = format!("{:?}", sampler_arg)
                        );
                        Box::new(RateLimitingSampler::new(DEFAULT_RATE_PER_SECOND))
                    }
                }
                s => {
                    apm_warn!(
                        name: "ContextProvider.Config.InvalidSamplerType",
                        message = format!(
                            "Unrecognized sampler type '{}' in APM_TRACES_SAMPLER. Valid values are: always_on, always_off, probability, rate_limited. Using fallback sampler: always_on",
                            s
                        ),
                    );
                    Box::new(ConstantSampler::ALWAYS_ON)
                }
            }
        }

        config
    }
}

fn parse_arg(arg: Option<&str>) -> Option<f64> {
    arg.and_then(|arg| f64::from_str(arg.trim()).ok())
        .filter(|value| value.is_finite())
}
