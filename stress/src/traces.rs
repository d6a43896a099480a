/*
    Derives a transaction from an incoming header and two nested spans from
    it, all checked out of one shared pool, then injects the outgoing
    header. Contention on the pool shows up here.
*/

use apm_context::propagation::Injector;
use apm_context_sdk::{ConstantSampler, TraceContextProvider};
use lazy_static::lazy_static;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

mod throughput;

const INCOMING: &str = "00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01";

lazy_static! {
    static ref PROVIDER: TraceContextProvider = TraceContextProvider::builder()
        .with_sampler(ConstantSampler::ALWAYS_ON)
        .with_pool_capacity(1024)
        .build();
}

/// Carrier that drops what it is given.
struct NoOpCarrier;

impl Injector for NoOpCarrier {
    fn set(&mut self, _key: &str, _value: String) {
        // No-op
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(LevelFilter::WARN))
        .init();
    throughput::test_throughput(test_contexts);
}

fn test_contexts() {
    let transaction = PROVIDER.continue_from_header(Some(INCOMING));
    let span = PROVIDER.child_of(&transaction);
    let nested = PROVIDER.child_of(&span);
    PROVIDER.inject(&nested, &mut NoOpCarrier);
}
