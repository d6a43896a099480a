/*
    Measures the cost of drawing trace and span ids from the per-thread
    generator, which every root and child derivation pays.
*/

use apm_context::{generate_span_id, generate_trace_id};

mod throughput;

fn main() {
    throughput::test_throughput(test_id_generation);
}

fn test_id_generation() {
    let _ids = (generate_trace_id(), generate_span_id());
}
