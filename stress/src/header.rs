/*
    Parses an incoming traceparent header and renders the outgoing one,
    the work done on every instrumented request boundary.
*/

use apm_context::propagation::header::HeaderCodec;
use apm_context::SpanId;

mod throughput;

const INCOMING: &str = "00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01";

fn main() {
    throughput::test_throughput(test_header);
}

fn test_header() {
    if let Ok(parent) = HeaderCodec::parse(INCOMING) {
        let _outgoing = HeaderCodec::render(
            parent.trace_id,
            SpanId::from(0x00f0_67aa_0ba9_02b7),
            parent.flags,
        );
    }
}
