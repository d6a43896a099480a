//! Fixed-layout binary snapshot of a context, for handing a context to
//! another thread or component that does not carry text headers.
//!
//! Layout, all integers big-endian:
//!
//! | bytes | field |
//! |---|---|
//! | 16 | trace id |
//! | [`SPAN_ID_BYTES`] | id of the encoded context |
//! | 1 | flags |
//! | 8 | clock anchor offset in nanoseconds |
use crate::clock::ClockAnchor;
use crate::error::{ContextError, ContextResult};
use crate::ids::{SpanId, TraceFlags, TraceId, SPAN_ID_BYTES, TRACE_ID_BYTES};

const CLOCK_BYTES: usize = 8;

/// Exact width of an encoded context.
pub const BINARY_LEN: usize = TRACE_ID_BYTES + SPAN_ID_BYTES + 1 + CLOCK_BYTES;

const SPAN_ID_OFFSET: usize = TRACE_ID_BYTES;
const FLAGS_OFFSET: usize = SPAN_ID_OFFSET + SPAN_ID_BYTES;
const CLOCK_OFFSET: usize = FLAGS_OFFSET + 1;

/// The fields carried by an encoded context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodedContext {
    /// Trace of the encoded context.
    pub trace_id: TraceId,
    /// Own id of the encoded context.
    pub span_id: SpanId,
    /// Flags of the encoded context.
    pub flags: TraceFlags,
    /// Clock anchor of the encoded context's trace.
    pub clock: ClockAnchor,
}

/// Encodes and decodes [`EncodedContext`] snapshots.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryCodec {
    _private: (),
}

impl BinaryCodec {
    /// Writes a snapshot into a fixed-size buffer.
    pub fn encode(snapshot: &EncodedContext) -> [u8; BINARY_LEN] {
        let mut buf = [0u8; BINARY_LEN];
        buf[..SPAN_ID_OFFSET].copy_from_slice(&snapshot.trace_id.to_bytes());
        buf[SPAN_ID_OFFSET..FLAGS_OFFSET].copy_from_slice(&snapshot.span_id.to_bytes());
        buf[FLAGS_OFFSET] = snapshot.flags.to_u8();
        buf[CLOCK_OFFSET..].copy_from_slice(&snapshot.clock.offset_nanos().to_be_bytes());
        buf
    }

    /// Reads a snapshot.
    ///
    /// The buffer must be exactly [`BINARY_LEN`] bytes; truncated or padded
    /// buffers are rejected. Snapshots of a context that was never initialized
    /// are rejected as well.
    pub fn decode(bytes: &[u8]) -> ContextResult<EncodedContext> {
        let Ok(buf) = <&[u8; BINARY_LEN]>::try_from(bytes) else {
            return Err(ContextError::LengthMismatch {
                expected: BINARY_LEN,
                actual: bytes.len(),
            });
        };

        let mut trace_id = [0u8; TRACE_ID_BYTES];
        trace_id.copy_from_slice(&buf[..SPAN_ID_OFFSET]);
        let trace_id = TraceId::from_bytes(trace_id);
        if trace_id.is_empty() {
            return Err(ContextError::EmptyRequiredId { field: "trace-id" });
        }

        let mut span_id = [0u8; SPAN_ID_BYTES];
        span_id.copy_from_slice(&buf[SPAN_ID_OFFSET..FLAGS_OFFSET]);
        let span_id = SpanId::from_bytes(span_id);
        if span_id.is_empty() {
            return Err(ContextError::EmptyRequiredId { field: "span-id" });
        }

        let mut clock = [0u8; CLOCK_BYTES];
        clock.copy_from_slice(&buf[CLOCK_OFFSET..]);

        Ok(EncodedContext {
            trace_id,
            span_id,
            flags: TraceFlags::new(buf[FLAGS_OFFSET]),
            clock: ClockAnchor::from_offset_nanos(u64::from_be_bytes(clock)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> EncodedContext {
        EncodedContext {
            trace_id: TraceId::from(0x0af7_6519_16cd_43dd_8448_eb21_1c80_319c),
            span_id: SpanId::from(0xb9c7_c989_f979_18e1),
            flags: TraceFlags::new(0x03),
            clock: ClockAnchor::from_offset_nanos(1_700_000_000_123_456_789),
        }
    }

    #[test]
    fn width_is_derived_from_id_widths() {
        assert_eq!(BINARY_LEN, 33);
    }

    #[test]
    fn layout() {
        let buf = BinaryCodec::encode(&snapshot());
        assert_eq!(buf[0], 0x0a);
        assert_eq!(buf[15], 0x9c);
        assert_eq!(&buf[16..24], &[0xb9, 0xc7, 0xc9, 0x89, 0xf9, 0x79, 0x18, 0xe1]);
        assert_eq!(buf[24], 0x03);
        assert_eq!(&buf[25..], &1_700_000_000_123_456_789u64.to_be_bytes());
    }

    #[test]
    fn decode_restores_snapshot() {
        let buf = BinaryCodec::encode(&snapshot());
        assert_eq!(BinaryCodec::decode(&buf), Ok(snapshot()));
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let buf = BinaryCodec::encode(&snapshot());
        for len in [0, 5, BINARY_LEN - 1] {
            assert_eq!(
                BinaryCodec::decode(&buf[..len]),
                Err(ContextError::LengthMismatch {
                    expected: BINARY_LEN,
                    actual: len
                })
            );
        }

        let mut padded = buf.to_vec();
        padded.push(0);
        assert!(BinaryCodec::decode(&padded).is_err());
    }

    #[test]
    fn decode_rejects_uninitialized_snapshot() {
        assert_eq!(
            BinaryCodec::decode(&[0u8; BINARY_LEN]),
            Err(ContextError::EmptyRequiredId { field: "trace-id" })
        );

        let mut buf = BinaryCodec::encode(&snapshot());
        buf[SPAN_ID_OFFSET..FLAGS_OFFSET].fill(0);
        assert_eq!(
            BinaryCodec::decode(&buf),
            Err(ContextError::EmptyRequiredId { field: "span-id" })
        );
    }
}
