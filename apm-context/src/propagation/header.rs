//! Textual `traceparent` codec.
//!
//! Grammar: `version-traceid-parentid-flags`, where every field is hex and
//! fields are separated by a single `-`:
//!
//! `00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01`
//!
//! Version `00` headers must be exactly [`HEADER_LEN`] characters long. Any
//! other version may carry additional data after the fourth field, which is
//! ignored.
use crate::error::{ContextError, ContextResult};
use crate::ids::{parse_hex_u128, SpanId, TraceFlags, TraceId, SPAN_ID_HEX_LEN, TRACE_ID_HEX_LEN};
use std::fmt;

/// Version emitted by [`HeaderCodec::render`].
pub const SUPPORTED_VERSION: u8 = 0;

/// Name of the propagation header.
pub const TRACEPARENT_HEADER: &str = "traceparent";

const VERSION_HEX_LEN: usize = 2;
const FLAGS_HEX_LEN: usize = 2;

/// Exact length of a version `00` header.
pub const HEADER_LEN: usize =
    VERSION_HEX_LEN + 1 + TRACE_ID_HEX_LEN + 1 + SPAN_ID_HEX_LEN + 1 + FLAGS_HEX_LEN;

const TRACE_ID_OFFSET: usize = VERSION_HEX_LEN + 1;
const SPAN_ID_OFFSET: usize = TRACE_ID_OFFSET + TRACE_ID_HEX_LEN + 1;
const FLAGS_OFFSET: usize = SPAN_ID_OFFSET + SPAN_ID_HEX_LEN + 1;

/// The fields of an accepted `traceparent` header.
///
/// `parent_id` is the id of the span that sent the header, which becomes the
/// parent of the context built from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceParent {
    /// Trace the sender belongs to. Never empty.
    pub trace_id: TraceId,
    /// Id of the sending span. Never empty.
    pub parent_id: SpanId,
    /// Flags exactly as received.
    pub flags: TraceFlags,
}

/// A rendered version `00` header held in a fixed-size buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceParentHeader {
    buf: [u8; HEADER_LEN],
}

impl TraceParentHeader {
    /// The header text.
    pub fn as_str(&self) -> &str {
        // Only ASCII hex digits and '-' are ever written into `buf`.
        std::str::from_utf8(&self.buf).unwrap_or_default()
    }

    /// Always [`HEADER_LEN`].
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        HEADER_LEN
    }
}

impl AsRef<str> for TraceParentHeader {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TraceParentHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for TraceParentHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TraceParentHeader")
            .field(&self.as_str())
            .finish()
    }
}

impl From<TraceParentHeader> for String {
    fn from(header: TraceParentHeader) -> Self {
        header.as_str().to_owned()
    }
}

/// Parses and renders `traceparent` headers.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderCodec {
    _private: (),
}

impl HeaderCodec {
    /// Parses an incoming header.
    ///
    /// Fails if there are fewer than four fields, if any of the four fields
    /// is not hex of the exact width, if the trace id or parent id is all
    /// zeros, or if a version `00` header is not exactly [`HEADER_LEN`] long.
    /// Flag bits are not validated.
    pub fn parse(header: &str) -> ContextResult<TraceParent> {
        let mut parts = header.split('-');
        let (version, trace_id, parent_id, flags) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(v), Some(t), Some(p), Some(f)) => (v, t, p, f),
                _ => return Err(ContextError::TruncatedGrammar(header.split('-').count())),
            };

        let trace_id = TraceId::from_hex(trace_id)?;
        if trace_id.is_empty() {
            return Err(ContextError::EmptyRequiredId { field: "trace-id" });
        }

        let parent_id = SpanId::from_hex(parent_id)?;
        if parent_id.is_empty() {
            return Err(ContextError::EmptyRequiredId { field: "parent-id" });
        }

        let flags = TraceFlags::from_hex(flags)?;

        let version = parse_hex_u128(version, VERSION_HEX_LEN)? as u8;
        if version == SUPPORTED_VERSION && header.len() != HEADER_LEN {
            return Err(ContextError::LengthMismatch {
                expected: HEADER_LEN,
                actual: header.len(),
            });
        }

        Ok(TraceParent {
            trace_id,
            parent_id,
            flags,
        })
    }

    /// Renders a version `00` header naming `span_id` as the parent of the
    /// next hop. Flags are written unmodified.
    pub fn render(trace_id: TraceId, span_id: SpanId, flags: TraceFlags) -> TraceParentHeader {
        let mut buf = [b'-'; HEADER_LEN];
        write_hex(&mut buf[..VERSION_HEX_LEN], u128::from(SUPPORTED_VERSION));
        write_hex(
            &mut buf[TRACE_ID_OFFSET..TRACE_ID_OFFSET + TRACE_ID_HEX_LEN],
            u128::from_be_bytes(trace_id.to_bytes()),
        );
        write_hex(
            &mut buf[SPAN_ID_OFFSET..SPAN_ID_OFFSET + SPAN_ID_HEX_LEN],
            u128::from(u64::from_be_bytes(span_id.to_bytes())),
        );
        write_hex(&mut buf[FLAGS_OFFSET..], u128::from(flags.to_u8()));
        TraceParentHeader { buf }
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

fn write_hex(dst: &mut [u8], mut value: u128) {
    for slot in dst.iter_mut().rev() {
        *slot = HEX_DIGITS[(value & 0xf) as usize];
        value >>= 4;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TRACE_ID: u128 = 0x0af7_6519_16cd_43dd_8448_eb21_1c80_319c;
    const PARENT_ID: u64 = 0xb9c7_c989_f979_18e1;

    #[test]
    fn header_len_is_derived_from_id_widths() {
        assert_eq!(HEADER_LEN, 55);
    }

    #[rustfmt::skip]
    #[rstest]
    #[case("00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-00", 0x00)]
    #[case("00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01", 0x01)]
    #[case("00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-03", 0x03)]
    #[case("00-0AF7651916CD43DD8448EB211C80319C-B9C7C989F97918E1-FF", 0xff)]
    #[case("42-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01", 0x01)]
    #[case("42-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01-unknown-extra-stuff", 0x01)]
    #[case("ff-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-09-", 0x09)]
    fn parse_accepts(#[case] header: &str, #[case] flags: u8) {
        assert_eq!(
            HeaderCodec::parse(header),
            Ok(TraceParent {
                trace_id: TraceId::from(TRACE_ID),
                parent_id: SpanId::from(PARENT_ID),
                flags: TraceFlags::new(flags),
            }),
            "{header}"
        );
    }

    #[rustfmt::skip]
    fn parse_reject_data() -> Vec<(&'static str, ContextError, &'static str)> {
        vec![
            ("00-00000000000000000000000000000000-b9c7c989f97918e1-00", ContextError::EmptyRequiredId { field: "trace-id" }, "trace id all zeroes"),
            ("00-0af7651916cd43dd8448eb211c80319c-0000000000000000-00", ContextError::EmptyRequiredId { field: "parent-id" }, "parent id all zeroes"),
            ("00-0af7651916cd43dd8448eb211c80319-0000000000000000-00", ContextError::MalformedId { expected: 32 }, "short trace id, zero parent"),
            ("00-$af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-03", ContextError::MalformedId { expected: 32 }, "non-hex in trace id"),
            ("00-00af7651916cd43dd8448eb211c80319c-9c7c989f97918e1-03", ContextError::MalformedId { expected: 32 }, "trace id too long"),
            ("00-af7651916cd43dd8448eb211c80319c-0b9c7c989f97918e1-03", ContextError::MalformedId { expected: 32 }, "trace id too short"),
            ("00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e-01", ContextError::MalformedId { expected: 16 }, "parent id too short"),
            ("00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-0g", ContextError::MalformedId { expected: 2 }, "non-hex flags"),
            ("00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-", ContextError::MalformedId { expected: 2 }, "empty flags"),
            ("qw-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01", ContextError::MalformedId { expected: 2 }, "bogus version"),
            ("00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01-", ContextError::LengthMismatch { expected: 55, actual: 56 }, "version 00 with trailing separator"),
            ("00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01-extra", ContextError::LengthMismatch { expected: 55, actual: 61 }, "version 00 with extra field"),
            ("00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1", ContextError::TruncatedGrammar(3), "missing flags"),
            ("", ContextError::TruncatedGrammar(1), "empty"),
        ]
    }

    #[test]
    fn parse_rejects() {
        for (header, expected, reason) in parse_reject_data() {
            assert_eq!(HeaderCodec::parse(header), Err(expected), "{reason}");
        }
    }

    #[test]
    fn parse_survives_hostile_input() {
        let inputs = [
            format!("00-{}-b9c7c989f97918e1-01", "a".repeat(100_000)),
            format!("00-0af7651916cd43dd8448eb211c80319c-{}-01", "b".repeat(100_000)),
            "00-cafÃ©4da6a3ce929d0e0e4736-00f067aa0ba902b7-01".to_string(),
            "00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-01\u{0}".to_string(),
            "-".repeat(10_000),
            "   ".to_string(),
        ];
        for input in inputs {
            assert!(HeaderCodec::parse(&input).is_err());
        }
    }

    #[test]
    fn render_is_fixed_width_and_lowercase() {
        let header = HeaderCodec::render(
            TraceId::from(TRACE_ID),
            SpanId::from(PARENT_ID),
            TraceFlags::new(0x03),
        );
        assert_eq!(
            header.as_str(),
            "00-0af7651916cd43dd8448eb211c80319c-b9c7c989f97918e1-03"
        );
        assert_eq!(header.len(), HEADER_LEN);
        assert_eq!(header.to_string(), header.as_str());
    }

    #[test]
    fn render_empty_ids() {
        let header = HeaderCodec::render(TraceId::INVALID, SpanId::INVALID, TraceFlags::default());
        assert_eq!(
            header.as_str(),
            "00-00000000000000000000000000000000-0000000000000000-00"
        );
    }

    #[test]
    fn render_parses_back() {
        let header = HeaderCodec::render(
            TraceId::from(TRACE_ID),
            SpanId::from(PARENT_ID),
            TraceFlags::new(0xff),
        );
        let parsed = HeaderCodec::parse(header.as_str()).unwrap();
        assert_eq!(parsed.trace_id, TraceId::from(TRACE_ID));
        assert_eq!(parsed.parent_id, SpanId::from(PARENT_ID));
        assert_eq!(parsed.flags.to_u8(), 0xff);
    }
}
