use crate::error::{ContextError, ContextResult};
use std::fmt;
use std::hash::Hash;
use std::ops::{BitAnd, BitOr, Not};

/// Width of a [`TraceId`] in bytes.
pub const TRACE_ID_BYTES: usize = 16;

/// Width of a [`SpanId`] in bytes.
///
/// Every length on the wire (header segments, total header length, binary
/// buffer width) is derived from this value.
pub const SPAN_ID_BYTES: usize = 8;

/// Number of hex digits in a rendered [`TraceId`].
pub const TRACE_ID_HEX_LEN: usize = TRACE_ID_BYTES * 2;

/// Number of hex digits in a rendered [`SpanId`].
pub const SPAN_ID_HEX_LEN: usize = SPAN_ID_BYTES * 2;

/// Flags carried with a trace context.
///
/// Only bit 0, [`TraceFlags::SAMPLED`], has a meaning to this crate. All other
/// bits are kept exactly as they were received so that flags set by newer
/// producers survive a hop through this agent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Copy, Hash)]
pub struct TraceFlags(u8);

impl TraceFlags {
    /// Trace flags with the `sampled` flag set to `0`.
    pub const NOT_SAMPLED: TraceFlags = TraceFlags(0x00);

    /// Trace flags with the `sampled` flag set to `1`.
    pub const SAMPLED: TraceFlags = TraceFlags(0x01);

    /// Construct new trace flags
    pub const fn new(flags: u8) -> Self {
        TraceFlags(flags)
    }

    /// Returns `true` if the `sampled` flag is set
    pub fn is_sampled(&self) -> bool {
        (*self & TraceFlags::SAMPLED) == TraceFlags::SAMPLED
    }

    /// Returns copy of the current flags with the `sampled` flag set or cleared.
    ///
    /// All other bits are left untouched.
    pub fn with_sampled(&self, sampled: bool) -> Self {
        if sampled {
            *self | TraceFlags::SAMPLED
        } else {
            *self & !TraceFlags::SAMPLED
        }
    }

    /// Returns the flags as a `u8`
    pub fn to_u8(self) -> u8 {
        self.0
    }

    /// Parses exactly two hex digits.
    pub fn from_hex(hex: &str) -> ContextResult<Self> {
        parse_hex_u128(hex, 2).map(|v| TraceFlags(v as u8))
    }
}

impl BitAnd for TraceFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for TraceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl Not for TraceFlags {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl fmt::LowerHex for TraceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A 16-byte value which identifies a given trace.
///
/// The id is empty if all of its bytes are zero.
#[derive(Clone, PartialEq, Eq, Copy, Hash, Default)]
pub struct TraceId(u128);

impl TraceId {
    /// The empty trace id
    pub const INVALID: TraceId = TraceId(0);

    /// Create a trace id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; TRACE_ID_BYTES]) -> Self {
        TraceId(u128::from_be_bytes(bytes))
    }

    /// Return the representation of this trace id as a byte array.
    pub const fn to_bytes(self) -> [u8; TRACE_ID_BYTES] {
        self.0.to_be_bytes()
    }

    /// Returns `true` if all bits are zero.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Parses exactly 32 hex digits, upper or lower case.
    ///
    /// An all-zero value parses successfully; whether that is acceptable is
    /// up to the caller.
    ///
    /// # Examples
    ///
    /// ```
    /// use apm_context::TraceId;
    ///
    /// assert!(TraceId::from_hex("0af7651916cd43dd8448eb211c80319c").is_ok());
    ///
    /// assert!(TraceId::from_hex("42").is_err());
    /// assert!(TraceId::from_hex("not_hex").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> ContextResult<Self> {
        parse_hex_u128(hex, TRACE_ID_HEX_LEN).map(TraceId)
    }
}

impl From<u128> for TraceId {
    fn from(value: u128) -> Self {
        TraceId(value)
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::LowerHex for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// An 8-byte value which identifies a span, and, used as a parent id, the
/// span that caused another one.
///
/// The id is empty if all of its bytes are zero.
#[derive(Clone, PartialEq, Eq, Copy, Hash, Default)]
pub struct SpanId(u64);

impl SpanId {
    /// The empty span id
    pub const INVALID: SpanId = SpanId(0);

    /// Create a span id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; SPAN_ID_BYTES]) -> Self {
        SpanId(u64::from_be_bytes(bytes))
    }

    /// Return the representation of this span id as a byte array.
    pub const fn to_bytes(self) -> [u8; SPAN_ID_BYTES] {
        self.0.to_be_bytes()
    }

    /// Returns `true` if all bits are zero.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Parses exactly 16 hex digits, upper or lower case.
    ///
    /// # Examples
    ///
    /// ```
    /// use apm_context::SpanId;
    ///
    /// assert!(SpanId::from_hex("b9c7c989f97918e1").is_ok());
    ///
    /// assert!(SpanId::from_hex("b9c7c989f97918e").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> ContextResult<Self> {
        parse_hex_u128(hex, SPAN_ID_HEX_LEN).map(|v| SpanId(v as u64))
    }
}

impl From<u64> for SpanId {
    fn from(value: u64) -> Self {
        SpanId(value)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::LowerHex for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

// `from_str_radix` accepts a leading `+`, so the digits are checked by hand.
pub(crate) fn parse_hex_u128(hex: &str, expected: usize) -> ContextResult<u128> {
    let bytes = hex.as_bytes();
    if bytes.len() != expected {
        return Err(ContextError::MalformedId { expected });
    }

    let mut value: u128 = 0;
    for &b in bytes {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return Err(ContextError::MalformedId { expected }),
        };
        value = (value << 4) | u128::from(digit);
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    fn trace_id_test_data() -> Vec<(TraceId, &'static str, [u8; 16])> {
        vec![
            (TraceId(0), "00000000000000000000000000000000", [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
            (TraceId(42), "0000000000000000000000000000002a", [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 42]),
            (TraceId(126642714606581564793456114182061442190), "5f467fe7bf42676c05e20ba4a90e448e", [95, 70, 127, 231, 191, 66, 103, 108, 5, 226, 11, 164, 169, 14, 68, 142])
        ]
    }

    #[rustfmt::skip]
    fn span_id_test_data() -> Vec<(SpanId, &'static str, [u8; 8])> {
        vec![
            (SpanId(0), "0000000000000000", [0, 0, 0, 0, 0, 0, 0, 0]),
            (SpanId(42), "000000000000002a", [0, 0, 0, 0, 0, 0, 0, 42]),
            (SpanId(5508496025762705295), "4c721bf33e3caf8f", [76, 114, 27, 243, 62, 60, 175, 143])
        ]
    }

    #[test]
    fn test_trace_id() {
        for test_case in trace_id_test_data() {
            assert_eq!(format!("{}", test_case.0), test_case.1);
            assert_eq!(test_case.0.to_bytes(), test_case.2);

            assert_eq!(test_case.0, TraceId::from_hex(test_case.1).unwrap());
            assert_eq!(test_case.0, TraceId::from_bytes(test_case.2));
        }
    }

    #[test]
    fn test_span_id() {
        for test_case in span_id_test_data() {
            assert_eq!(format!("{}", test_case.0), test_case.1);
            assert_eq!(test_case.0.to_bytes(), test_case.2);

            assert_eq!(test_case.0, SpanId::from_hex(test_case.1).unwrap());
            assert_eq!(test_case.0, SpanId::from_bytes(test_case.2));
        }
    }

    #[test]
    fn from_hex_accepts_mixed_case() {
        assert_eq!(
            TraceId::from_hex("0AF7651916CD43DD8448eb211c80319c").unwrap(),
            TraceId::from(0x0af7_6519_16cd_43dd_8448_eb21_1c80_319c)
        );
        assert_eq!(
            SpanId::from_hex("B9C7C989F97918E1").unwrap(),
            SpanId::from(0xb9c7_c989_f979_18e1)
        );
    }

    #[test]
    fn from_hex_rejects_wrong_length_and_non_hex() {
        let malformed = Err(ContextError::MalformedId { expected: 32 });
        assert_eq!(TraceId::from_hex("af7651916cd43dd8448eb211c80319c"), malformed);
        assert_eq!(TraceId::from_hex("00af7651916cd43dd8448eb211c80319c"), malformed);
        assert_eq!(TraceId::from_hex("$af7651916cd43dd8448eb211c80319c"), malformed);
        assert_eq!(TraceId::from_hex("+af7651916cd43dd8448eb211c80319c"), malformed);
        assert_eq!(TraceId::from_hex(""), malformed);

        assert_eq!(
            SpanId::from_hex("b9c7c989f97918g1"),
            Err(ContextError::MalformedId { expected: 16 })
        );
    }

    #[test]
    fn all_zero_parses_but_is_empty() {
        let trace_id = TraceId::from_hex("00000000000000000000000000000000").unwrap();
        assert!(trace_id.is_empty());
        assert_eq!(trace_id, TraceId::INVALID);

        let span_id = SpanId::from_hex("0000000000000000").unwrap();
        assert!(span_id.is_empty());
        assert!(!SpanId::from(1).is_empty());
    }

    #[test]
    fn flags_keep_unknown_bits() {
        let flags = TraceFlags::new(0x03);
        assert!(flags.is_sampled());
        assert_eq!(flags.with_sampled(false).to_u8(), 0x02);
        assert_eq!(flags.with_sampled(false).with_sampled(true).to_u8(), 0x03);
        assert_eq!(TraceFlags::new(0xfe).with_sampled(true).to_u8(), 0xff);
        assert!(!TraceFlags::new(0xfe).is_sampled());
    }

    #[test]
    fn flags_from_hex() {
        assert_eq!(TraceFlags::from_hex("ff").unwrap().to_u8(), 0xff);
        assert_eq!(TraceFlags::from_hex("0A").unwrap().to_u8(), 0x0a);
        assert!(TraceFlags::from_hex("1").is_err());
        assert!(TraceFlags::from_hex("qw").is_err());
        assert!(TraceFlags::from_hex("010").is_err());
    }
}
