use crate::clock::ClockAnchor;
use crate::id_generator::{IdGenerator, RandomIdGenerator};
use crate::ids::{SpanId, TraceFlags, TraceId};
use crate::propagation::binary::{BinaryCodec, EncodedContext, BINARY_LEN};
use crate::propagation::header::{HeaderCodec, TraceParentHeader};
use crate::sampling::Sampler;

/// Identity of one unit of work inside a distributed trace.
///
/// A context is either *unset* (every id empty, the state after [`new`] or
/// [`reset`]) or *valid* (trace id and own id both non-empty). It becomes
/// valid through exactly one of the derivation entry points:
///
/// * [`as_root`] starts a new trace and asks the [`Sampler`] once,
/// * [`as_child_of`] continues an in-process parent,
/// * [`as_child_of_header`] continues a remote parent from a `traceparent` header,
/// * [`as_child_of_bytes`] continues a parent handed over as a binary snapshot.
///
/// After that only the `sampled` flag may change, through [`set_recorded`].
///
/// A context is owned by one unit of work at a time and is not synchronized.
/// Reuse across units of work goes through [`ContextPool`].
///
/// [`new`]: TraceContext::new
/// [`reset`]: TraceContext::reset
/// [`as_root`]: TraceContext::as_root
/// [`as_child_of`]: TraceContext::as_child_of
/// [`as_child_of_header`]: TraceContext::as_child_of_header
/// [`as_child_of_bytes`]: TraceContext::as_child_of_bytes
/// [`set_recorded`]: TraceContext::set_recorded
/// [`ContextPool`]: crate::ContextPool
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TraceContext {
    trace_id: TraceId,
    id: SpanId,
    parent_id: SpanId,
    flags: TraceFlags,
    clock: ClockAnchor,
}

impl TraceContext {
    /// An unset context.
    pub const UNSET: TraceContext = TraceContext::new();

    /// Creates an unset context.
    pub const fn new() -> Self {
        TraceContext {
            trace_id: TraceId::INVALID,
            id: SpanId::INVALID,
            parent_id: SpanId::INVALID,
            flags: TraceFlags::NOT_SAMPLED,
            clock: ClockAnchor::UNSET,
        }
    }

    /// Starts a new trace with random ids.
    pub fn as_root<S: Sampler + ?Sized>(&mut self, sampler: &S) {
        self.as_root_with_ids(sampler, &RandomIdGenerator::default())
    }

    /// Starts a new trace with ids from `ids`.
    ///
    /// The sampler's decision becomes the `sampled` flag; all other flag bits
    /// are zero.
    pub fn as_root_with_ids<S: Sampler + ?Sized>(&mut self, sampler: &S, ids: &dyn IdGenerator) {
        self.trace_id = ids.new_trace_id();
        self.id = ids.new_span_id();
        self.parent_id = SpanId::INVALID;
        self.flags = TraceFlags::NOT_SAMPLED.with_sampled(sampler.decide());
        self.clock = ClockAnchor::new();
    }

    /// Continues the trace of an in-process parent.
    ///
    /// Trace id, flags and clock anchor are copied from `parent`, whose own id
    /// becomes this context's parent id. Returns `false` and leaves `self`
    /// untouched if `parent` is not valid.
    pub fn as_child_of(&mut self, parent: &TraceContext) -> bool {
        self.as_child_of_with_ids(parent, &RandomIdGenerator::default())
    }

    /// Like [`as_child_of`](TraceContext::as_child_of) with ids from `ids`.
    pub fn as_child_of_with_ids(&mut self, parent: &TraceContext, ids: &dyn IdGenerator) -> bool {
        if !parent.is_valid() {
            return false;
        }
        self.trace_id = parent.trace_id;
        self.parent_id = parent.id;
        self.id = ids.new_span_id();
        self.flags = parent.flags;
        self.clock = parent.clock;
        true
    }

    /// Continues a remote trace from a `traceparent` header.
    ///
    /// Returns `false` and leaves `self` untouched if the header is rejected;
    /// the caller is expected to start a new trace instead.
    pub fn as_child_of_header(&mut self, header: &str) -> bool {
        match HeaderCodec::parse(header) {
            Ok(parent) => {
                self.trace_id = parent.trace_id;
                self.parent_id = parent.parent_id;
                self.id = RandomIdGenerator::default().new_span_id();
                self.flags = parent.flags;
                // The sender's anchor does not travel in the header.
                self.clock = ClockAnchor::new();
                true
            }
            Err(err) => {
                crate::apm_debug!(
                    name: "TraceContext.HeaderRejected",
                    reason = format!("{err}")
                );
                false
            }
        }
    }

    /// Continues a remote trace if `header` is present and accepted, and
    /// starts a new trace otherwise.
    ///
    /// Returns `true` if an existing trace was continued.
    pub fn as_child_of_header_or_root<S: Sampler + ?Sized>(
        &mut self,
        header: Option<&str>,
        sampler: &S,
    ) -> bool {
        if header.is_some_and(|header| self.as_child_of_header(header)) {
            return true;
        }
        self.as_root(sampler);
        false
    }

    /// Continues the trace of a context encoded with [`serialize`].
    ///
    /// The encoded context becomes the parent of `self`. Returns `false` and
    /// leaves `self` untouched if `bytes` is not exactly [`BINARY_LEN`] long
    /// or does not hold a valid context.
    ///
    /// [`serialize`]: TraceContext::serialize
    pub fn as_child_of_bytes(&mut self, bytes: &[u8]) -> bool {
        match BinaryCodec::decode(bytes) {
            Ok(parent) => {
                self.trace_id = parent.trace_id;
                self.parent_id = parent.span_id;
                self.id = RandomIdGenerator::default().new_span_id();
                self.flags = parent.flags;
                self.clock = parent.clock;
                true
            }
            Err(err) => {
                crate::apm_debug!(
                    name: "TraceContext.SnapshotRejected",
                    reason = format!("{err}")
                );
                false
            }
        }
    }

    /// Encodes trace id, own id, flags and clock anchor.
    pub fn serialize(&self) -> [u8; BINARY_LEN] {
        BinaryCodec::encode(&EncodedContext {
            trace_id: self.trace_id,
            span_id: self.id,
            flags: self.flags,
            clock: self.clock,
        })
    }

    /// Overwrites the `sampled` flag, keeping every other flag bit.
    pub fn set_recorded(&mut self, recorded: bool) {
        self.flags = self.flags.with_sampled(recorded);
    }

    /// Returns the context to the unset state.
    pub fn reset(&mut self) {
        *self = TraceContext::UNSET;
    }

    /// The header to send with outgoing calls. It names this context as the
    /// parent of the next hop.
    pub fn outgoing_header(&self) -> TraceParentHeader {
        HeaderCodec::render(self.trace_id, self.id, self.flags)
    }

    /// The header this context was derived from, rebuilt from its parent id.
    pub fn incoming_header(&self) -> TraceParentHeader {
        HeaderCodec::render(self.trace_id, self.parent_id, self.flags)
    }

    /// The id shared by every context of the trace.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// This context's own id.
    pub fn id(&self) -> SpanId {
        self.id
    }

    /// The id of the context that caused this one. Empty for roots.
    pub fn parent_id(&self) -> SpanId {
        self.parent_id
    }

    /// Flags, including bits this crate does not interpret.
    pub fn flags(&self) -> TraceFlags {
        self.flags
    }

    /// Time base shared by every context of the trace.
    pub fn clock(&self) -> ClockAnchor {
        self.clock
    }

    /// Returns `true` if the `sampled` flag is set.
    pub fn is_sampled(&self) -> bool {
        self.flags.is_sampled()
    }

    /// Returns `true` if trace id and own id are both non-empty.
    pub fn is_valid(&self) -> bool {
        !self.trace_id.is_empty() && !self.id.is_empty()
    }

    /// Returns `true` for a valid context without a parent.
    pub fn is_root(&self) -> bool {
        self.is_valid() && self.parent_id.is_empty()
    }

    /// Returns `true` if `parent` is the direct parent of this context.
    pub fn is_child_of(&self, parent: &TraceContext) -> bool {
        self.is_valid() && self.trace_id == parent.trace_id && self.parent_id == parent.id
    }
}
