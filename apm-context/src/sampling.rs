use std::fmt;
use std::sync::Arc;

/// Decides whether a new trace is recorded.
///
/// [`decide`] is called exactly once per trace, when the root context is
/// created. Contexts derived from a parent never consult a sampler: they
/// inherit the decision through the `sampled` bit of their [`TraceFlags`].
///
/// Concrete policies (constant, probability, rate limited) are provided by
/// the SDK; each is an independent implementation of this trait.
///
/// [`decide`]: Sampler::decide
/// [`TraceFlags`]: crate::TraceFlags
pub trait Sampler: Send + Sync + fmt::Debug {
    /// Returns `true` if the trace about to be started should be recorded.
    fn decide(&self) -> bool;
}

impl<S: Sampler + ?Sized> Sampler for Box<S> {
    fn decide(&self) -> bool {
        (**self).decide()
    }
}

impl<S: Sampler + ?Sized> Sampler for Arc<S> {
    fn decide(&self) -> bool {
        (**self).decide()
    }
}

impl<S: Sampler + ?Sized> Sampler for &S {
    fn decide(&self) -> bool {
        (**self).decide()
    }
}
