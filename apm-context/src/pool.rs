//! Reuse of [`TraceContext`] slots across sequential units of work.
use crate::context::TraceContext;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};

/// A bounded set of idle, reset contexts.
///
/// [`checkout`] hands out one context to exactly one owner; the context is
/// unset when handed out and returns to the pool, reset, when the
/// [`PooledContext`] guard is dropped. The pool never hands the same slot to
/// two owners, so the contexts themselves need no synchronization.
///
/// [`checkout`]: ContextPool::checkout
pub struct ContextPool {
    idle: Mutex<Vec<TraceContext>>,
    capacity: usize,
}

impl ContextPool {
    /// Number of idle slots retained when no capacity is given.
    pub const DEFAULT_CAPACITY: usize = 512;

    /// Upper bound on the slots allocated when the pool is created.
    pub const MAX_PREALLOCATED: usize = 1024;

    /// Creates a pool retaining up to `capacity` idle slots.
    ///
    /// At most [`MAX_PREALLOCATED`](Self::MAX_PREALLOCATED) slots are
    /// allocated up front; the pool grows past that as contexts are released.
    pub fn with_capacity(capacity: usize) -> Self {
        let preallocated = capacity.min(Self::MAX_PREALLOCATED);
        let mut idle = Vec::with_capacity(preallocated);
        idle.resize(preallocated, TraceContext::UNSET);
        ContextPool {
            idle: Mutex::new(idle),
            capacity,
        }
    }

    /// Takes an unset context out of the pool.
    ///
    /// A fresh context is created when no idle slot is left; it joins the
    /// pool on release if there is room.
    pub fn checkout(&self) -> PooledContext<'_> {
        let context = match self.lock().pop() {
            Some(context) => context,
            None => {
                crate::apm_debug!(name: "ContextPool.Exhausted", capacity = self.capacity);
                TraceContext::new()
            }
        };
        PooledContext {
            pool: self,
            context,
        }
    }

    /// Number of idle slots.
    pub fn available(&self) -> usize {
        self.lock().len()
    }

    /// Maximum number of idle slots retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn release(&self, mut context: TraceContext) {
        context.reset();
        let mut idle = self.lock();
        if idle.len() < self.capacity {
            idle.push(context);
        } else {
            crate::apm_debug!(name: "ContextPool.Full", capacity = self.capacity);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TraceContext>> {
        // Idle slots are always reset, a panicking holder cannot leave one half written.
        self.idle.lock().unwrap_or_else(|poisoned| {
            crate::apm_error!(name: "ContextPool.LockPoisoned");
            poisoned.into_inner()
        })
    }
}

impl Default for ContextPool {
    fn default() -> Self {
        ContextPool::with_capacity(ContextPool::DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for ContextPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextPool")
            .field("available", &self.available())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Exclusive checkout of a pooled [`TraceContext`].
///
/// Dereferences to the context. Dropping the guard, or calling
/// [`release`](PooledContext::release), resets the context and returns it to
/// the pool; the guard cannot be used afterwards.
pub struct PooledContext<'a> {
    pool: &'a ContextPool,
    context: TraceContext,
}

impl PooledContext<'_> {
    /// Returns the context to its pool.
    pub fn release(self) {
        drop(self)
    }
}

impl Deref for PooledContext<'_> {
    type Target = TraceContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.context
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.context));
    }
}

impl fmt::Debug for PooledContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledContext").field(&self.context).finish()
    }
}
