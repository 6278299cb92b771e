use deferred_context::Queue;
use deferred_core::{Error, Seal};

use crate::promise::{AnyPromise, AnyValue};

/// Write side of an [`AnyPromise`].
#[derive(Clone)]
pub struct AnyFuture {
    seal: Seal<AnyValue>,
}

impl AnyFuture {
    pub(crate) fn new(seal: Seal<AnyValue>) -> Self {
        Self { seal }
    }

    pub fn resolve(&self, value: AnyValue) {
        self.seal.resolve(value);
    }

    pub fn reject(&self, error: Error) {
        self.seal.reject(error);
    }

    /// Settle with whatever `promise` settles with.
    pub fn resolve_with_promise(&self, promise: &AnyPromise) {
        self.seal.resolve_with(None, promise);
    }

    /// Settle on `queue` with whatever `promise` settles with.
    pub fn resolve_on(&self, queue: &Queue, promise: &AnyPromise) {
        self.seal.resolve_with(Some(queue), promise);
    }

    pub fn is_sealed(&self) -> bool {
        self.seal.is_sealed()
    }
}
