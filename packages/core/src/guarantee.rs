//! The infallible deferred value.

use std::fmt;

use deferred_context::Queue;

use crate::promise::{forward, Promise};
use crate::seal::{Outcome, Seal};
use crate::thenable::{deliver, unfailable, Thenable};
use crate::wait;

/// A value that will eventually succeed with a `T` and cannot fail.
///
/// There is no way to reject a `Guarantee`. Feeding it the failure of a
/// [`Promise`] through [`Thenable::resolve_with`] is a contract violation
/// and is reported as a fatal fault.
pub struct Guarantee<T> {
    seal: Seal<T>,
}

impl<T> Clone for Guarantee<T> {
    fn clone(&self) -> Self {
        Self {
            seal: self.seal.clone(),
        }
    }
}

/// Write side of a [`Guarantee`]: it can resolve, never reject.
pub struct Resolver<T> {
    seal: Seal<T>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            seal: self.seal.clone(),
        }
    }
}

impl<T> Resolver<T>
where
    T: Clone + Send + 'static,
{
    pub fn resolve(&self, value: T) {
        self.seal.resolve(value);
    }

    /// Resolve with whatever `other` eventually resolves with.
    pub fn resolve_with<P>(&self, queue: Option<&Queue>, other: &P)
    where
        P: Thenable<Value = T>,
    {
        resolve_infallibly(&self.seal, queue, other);
    }

    pub fn is_sealed(&self) -> bool {
        self.seal.is_sealed()
    }
}

impl<T> Guarantee<T>
where
    T: Clone + Send + 'static,
{
    pub fn value(value: T) -> Self {
        Self {
            seal: Seal::settled(Ok(value)),
        }
    }

    /// A pending guarantee and the resolver that settles it.
    pub fn pending() -> (Self, Resolver<T>) {
        Self::pending_with(Seal::new())
    }

    /// Like [`Guarantee::pending`], with late observers running on `queue`.
    pub fn pending_on(queue: &Queue) -> (Self, Resolver<T>) {
        Self::pending_with(Seal::on(queue.clone()))
    }

    fn pending_with(seal: Seal<T>) -> (Self, Resolver<T>) {
        let resolver = Resolver { seal: seal.clone() };
        (Self { seal }, resolver)
    }

    /// Run `producer` on `queue` and resolve with its value.
    pub fn on<F>(queue: &Queue, producer: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (guarantee, resolver) = Self::pending_on(queue);
        queue.run_if_needed(move || resolver.resolve(producer()));
        guarantee
    }

    /// Run `producer` on `queue` and resolve with the deferred value it
    /// returns.
    pub fn chain_on<P, F>(queue: &Queue, producer: F) -> Self
    where
        P: Thenable<Value = T>,
        F: FnOnce() -> P + Send + 'static,
    {
        let (guarantee, resolver) = Self::pending_on(queue);
        let target = queue.clone();
        queue.run_if_needed(move || resolver.resolve_with(Some(&target), &producer()));
        guarantee
    }

    pub(crate) fn seal(&self) -> &Seal<T> {
        &self.seal
    }

    /// The value, if resolved.
    pub fn outcome(&self) -> Option<T> {
        self.seal.outcome().map(|outcome| match outcome {
            Ok(value) => value,
            Err(e) => unfailable(e),
        })
    }

    pub fn is_sealed(&self) -> bool {
        self.seal.is_sealed()
    }

    /// Block the calling thread until the guarantee resolves.
    ///
    /// Calling this from a job on the queue the guarantee resolves on
    /// deadlocks.
    pub fn wait(&self) -> T {
        match wait::block_on(self) {
            Ok(value) => value,
            Err(e) => unfailable(e),
        }
    }

    /// A promise settling with this guarantee's value.
    pub fn as_promise(&self) -> Promise<T> {
        forward(self)
    }
}

fn resolve_infallibly<T, P>(seal: &Seal<T>, queue: Option<&Queue>, other: &P)
where
    T: Clone + Send + 'static,
    P: Thenable<Value = T>,
{
    let seal = seal.clone();
    deliver(other, queue, move |outcome| match outcome {
        Ok(value) => {
            seal.settle(Ok(value));
        }
        Err(e) => unfailable(e),
    });
}

impl<T> Thenable for Guarantee<T>
where
    T: Clone + Send + 'static,
{
    type Value = T;

    fn empty() -> Self {
        Self { seal: Seal::new() }
    }

    fn observe<F>(&self, observer: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        self.seal.observe(observer);
    }

    fn resolve(&self, value: T) {
        self.seal.resolve(value);
    }

    fn resolve_with<P>(&self, queue: Option<&Queue>, other: &P)
    where
        P: Thenable<Value = T>,
    {
        resolve_infallibly(&self.seal, queue, other);
    }

    fn home(&self) -> Option<Queue> {
        self.seal.home()
    }

    fn set_home(&self, queue: Option<Queue>) {
        self.seal.set_home(queue);
    }
}

impl<T> fmt::Debug for Guarantee<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Guarantee").field(&self.seal).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_settles_once() {
        let (guarantee, resolver) = Guarantee::pending();
        assert!(!resolver.is_sealed());
        resolver.resolve(1);
        resolver.resolve(2);
        assert_eq!(guarantee.wait(), 1);
    }

    #[test]
    fn on_runs_producer_on_queue() {
        let queue = deferred_context::dispatcher().serial("guarantee-on");
        let target = queue.clone();
        let guarantee = Guarantee::on(&queue, move || target.is_current());
        assert!(guarantee.wait());
    }

    #[test]
    fn chain_on_follows_returned_value() {
        let queue = deferred_context::dispatcher().serial("guarantee-chain");
        let guarantee = Guarantee::chain_on(&queue, || Guarantee::value(3).map(|v| v * 3));
        assert_eq!(guarantee.wait(), 9);
    }

    #[test]
    fn resolver_follows_other_guarantee() {
        let (source, source_resolver) = Guarantee::pending();
        let (follower, resolver) = Guarantee::pending();
        resolver.resolve_with(None, &source);
        assert_eq!(follower.outcome(), None);
        source_resolver.resolve("forwarded");
        assert_eq!(follower.outcome(), Some("forwarded"));
    }

    #[test]
    fn as_promise_succeeds() {
        let promise = Guarantee::value(10).as_promise();
        assert_eq!(promise.wait().unwrap(), 10);
    }

    #[test]
    fn succeeding_promise_feeds_guarantee() {
        let guarantee = Guarantee::empty();
        guarantee.resolve_with(None, &Promise::value(5));
        assert_eq!(guarantee.wait(), 5);
    }
}
