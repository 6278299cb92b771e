//! The fallible deferred value.

use std::fmt;

use deferred_context::Queue;

use crate::catchable::{try_map_via, try_then_via, Catchable};
use crate::error::Error;
use crate::guarantee::Guarantee;
use crate::seal::{Outcome, Seal};
use crate::thenable::{deliver, Thenable};
use crate::wait;

/// A value that will eventually succeed with a `T` or fail with an
/// [`Error`].
///
/// `Promise` is a cheap, cloneable handle; every clone observes the same
/// settlement. Its own `map`, `done`, `then` and `as_void` propagate
/// failures downstream instead of treating them as contract violations.
///
/// ```rust
/// use deferred_core::{Catchable, Error, Promise};
///
/// let (promise, seal) = Promise::pending();
/// let parsed = promise.try_map(|s: String| s.parse::<u32>().map_err(Error::new));
/// seal.resolve("42".to_string());
/// assert_eq!(parsed.wait().unwrap(), 42);
/// ```
pub struct Promise<T> {
    seal: Seal<T>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            seal: self.seal.clone(),
        }
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + 'static,
{
    /// A pending promise and the seal that settles it.
    pub fn pending() -> (Self, Seal<T>) {
        let seal = Seal::new();
        (Self { seal: seal.clone() }, seal)
    }

    pub fn value(value: T) -> Self {
        Self {
            seal: Seal::settled(Ok(value)),
        }
    }

    pub fn error(error: Error) -> Self {
        Self {
            seal: Seal::settled(Err(error)),
        }
    }

    /// Run `producer` immediately with the seal; an `Err` it returns
    /// rejects the promise unless the producer already settled it.
    pub fn new<F>(producer: F) -> Self
    where
        F: FnOnce(&Seal<T>) -> Result<(), Error>,
    {
        let (promise, seal) = Self::pending();
        if let Err(e) = producer(&seal) {
            seal.settle(Err(e));
        }
        promise
    }

    /// Run `producer` on `queue` with the seal.
    pub fn new_on<F>(queue: &Queue, producer: F) -> Self
    where
        F: FnOnce(&Seal<T>) -> Result<(), Error> + Send + 'static,
    {
        let seal = Seal::on(queue.clone());
        let promise = Self { seal: seal.clone() };
        queue.run_if_needed(move || {
            if let Err(e) = producer(&seal) {
                seal.settle(Err(e));
            }
        });
        promise
    }

    /// Run `producer` on `queue` and settle with its result.
    pub fn on<F>(queue: &Queue, producer: F) -> Self
    where
        F: FnOnce() -> Result<T, Error> + Send + 'static,
    {
        Self::new_on(queue, move |seal| {
            seal.settle(producer());
            Ok(())
        })
    }

    pub(crate) fn with_home(home: Option<Queue>) -> Self {
        let seal = Seal::new();
        seal.set_home(home);
        Self { seal }
    }

    /// The cell behind this promise.
    pub fn seal(&self) -> &Seal<T> {
        &self.seal
    }

    pub fn outcome(&self) -> Option<Outcome<T>> {
        self.seal.outcome()
    }

    pub fn is_sealed(&self) -> bool {
        self.seal.is_sealed()
    }

    /// Block the calling thread until the promise settles.
    ///
    /// Calling this from a job on the queue the promise settles on
    /// deadlocks.
    pub fn wait(&self) -> Result<T, Error> {
        wait::block_on(self)
    }

    pub fn map<U, F>(&self, transform: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        try_map_via(self, None, move |value| Ok(transform(value)))
    }

    pub fn map_on<U, F>(&self, queue: &Queue, transform: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        try_map_via(self, Some(queue), move |value| Ok(transform(value)))
    }

    pub fn done<F>(&self, effect: F) -> Promise<()>
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.map(effect)
    }

    pub fn done_on<F>(&self, queue: &Queue, effect: F) -> Promise<()>
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.map_on(queue, effect)
    }

    pub fn then<P, F>(&self, continuation: F) -> Promise<P::Value>
    where
        P: Thenable,
        F: FnOnce(T) -> P + Send + 'static,
    {
        try_then_via(self, None, move |value| Ok(continuation(value)))
    }

    pub fn then_on<P, F>(&self, queue: &Queue, continuation: F) -> Promise<P::Value>
    where
        P: Thenable,
        F: FnOnce(T) -> P + Send + 'static,
    {
        try_then_via(self, Some(queue), move |value| Ok(continuation(value)))
    }

    pub fn as_void(&self) -> Promise<()> {
        self.map(|_| ())
    }
}

impl<T> Thenable for Promise<T>
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
        self.seal.resolve_with(queue, other);
    }

    fn home(&self) -> Option<Queue> {
        self.seal.home()
    }

    fn set_home(&self, queue: Option<Queue>) {
        self.seal.set_home(queue);
    }
}

impl<T> Catchable for Promise<T>
where
    T: Clone + Send + 'static,
{
    fn reject(&self, error: Error) {
        self.seal.reject(error);
    }
}

impl<T> From<Guarantee<T>> for Promise<T>
where
    T: Clone + Send + 'static,
{
    fn from(guarantee: Guarantee<T>) -> Self {
        guarantee.as_promise()
    }
}

impl<T> fmt::Debug for Promise<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Promise").field(&self.seal).finish()
    }
}

/// Forward every settlement of `source` into a new promise.
pub(crate) fn forward<P>(source: &P) -> Promise<P::Value>
where
    P: Thenable,
{
    let next = Promise::empty();
    let target = next.clone();
    deliver(source, None, move |outcome| {
        target.seal().settle(outcome);
    });
    next
}
