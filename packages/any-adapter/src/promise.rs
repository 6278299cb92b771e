use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use deferred_context::Queue;
use deferred_core::{Catchable, Error, Outcome, Promise, Thenable};

use crate::error::AnyError;
use crate::future::AnyFuture;

/// A dynamically typed value.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// A fallible deferred value over [`AnyValue`].
#[derive(Clone)]
pub struct AnyPromise {
    inner: Promise<AnyValue>,
}

impl AnyPromise {
    /// Bridge a typed chain, boxing its value on success.
    pub fn new<P>(thenable: &P) -> Self
    where
        P: Thenable,
        P::Value: Send + Sync,
    {
        let inner = Promise::empty();
        let target = inner.clone();
        thenable.observe(move |outcome: Outcome<P::Value>| {
            target
                .seal()
                .settle(outcome.map(|value| Arc::new(value) as AnyValue));
        });
        Self { inner }
    }

    pub fn value<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::wrap(Promise::value(Arc::new(value) as AnyValue))
    }

    fn wrap(inner: Promise<AnyValue>) -> Self {
        Self { inner }
    }

    /// Hand the write side to `body` immediately.
    pub fn with_future<F>(body: F) -> Self
    where
        F: FnOnce(&AnyFuture),
    {
        let promise = Self::wrap(Promise::empty());
        body(&AnyFuture::new(promise.inner.seal().clone()));
        promise
    }

    /// Hand the write side to `body` in a job on `queue`, which also
    /// becomes the home queue.
    pub fn with_future_on<F>(queue: &Queue, body: F) -> Self
    where
        F: FnOnce(&AnyFuture) + Send + 'static,
    {
        let promise = Self::homed(queue);
        let future = AnyFuture::new(promise.inner.seal().clone());
        queue.run(move || body(&future));
        promise
    }

    /// Hand the write side to `body` on the calling thread, with `queue` as
    /// the home queue.
    pub fn with_future_on_current<F>(queue: &Queue, body: F) -> Self
    where
        F: FnOnce(&AnyFuture),
    {
        let promise = Self::homed(queue);
        body(&AnyFuture::new(promise.inner.seal().clone()));
        promise
    }

    fn homed(queue: &Queue) -> Self {
        let promise = Self::wrap(Promise::empty());
        promise.inner.set_home(Some(queue.clone()));
        promise
    }

    pub fn map<F>(&self, transform: F) -> Self
    where
        F: FnOnce(AnyValue) -> AnyValue + Send + 'static,
    {
        Self::wrap(self.inner.map(transform))
    }

    pub fn map_on<F>(&self, queue: &Queue, transform: F) -> Self
    where
        F: FnOnce(AnyValue) -> AnyValue + Send + 'static,
    {
        Self::wrap(self.inner.map_on(queue, transform))
    }

    pub fn done<F>(&self, effect: F) -> Self
    where
        F: FnOnce(AnyValue) + Send + 'static,
    {
        Self::new(&self.inner.done(effect))
    }

    pub fn done_on<F>(&self, queue: &Queue, effect: F) -> Self
    where
        F: FnOnce(AnyValue) + Send + 'static,
    {
        Self::new(&self.inner.done_on(queue, effect))
    }

    pub fn then<F>(&self, continuation: F) -> Self
    where
        F: FnOnce(AnyValue) -> AnyPromise + Send + 'static,
    {
        Self::wrap(self.inner.then(continuation))
    }

    pub fn then_on<F>(&self, queue: &Queue, continuation: F) -> Self
    where
        F: FnOnce(AnyValue) -> AnyPromise + Send + 'static,
    {
        Self::wrap(self.inner.then_on(queue, continuation))
    }

    pub fn catch<F>(&self, handler: F) -> Self
    where
        F: FnOnce(&Error) + Send + 'static,
    {
        Self::wrap(self.inner.catch(handler))
    }

    pub fn catch_on<F>(&self, queue: &Queue, handler: F) -> Self
    where
        F: FnOnce(&Error) + Send + 'static,
    {
        Self::wrap(self.inner.catch_on(queue, handler))
    }

    pub fn ensure<F>(&self, cleanup: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::wrap(self.inner.ensure(cleanup))
    }

    pub fn ensure_on<F>(&self, queue: &Queue, cleanup: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::wrap(self.inner.ensure_on(queue, cleanup))
    }

    pub fn as_void(&self) -> Promise<()> {
        self.inner.as_void()
    }

    /// Return to typed code. Rejects with [`AnyError::TypeMismatch`] when
    /// the value is not a `T`.
    pub fn downcast<T>(&self) -> Promise<T>
    where
        T: Any + Clone + Send + Sync,
    {
        self.inner.try_map(|value| match value.downcast_ref::<T>() {
            Some(typed) => Ok(typed.clone()),
            None => {
                let expected = type_name::<T>();
                tracing::debug!(expected, "dynamic value has another type");
                Err(Error::new(AnyError::TypeMismatch { expected }))
            }
        })
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.is_sealed()
    }

    /// Block until settled. See [`Promise::wait`].
    pub fn wait(&self) -> Result<AnyValue, Error> {
        self.inner.wait()
    }
}

impl Thenable for AnyPromise {
    type Value = AnyValue;

    fn empty() -> Self {
        Self::wrap(Promise::empty())
    }

    fn observe<F>(&self, observer: F)
    where
        F: FnOnce(Outcome<AnyValue>) + Send + 'static,
    {
        self.inner.observe(observer);
    }

    fn resolve(&self, value: AnyValue) {
        self.inner.resolve(value);
    }

    fn resolve_with<P>(&self, queue: Option<&Queue>, other: &P)
    where
        P: Thenable<Value = AnyValue>,
    {
        self.inner.resolve_with(queue, other);
    }

    fn home(&self) -> Option<Queue> {
        self.inner.home()
    }

    fn set_home(&self, queue: Option<Queue>) {
        self.inner.set_home(queue);
    }
}

impl Catchable for AnyPromise {
    fn reject(&self, error: Error) {
        self.inner.reject(error);
    }
}

impl fmt::Debug for AnyPromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.inner.outcome() {
            None => "pending",
            Some(Ok(_)) => "fulfilled",
            Some(Err(_)) => "rejected",
        };
        f.debug_struct("AnyPromise").field("state", &state).finish()
    }
}
