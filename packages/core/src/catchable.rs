//! Failure handling and fallible composition.

use deferred_context::Queue;

use crate::error::Error;
use crate::guarantee::Guarantee;
use crate::promise::Promise;
use crate::seal::Outcome;
use crate::thenable::{adopt_current_queue, deliver, link_guarantee, Thenable};

/// A deferred value that may settle with an [`Error`].
///
/// Upstream failures flow through every fallible composition untouched
/// until a `catch`, `recover` or `ensure` observes them. Errors returned by
/// the closures passed to `try_map`, `try_done` and `try_then` reject the
/// downstream value the same way.
pub trait Catchable: Thenable {
    fn reject(&self, error: Error);

    /// Run `handler` on failure, then forward the original result.
    ///
    /// The returned value still fails with the same error; `catch` is for
    /// side effects such as logging, not for suppressing errors.
    fn catch<F>(&self, handler: F) -> Promise<Self::Value>
    where
        F: FnOnce(&Error) + Send + 'static,
    {
        catch_via(self, None, handler)
    }

    fn catch_on<F>(&self, queue: &Queue, handler: F) -> Promise<Self::Value>
    where
        F: FnOnce(&Error) + Send + 'static,
    {
        catch_via(self, Some(queue), handler)
    }

    /// Replace a failure with `handler`'s value.
    fn recover<F>(&self, handler: F) -> Guarantee<Self::Value>
    where
        F: FnOnce(Error) -> Self::Value + Send + 'static,
    {
        recover_via(self, None, handler)
    }

    fn recover_on<F>(&self, queue: &Queue, handler: F) -> Guarantee<Self::Value>
    where
        F: FnOnce(Error) -> Self::Value + Send + 'static,
    {
        recover_via(self, Some(queue), handler)
    }

    /// Replace a failure with the guarantee `handler` returns.
    fn recover_with<F>(&self, handler: F) -> Guarantee<Self::Value>
    where
        F: FnOnce(Error) -> Guarantee<Self::Value> + Send + 'static,
    {
        recover_with_via(self, None, handler)
    }

    fn recover_with_on<F>(&self, queue: &Queue, handler: F) -> Guarantee<Self::Value>
    where
        F: FnOnce(Error) -> Guarantee<Self::Value> + Send + 'static,
    {
        recover_with_via(self, Some(queue), handler)
    }

    /// Replace a failure with `handler`'s result, which may itself fail.
    fn try_recover<F>(&self, handler: F) -> Promise<Self::Value>
    where
        F: FnOnce(Error) -> Result<Self::Value, Error> + Send + 'static,
    {
        try_recover_via(self, None, handler)
    }

    fn try_recover_on<F>(&self, queue: &Queue, handler: F) -> Promise<Self::Value>
    where
        F: FnOnce(Error) -> Result<Self::Value, Error> + Send + 'static,
    {
        try_recover_via(self, Some(queue), handler)
    }

    /// Replace a failure with the fallible chain `handler` returns.
    fn recover_promise<P, F>(&self, handler: F) -> Promise<Self::Value>
    where
        P: Thenable<Value = Self::Value>,
        F: FnOnce(Error) -> P + Send + 'static,
    {
        recover_promise_via(self, None, handler)
    }

    fn recover_promise_on<P, F>(&self, queue: &Queue, handler: F) -> Promise<Self::Value>
    where
        P: Thenable<Value = Self::Value>,
        F: FnOnce(Error) -> P + Send + 'static,
    {
        recover_promise_via(self, Some(queue), handler)
    }

    /// Run `cleanup` on settlement, then forward the original result.
    fn ensure<F>(&self, cleanup: F) -> Promise<Self::Value>
    where
        F: FnOnce() + Send + 'static,
    {
        ensure_via(self, None, cleanup)
    }

    fn ensure_on<F>(&self, queue: &Queue, cleanup: F) -> Promise<Self::Value>
    where
        F: FnOnce() + Send + 'static,
    {
        ensure_via(self, Some(queue), cleanup)
    }

    fn try_map<U, F>(&self, transform: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(Self::Value) -> Result<U, Error> + Send + 'static,
    {
        try_map_via(self, None, transform)
    }

    fn try_map_on<U, F>(&self, queue: &Queue, transform: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(Self::Value) -> Result<U, Error> + Send + 'static,
    {
        try_map_via(self, Some(queue), transform)
    }

    fn try_done<F>(&self, effect: F) -> Promise<()>
    where
        F: FnOnce(Self::Value) -> Result<(), Error> + Send + 'static,
    {
        try_map_via(self, None, effect)
    }

    fn try_done_on<F>(&self, queue: &Queue, effect: F) -> Promise<()>
    where
        F: FnOnce(Self::Value) -> Result<(), Error> + Send + 'static,
    {
        try_map_via(self, Some(queue), effect)
    }

    fn try_then<P, F>(&self, continuation: F) -> Promise<P::Value>
    where
        P: Thenable,
        F: FnOnce(Self::Value) -> Result<P, Error> + Send + 'static,
    {
        try_then_via(self, None, continuation)
    }

    fn try_then_on<P, F>(&self, queue: &Queue, continuation: F) -> Promise<P::Value>
    where
        P: Thenable,
        F: FnOnce(Self::Value) -> Result<P, Error> + Send + 'static,
    {
        try_then_via(self, Some(queue), continuation)
    }

    /// End a chain whose failure is deliberately left unobserved.
    fn cauterize(self) {}
}

/// Register `step` on `source` and return the promise it settles.
pub(crate) fn link_promise<P, U, F>(source: &P, queue: Option<&Queue>, step: F) -> Promise<U>
where
    P: Thenable,
    U: Clone + Send + 'static,
    F: FnOnce(Outcome<P::Value>, &Promise<U>) + Send + 'static,
{
    let next = Promise::empty();
    let target = next.clone();
    deliver(source, queue, move |outcome| {
        adopt_current_queue(&target);
        step(outcome, &target);
    });
    next
}

fn catch_via<P, F>(source: &P, queue: Option<&Queue>, handler: F) -> Promise<P::Value>
where
    P: Thenable,
    F: FnOnce(&Error) + Send + 'static,
{
    link_promise(source, queue, move |outcome, next| {
        if let Err(e) = &outcome {
            handler(e);
        }
        next.seal().settle(outcome);
    })
}

fn recover_via<P, F>(source: &P, queue: Option<&Queue>, handler: F) -> Guarantee<P::Value>
where
    P: Thenable,
    F: FnOnce(Error) -> P::Value + Send + 'static,
{
    link_guarantee(source, queue, move |outcome, next| {
        next.resolve(outcome.unwrap_or_else(handler));
    })
}

fn recover_with_via<P, F>(source: &P, queue: Option<&Queue>, handler: F) -> Guarantee<P::Value>
where
    P: Thenable,
    F: FnOnce(Error) -> Guarantee<P::Value> + Send + 'static,
{
    link_guarantee(source, queue, move |outcome, next| match outcome {
        Ok(value) => next.resolve(value),
        Err(e) => next.resolve_with(Queue::current().as_ref(), &handler(e)),
    })
}

fn try_recover_via<P, F>(source: &P, queue: Option<&Queue>, handler: F) -> Promise<P::Value>
where
    P: Thenable,
    F: FnOnce(Error) -> Result<P::Value, Error> + Send + 'static,
{
    link_promise(source, queue, move |outcome, next| {
        next.seal().settle(outcome.or_else(handler));
    })
}

fn recover_promise_via<P, R, F>(
    source: &P,
    queue: Option<&Queue>,
    handler: F,
) -> Promise<P::Value>
where
    P: Thenable,
    R: Thenable<Value = P::Value>,
    F: FnOnce(Error) -> R + Send + 'static,
{
    link_promise(source, queue, move |outcome, next| match outcome {
        Ok(value) => {
            next.seal().settle(Ok(value));
        }
        Err(e) => next.resolve_with(Queue::current().as_ref(), &handler(e)),
    })
}

fn ensure_via<P, F>(source: &P, queue: Option<&Queue>, cleanup: F) -> Promise<P::Value>
where
    P: Thenable,
    F: FnOnce() + Send + 'static,
{
    link_promise(source, queue, move |outcome, next| {
        cleanup();
        next.seal().settle(outcome);
    })
}

pub(crate) fn try_map_via<P, U, F>(source: &P, queue: Option<&Queue>, transform: F) -> Promise<U>
where
    P: Thenable,
    U: Clone + Send + 'static,
    F: FnOnce(P::Value) -> Result<U, Error> + Send + 'static,
{
    link_promise(source, queue, move |outcome, next| {
        next.seal().settle(outcome.and_then(transform));
    })
}

pub(crate) fn try_then_via<P, R, F>(
    source: &P,
    queue: Option<&Queue>,
    continuation: F,
) -> Promise<R::Value>
where
    P: Thenable,
    R: Thenable,
    F: FnOnce(P::Value) -> Result<R, Error> + Send + 'static,
{
    link_promise(source, queue, move |outcome, next| {
        match outcome.and_then(continuation) {
            Ok(inner) => next.resolve_with(Queue::current().as_ref(), &inner),
            Err(e) => {
                next.seal().settle(Err(e));
            }
        }
    })
}
