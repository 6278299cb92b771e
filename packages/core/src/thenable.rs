//! The observe/resolve contract shared by every deferred value, and the
//! infallible composition built on it.

use std::time::Duration;

use deferred_context::fault::{self, Fault};
use deferred_context::Queue;

use crate::error::Error;
use crate::guarantee::Guarantee;
use crate::promise::Promise;
use crate::seal::Outcome;
use crate::timeout;

/// A value that settles exactly once and can be observed.
///
/// Implementors supply the six primitive operations; everything else
/// (`map`, `then`, `done`, `timeout`, ...) comes for free. Apart from
/// `then`, which settles a value of the kind its continuation returns,
/// they produce a [`Guarantee`] and assume the source cannot fail: a
/// failure reaching one of them is a contract violation and is reported
/// through [`deferred_context::fault`] as fatal. Use the fallible variants
/// on [`Catchable`](crate::Catchable) when the source may fail.
///
/// Every `*_on` variant runs its callback on the given queue: inline when
/// the upstream already settled there, redispatched otherwise. Without a
/// queue the callback runs where the upstream result is produced, or on the
/// upstream's home queue when it has already settled.
pub trait Thenable: Clone + Send + Sync + 'static {
    type Value: Clone + Send + 'static;

    /// A new, unsettled value.
    fn empty() -> Self;

    /// Register `observer` to receive the final result exactly once.
    fn observe<F>(&self, observer: F)
    where
        F: FnOnce(Outcome<Self::Value>) + Send + 'static;

    fn resolve(&self, value: Self::Value);

    /// Settle with whatever `other` eventually settles with.
    fn resolve_with<P>(&self, queue: Option<&Queue>, other: &P)
    where
        P: Thenable<Value = Self::Value>;

    /// Queue on which late observers run.
    fn home(&self) -> Option<Queue>;

    fn set_home(&self, queue: Option<Queue>);

    fn map<U, F>(&self, transform: F) -> Guarantee<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(Self::Value) -> U + Send + 'static,
    {
        map_via(self, None, transform)
    }

    fn map_on<U, F>(&self, queue: &Queue, transform: F) -> Guarantee<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(Self::Value) -> U + Send + 'static,
    {
        map_via(self, Some(queue), transform)
    }

    /// Run `effect` for its side effects and settle with `()`.
    fn done<F>(&self, effect: F) -> Guarantee<()>
    where
        F: FnOnce(Self::Value) + Send + 'static,
    {
        map_via(self, None, effect)
    }

    fn done_on<F>(&self, queue: &Queue, effect: F) -> Guarantee<()>
    where
        F: FnOnce(Self::Value) + Send + 'static,
    {
        map_via(self, Some(queue), effect)
    }

    /// Chain to the deferred value returned by `continuation`, settling
    /// with its eventual result.
    ///
    /// The result has the continuation's type: a continuation returning a
    /// [`Promise`] yields a promise that rejects when the inner one does.
    fn then<P, F>(&self, continuation: F) -> P
    where
        P: Thenable,
        F: FnOnce(Self::Value) -> P + Send + 'static,
    {
        then_via(self, None, continuation)
    }

    fn then_on<P, F>(&self, queue: &Queue, continuation: F) -> P
    where
        P: Thenable,
        F: FnOnce(Self::Value) -> P + Send + 'static,
    {
        then_via(self, Some(queue), continuation)
    }

    fn as_void(&self) -> Guarantee<()> {
        map_via(self, None, |_| ())
    }

    /// Settle with `substitute` unless this value settles within `delay`.
    ///
    /// The source keeps running after the fallback wins.
    fn timeout(&self, delay: Duration, substitute: Self::Value) -> Guarantee<Self::Value> {
        timeout::substitute(self, delay, substitute)
    }

    /// Settle with `None` unless this value settles within `delay`.
    fn nil_timeout(&self, delay: Duration) -> Guarantee<Option<Self::Value>> {
        timeout::absent(self, delay)
    }

    fn void_timeout(&self, delay: Duration) -> Guarantee<()>
    where
        Self: Thenable<Value = ()>,
    {
        timeout::substitute(self, delay, ())
    }
}

/// Observe `source`, delivering its result on `queue` when given.
pub(crate) fn deliver<P, F>(source: &P, queue: Option<&Queue>, f: F)
where
    P: Thenable,
    F: FnOnce(Outcome<P::Value>) + Send + 'static,
{
    match queue.cloned() {
        Some(queue) => source.observe(move |outcome| {
            queue.run_if_needed(move || f(outcome));
        }),
        None => source.observe(f),
    }
}

/// Make the queue running the current chain link the home of `link`.
pub(crate) fn adopt_current_queue<P: Thenable>(link: &P) {
    if let Some(queue) = Queue::current() {
        link.set_home(Some(queue));
    }
}

/// An infallible chain observed a failure.
pub(crate) fn unfailable(error: Error) -> ! {
    fault::fatal(Fault::UnfailablePromiseFailed {
        error: error.to_string(),
    })
}

/// Register `step` on `source` and return the guarantee it settles.
pub(crate) fn link_guarantee<P, U, F>(source: &P, queue: Option<&Queue>, step: F) -> Guarantee<U>
where
    P: Thenable,
    U: Clone + Send + 'static,
    F: FnOnce(Outcome<P::Value>, &Guarantee<U>) + Send + 'static,
{
    let next = Guarantee::empty();
    let target = next.clone();
    deliver(source, queue, move |outcome| {
        adopt_current_queue(&target);
        step(outcome, &target);
    });
    next
}

fn map_via<P, U, F>(source: &P, queue: Option<&Queue>, transform: F) -> Guarantee<U>
where
    P: Thenable,
    U: Clone + Send + 'static,
    F: FnOnce(P::Value) -> U + Send + 'static,
{
    link_guarantee(source, queue, move |outcome, next| match outcome {
        Ok(value) => next.resolve(transform(value)),
        Err(e) => unfailable(e),
    })
}

/// Settle a new `R` with the chain `continuation` returns. An upstream
/// failure is handed over the same way, so only an infallible `R` treats
/// it as a fault.
fn then_via<P, R, F>(source: &P, queue: Option<&Queue>, continuation: F) -> R
where
    P: Thenable,
    R: Thenable,
    F: FnOnce(P::Value) -> R + Send + 'static,
{
    let next = R::empty();
    let target = next.clone();
    deliver(source, queue, move |outcome| {
        adopt_current_queue(&target);
        let current = Queue::current();
        match outcome {
            Ok(value) => target.resolve_with(current.as_ref(), &continuation(value)),
            Err(e) => target.resolve_with(current.as_ref(), &Promise::<R::Value>::error(e)),
        }
    });
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn serial(label: &str) -> Queue {
        deferred_context::dispatcher().serial(label)
    }

    #[test]
    fn map_transforms_value() {
        let (g, resolver) = Guarantee::pending();
        let doubled = g.map(|v: i32| v * 2);
        assert_eq!(doubled.outcome(), None);
        resolver.resolve(21);
        assert_eq!(doubled.outcome(), Some(42));
    }

    #[test]
    fn map_identity_preserves_value() {
        let g = Guarantee::value("same");
        assert_eq!(g.map(|v| v).wait(), "same");
    }

    #[test]
    fn then_flattens_inner_value() {
        let (inner, resolver) = Guarantee::pending();
        let outer = Guarantee::value(2).then(move |v: i32| inner.map(move |w: i32| v + w));
        assert!(!outer.is_sealed());
        resolver.resolve(40);
        assert_eq!(outer.wait(), 42);
    }

    #[test]
    fn then_to_failing_promise_rejects() {
        let chained = Guarantee::value(1u8)
            .then(|_| Promise::<u8>::error(Error::msg("inner failed")));
        assert_eq!(chained.wait().unwrap_err().to_string(), "inner failed");
    }

    #[test]
    fn then_on_to_promise_keeps_success() {
        let queue = serial("then-promise");
        let target = queue.clone();
        let chained: Promise<bool> =
            Guarantee::value(()).then_on(&queue, move |()| Promise::value(target.is_current()));
        assert!(chained.wait().unwrap());
    }

    #[test]
    fn done_and_as_void_settle_with_unit() {
        let (tx, rx) = mpsc::channel();
        let done = Guarantee::value(7).done(move |v| tx.send(v).unwrap());
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
        done.wait();
        assert_eq!(done.outcome(), Some(()));
        Guarantee::value('x').as_void().wait();
    }

    #[test]
    fn map_on_runs_on_target_queue() {
        let queue = serial("map-target");
        let (tx, rx) = mpsc::channel();
        let target = queue.clone();
        Guarantee::value(1).map_on(&queue, move |v| {
            tx.send((v, target.is_current())).unwrap();
        });
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            (1, true)
        );
    }

    #[test]
    fn link_adopts_queue_it_ran_on() {
        let queue = serial("adopt");
        let mapped = Guarantee::value(3).map_on(&queue, |v| v + 1);
        assert_eq!(mapped.wait(), 4);
        assert_eq!(mapped.home(), Some(queue));
    }

    #[test]
    fn succeeding_promise_composes_infallibly() {
        let promise = Promise::value(5);
        let mapped = Thenable::map(&promise, |v: i32| v.to_string());
        assert_eq!(mapped.wait(), "5");
    }
}
