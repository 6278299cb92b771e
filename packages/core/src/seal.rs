//! The single-assignment cell shared by every deferred value.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use deferred_context::fault::{self, Fault};
use deferred_context::Queue;

use crate::config::config;
use crate::error::Error;
use crate::thenable::{deliver, Thenable};

/// The final result of a deferred value.
pub type Outcome<T> = Result<T, Error>;

type Observer<T> = Box<dyn FnOnce(Outcome<T>) + Send + 'static>;

enum State<T> {
    Pending(Vec<Observer<T>>),
    Sealed(Outcome<T>),
}

struct Inner<T> {
    state: State<T>,
    home: Option<Queue>,
}

/// Write side of a deferred value: settles at most once.
///
/// A `Seal` is a reference-counted handle. Clones refer to the same cell,
/// and the cell lives as long as any clone or any observer chain holding
/// one. The first call to [`Seal::settle`] (or `resolve`/`reject`) wins;
/// every later call is ignored.
///
/// Observers registered before settlement run on the settling thread, in
/// registration order, after the internal lock has been released.
/// Observers registered afterwards are handed to the cell's home queue
/// with [`Queue::run_if_needed`]; a cell without a home uses
/// [`Queue::global`].
pub struct Seal<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Seal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for Seal<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Seal<T>
where
    T: Clone + Send + 'static,
{
    /// A pending cell with no home queue of its own.
    pub fn new() -> Self {
        Self::with_state(State::Pending(Vec::new()), None)
    }

    /// A pending cell whose late observers run on `queue`.
    pub fn on(queue: Queue) -> Self {
        Self::with_state(State::Pending(Vec::new()), Some(queue))
    }

    /// A cell that is already settled.
    pub fn settled(outcome: Outcome<T>) -> Self {
        Self::with_state(State::Sealed(outcome), None)
    }

    fn with_state(state: State<T>, home: Option<Queue>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { state, home })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn home(&self) -> Option<Queue> {
        self.lock().home.clone()
    }

    pub fn set_home(&self, queue: Option<Queue>) {
        self.lock().home = queue;
    }

    pub fn is_sealed(&self) -> bool {
        matches!(self.lock().state, State::Sealed(_))
    }

    /// The final result, if settled.
    pub fn outcome(&self) -> Option<Outcome<T>> {
        match &self.lock().state {
            State::Pending(_) => None,
            State::Sealed(outcome) => Some(outcome.clone()),
        }
    }

    /// Register `observer` to receive the final result exactly once.
    pub fn observe<F>(&self, observer: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let outcome = match &mut inner.state {
            State::Pending(observers) => {
                observers.push(Box::new(observer));
                return;
            }
            State::Sealed(outcome) => outcome.clone(),
        };
        let home = inner.home.clone();
        drop(guard);

        home.unwrap_or_else(Queue::global)
            .run_if_needed(move || observer(outcome));
    }

    /// Register `observer` to run on `queue`, or as [`Seal::observe`] does
    /// when `queue` is `None`.
    pub fn observe_on<F>(&self, queue: Option<&Queue>, observer: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        match queue.cloned() {
            Some(queue) => self.observe(move |outcome| {
                queue.run_if_needed(move || observer(outcome));
            }),
            None => self.observe(observer),
        }
    }

    /// Settle with `outcome` unless already settled. Returns whether this
    /// call won.
    pub fn settle(&self, outcome: Outcome<T>) -> bool {
        let observers = {
            let mut guard = self.lock();
            let State::Pending(observers) = &mut guard.state else {
                return false;
            };
            let observers = std::mem::take(observers);
            guard.state = State::Sealed(outcome.clone());
            observers
        };

        for observer in observers {
            observer(outcome.clone());
        }
        true
    }

    pub fn resolve(&self, value: T) {
        self.settle_once(Ok(value));
    }

    pub fn reject(&self, error: Error) {
        self.settle_once(Err(error));
    }

    /// Settle with whatever `other` eventually settles with, delivered on
    /// `queue` when given.
    pub fn resolve_with<P>(&self, queue: Option<&Queue>, other: &P)
    where
        P: Thenable<Value = T>,
    {
        let seal = self.clone();
        deliver(other, queue, move |outcome| {
            seal.settle(outcome);
        });
    }

    /// A losing `resolve` or `reject` is ignored, and reported as a fault
    /// under `strict_sealing`, which debug builds enable by default.
    fn settle_once(&self, outcome: Outcome<T>) {
        if self.settle(outcome) {
            return;
        }
        tracing::debug!("ignoring settlement of an already sealed value");
        if config().strict_sealing {
            fault::report(&Fault::Inconsistency {
                message: "deferred value sealed twice".to_string(),
            });
        }
    }
}

impl<T> fmt::Debug for Seal<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut s = f.debug_struct("Seal");
        match &guard.state {
            State::Pending(observers) => s.field("observers", &observers.len()),
            State::Sealed(outcome) => s.field("outcome", outcome),
        };
        s.field("home", &guard.home).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn first_settlement_wins() {
        let seal = Seal::new();
        assert!(seal.settle(Ok(1)));
        assert!(!seal.settle(Ok(2)));
        assert!(!seal.settle(Err(Error::msg("late"))));
        assert_eq!(seal.outcome().unwrap().unwrap(), 1);
    }

    #[test]
    fn resolve_then_reject_is_ignored() {
        let seal = Seal::<u8>::new();
        seal.resolve(3);
        seal.reject(Error::msg("ignored"));
        assert_eq!(seal.outcome().unwrap().unwrap(), 3);
    }

    #[test]
    fn observers_run_in_registration_order() {
        let seal = Seal::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let order = order.clone();
            seal.observe(move |outcome: Outcome<&str>| {
                order.lock().unwrap().push((i, outcome.unwrap()));
            });
        }
        assert!(order.lock().unwrap().is_empty());

        seal.resolve("done");
        let order = order.lock().unwrap();
        assert_eq!(
            *order,
            (0..5).map(|i| (i, "done")).collect::<Vec<_>>()
        );
    }

    #[test]
    fn late_observer_without_home_runs_on_global_queue() {
        let seal = Seal::new();
        let writer = seal.clone();
        std::thread::spawn(move || writer.resolve(9)).join().unwrap();

        let (tx, rx) = mpsc::channel();
        seal.observe(move |outcome: Outcome<i32>| {
            tx.send((outcome.unwrap(), Queue::global().is_current())).unwrap();
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), (9, true));
    }

    #[test]
    fn late_observer_on_global_queue_runs_inline() {
        let (tx, rx) = mpsc::channel();
        Queue::global().run(move || {
            let seen = Arc::new(Mutex::new(None));
            let sink = seen.clone();
            Seal::settled(Ok(2)).observe(move |outcome: Outcome<i32>| {
                *sink.lock().unwrap() = Some(outcome.unwrap());
            });
            let inline = *seen.lock().unwrap();
            tx.send(inline).unwrap();
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Some(2));
    }

    #[test]
    fn late_observer_runs_on_home_queue() {
        let queue = deferred_context::dispatcher().serial("home");
        let seal = Seal::on(queue.clone());
        seal.resolve(5);

        let (tx, rx) = mpsc::channel();
        seal.observe(move |outcome: Outcome<i32>| {
            tx.send((outcome.unwrap(), queue.is_current())).unwrap();
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), (5, true));
    }

    #[test]
    fn observer_may_reenter_the_cell() {
        let seal = Seal::new();
        let again = seal.clone();
        let (tx, rx) = mpsc::channel();
        seal.observe(move |_: Outcome<u32>| {
            // The lock is released before observers run.
            again.observe(move |outcome| tx.send(outcome.unwrap()).unwrap());
        });
        seal.resolve(11);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 11);
    }

    #[test]
    fn observe_on_targets_queue() {
        let queue = deferred_context::dispatcher().serial("target");
        let seal = Seal::new();
        let (tx, rx) = mpsc::channel();
        let expected = queue.clone();
        seal.observe_on(Some(&queue), move |outcome: Outcome<i32>| {
            tx.send((outcome.unwrap(), expected.is_current())).unwrap();
        });
        seal.resolve(1);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), (1, true));
    }

    #[test]
    fn failure_reaches_every_observer() {
        let seal = Seal::<()>::new();
        let seen = Arc::new(Mutex::new(0));
        for _ in 0..3 {
            let seen = seen.clone();
            seal.observe(move |outcome| {
                assert_eq!(outcome.unwrap_err().to_string(), "nope");
                *seen.lock().unwrap() += 1;
            });
        }
        seal.reject(Error::msg("nope"));
        assert_eq!(*seen.lock().unwrap(), 3);
    }

    #[test]
    fn debug_shows_state() {
        let seal = Seal::<i32>::new();
        seal.observe(|_| {});
        assert!(format!("{:?}", seal).contains("observers: 1"));
        seal.resolve(4);
        assert!(format!("{:?}", seal).contains("Ok(4)"));
    }
}
