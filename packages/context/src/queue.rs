//! Comparable handles to execution contexts.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::context::ExecutionContext;

/// Unique identity of a [`Queue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(Uuid);

impl QueueId {
    /// Create a new random QueueId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for QueueId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QueueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

thread_local! {
    static CURRENT: RefCell<Vec<Queue>> = const { RefCell::new(Vec::new()) };
}

/// A named place where work runs.
///
/// `Queue` is a cheap, cloneable handle. Two handles compare equal when they
/// were cloned from the same original, regardless of the context type behind
/// them. Every job dispatched through a `Queue` runs with that queue
/// registered as [`Queue::current`] on the executing thread.
#[derive(Clone)]
pub struct Queue {
    id: QueueId,
    context: Arc<dyn ExecutionContext>,
}

impl Queue {
    /// Wrap an execution context in a new queue identity.
    pub fn new<C: ExecutionContext + 'static>(context: C) -> Self {
        Self::from_arc(Arc::new(context))
    }

    /// Wrap a shared execution context in a new queue identity.
    pub fn from_arc(context: Arc<dyn ExecutionContext>) -> Self {
        Self {
            id: QueueId::new(),
            context,
        }
    }

    /// The shared concurrent queue of the process-wide [`Dispatcher`](crate::Dispatcher).
    pub fn global() -> Self {
        crate::dispatcher().global()
    }

    /// The queue whose job is running on this thread, if any.
    pub fn current() -> Option<Queue> {
        CURRENT.with(|stack| stack.borrow().last().cloned())
    }

    /// Is the calling thread currently running a job of this queue?
    pub fn is_current(&self) -> bool {
        CURRENT.with(|stack| {
            stack
                .borrow()
                .last()
                .is_some_and(|current| current.id == self.id)
        })
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn label(&self) -> &str {
        self.context.label()
    }

    /// Enqueue `job` on this queue.
    pub fn run<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let queue = self.clone();
        self.context.run(Box::new(move || queue.enter(job)));
    }

    /// Enqueue `job` on this queue once `delay` has elapsed.
    pub fn run_after<F>(&self, delay: Duration, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let queue = self.clone();
        self.context
            .run_after(delay, Box::new(move || queue.enter(job)));
    }

    /// Run `job` inline when already on this queue, otherwise enqueue it.
    pub fn run_if_needed<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_current() {
            job();
        } else {
            self.run(job);
        }
    }

    /// Run `f` on the calling thread with this queue marked as current.
    ///
    /// Execution contexts that run jobs on foreign threads do not need this;
    /// [`Queue::run`] already wraps every job. It is public for contexts that
    /// want to mark a thread they own for its whole lifetime.
    pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        CURRENT.with(|stack| stack.borrow_mut().push(self.clone()));
        let _guard = EnterGuard;
        f()
    }
}

/// Pops the current-queue stack even if the job unwinds.
struct EnterGuard;

impl Drop for EnterGuard {
    fn drop(&mut self) {
        CURRENT.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

impl PartialEq for Queue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Queue {}

impl std::hash::Hash for Queue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("label", &self.label())
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Job;
    use std::sync::Mutex;

    /// Runs jobs immediately on the calling thread.
    struct Inline;

    impl ExecutionContext for Inline {
        fn label(&self) -> &str {
            "inline"
        }

        fn run(&self, job: Job) {
            job();
        }

        fn run_after(&self, _delay: Duration, job: Job) {
            job();
        }
    }

    /// Collects jobs so the test decides when they run.
    #[derive(Default)]
    struct Parked {
        jobs: Mutex<Vec<Job>>,
    }

    impl ExecutionContext for Arc<Parked> {
        fn label(&self) -> &str {
            "parked"
        }

        fn run(&self, job: Job) {
            self.jobs.lock().unwrap().push(job);
        }

        fn run_after(&self, _delay: Duration, job: Job) {
            self.jobs.lock().unwrap().push(job);
        }
    }

    #[test]
    fn clones_compare_equal() {
        let a = Queue::new(Inline);
        let b = a.clone();
        let c = Queue::new(Inline);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn no_current_queue_outside_jobs() {
        assert!(Queue::current().is_none());
        assert!(!Queue::new(Inline).is_current());
    }

    #[test]
    fn current_is_set_while_job_runs() {
        let queue = Queue::new(Inline);
        let seen = Arc::new(Mutex::new(None));

        let s = seen.clone();
        queue.run(move || *s.lock().unwrap() = Queue::current());

        assert_eq!(seen.lock().unwrap().as_ref(), Some(&queue));
        assert!(Queue::current().is_none());
    }

    #[test]
    fn nested_enter_restores_outer_queue() {
        let outer = Queue::new(Inline);
        let inner = Queue::new(Inline);

        outer.enter(|| {
            assert!(outer.is_current());
            inner.enter(|| {
                assert!(inner.is_current());
                assert!(!outer.is_current());
            });
            assert!(outer.is_current());
        });
        assert!(Queue::current().is_none());
    }

    #[test]
    fn enter_guard_survives_panics() {
        let queue = Queue::new(Inline);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            queue.enter::<()>(|| panic!("boom"))
        }));
        assert!(result.is_err());
        assert!(Queue::current().is_none());
    }

    #[test]
    fn run_if_needed_is_inline_on_current_queue() {
        let parked = Arc::new(Parked::default());
        let queue = Queue::new(parked.clone());
        let hits = Arc::new(Mutex::new(Vec::new()));

        // Not on the queue: the job is parked.
        let h = hits.clone();
        queue.run_if_needed(move || h.lock().unwrap().push("outside"));
        assert!(hits.lock().unwrap().is_empty());
        assert_eq!(parked.jobs.lock().unwrap().len(), 1);

        // On the queue: runs immediately.
        let h = hits.clone();
        queue.enter(|| queue.run_if_needed(move || h.lock().unwrap().push("inside")));
        assert_eq!(*hits.lock().unwrap(), vec!["inside"]);

        let job = parked.jobs.lock().unwrap().pop().unwrap();
        job();
        assert_eq!(*hits.lock().unwrap(), vec!["inside", "outside"]);
    }

    #[test]
    fn debug_shows_label() {
        let queue = Queue::new(Inline);
        assert!(format!("{:?}", queue).contains("inline"));
    }
}
