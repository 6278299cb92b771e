//! The execution context capability.

use std::time::Duration;

/// A unit of work handed to an execution context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere work can run: a serial or concurrent queue.
///
/// Implementations only move jobs to where they should run. They do not
/// need to track identity or the "current queue"; [`Queue`](crate::Queue)
/// wraps every job so that [`Queue::current`](crate::Queue::current)
/// reports the right context while the job executes.
///
/// # Object Safety
///
/// This trait is object-safe: queues hold an `Arc<dyn ExecutionContext>`.
pub trait ExecutionContext: Send + Sync {
    /// Human-readable name used in logs.
    fn label(&self) -> &str;

    /// Enqueue `job` to run as soon as the context allows.
    fn run(&self, job: Job);

    /// Enqueue `job` to run once `delay` has elapsed.
    fn run_after(&self, delay: Duration, job: Job);
}
