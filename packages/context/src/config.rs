//! Configuration for the tokio-backed dispatcher.

/// Configuration for a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Number of async worker threads. `None` lets tokio pick one per core.
    pub worker_threads: Option<usize>,

    /// Upper bound on threads running queue jobs at the same time.
    pub max_blocking_threads: usize,

    /// Name given to every runtime thread.
    pub thread_name: String,

    /// Label of the shared concurrent queue.
    pub global_label: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            max_blocking_threads: 512,
            thread_name: "deferred-worker".to_string(),
            global_label: "global".to_string(),
        }
    }
}
