//! Tokio-backed execution contexts.
//!
//! The dispatcher owns a multi-thread tokio runtime and hands out queues that
//! run their jobs on the runtime's blocking pool. Jobs are plain closures and
//! are allowed to block; they never run on the async worker threads.

use std::sync::OnceLock;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::mpsc;

use crate::config::DispatchConfig;
use crate::context::{ExecutionContext, Job};
use crate::error::DispatchError;
use crate::fault::{self, Fault};
use crate::queue::Queue;

static DISPATCHER: OnceLock<Dispatcher> = OnceLock::new();

/// Install the process-wide dispatcher.
///
/// Must be called before anything touches [`dispatcher`] or
/// [`Queue::global`]; afterwards it fails with
/// [`DispatchError::AlreadyInstalled`].
pub fn install(config: DispatchConfig) -> Result<&'static Dispatcher, DispatchError> {
    if DISPATCHER.get().is_some() {
        return Err(DispatchError::AlreadyInstalled);
    }
    let fresh = Dispatcher::new(config)?;
    DISPATCHER
        .set(fresh)
        .map_err(|_| DispatchError::AlreadyInstalled)?;
    Ok(dispatcher())
}

/// The process-wide dispatcher, installed with the default configuration on
/// first use.
///
/// A runtime that cannot be built at this point leaves the process without
/// any execution context, so it is reported as a fatal fault.
pub fn dispatcher() -> &'static Dispatcher {
    DISPATCHER.get_or_init(|| match Dispatcher::new(DispatchConfig::default()) {
        Ok(dispatcher) => dispatcher,
        Err(e) => fault::fatal(Fault::Inconsistency {
            message: format!("cannot start default dispatcher: {}", e),
        }),
    })
}

/// Owner of the runtime behind a family of queues.
pub struct Dispatcher {
    runtime: Runtime,
    global: Queue,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Build a runtime from `config`.
    pub fn new(config: DispatchConfig) -> Result<Self, DispatchError> {
        let mut builder = Builder::new_multi_thread();
        builder
            .max_blocking_threads(config.max_blocking_threads)
            .thread_name(config.thread_name.clone())
            .enable_time();
        if let Some(workers) = config.worker_threads {
            builder.worker_threads(workers);
        }
        let runtime = builder.build()?;

        let global = Queue::new(TokioContext::new(
            runtime.handle().clone(),
            config.global_label.clone(),
        ));

        tracing::debug!(
            label = %config.global_label,
            workers = ?config.worker_threads,
            "dispatcher started"
        );

        Ok(Self {
            runtime,
            global,
            config,
        })
    }

    /// The shared concurrent queue.
    pub fn global(&self) -> Queue {
        self.global.clone()
    }

    /// Create a new serial queue: jobs run one at a time, in enqueue order.
    pub fn serial(&self, label: impl Into<String>) -> Queue {
        Queue::new(SerialContext::new(self.handle(), label))
    }

    /// Create a new concurrent queue with its own identity.
    pub fn concurrent(&self, label: impl Into<String>) -> Queue {
        Queue::new(TokioContext::new(self.handle(), label))
    }

    /// Handle to the underlying runtime, for async adapters.
    pub fn handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

/// Concurrent context: every job may run in parallel with the others.
pub struct TokioContext {
    handle: Handle,
    label: String,
}

impl TokioContext {
    pub fn new(handle: Handle, label: impl Into<String>) -> Self {
        Self {
            handle,
            label: label.into(),
        }
    }
}

impl ExecutionContext for TokioContext {
    fn label(&self) -> &str {
        &self.label
    }

    fn run(&self, job: Job) {
        drop(self.handle.spawn_blocking(job));
    }

    fn run_after(&self, delay: Duration, job: Job) {
        let handle = self.handle.clone();
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            drop(handle.spawn_blocking(job));
        });
    }
}

/// Serial context: jobs run one at a time, in the order they were enqueued.
pub struct SerialContext {
    handle: Handle,
    label: String,
    tx: mpsc::UnboundedSender<Job>,
}

impl SerialContext {
    pub fn new(handle: Handle, label: impl Into<String>) -> Self {
        let label = label.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        let drain_label = label.clone();
        handle.spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(e) = tokio::task::spawn_blocking(job).await {
                    tracing::warn!(queue = %drain_label, error = %e, "serial job failed");
                }
            }
        });

        Self { handle, label, tx }
    }

    fn enqueue(label: &str, tx: &mpsc::UnboundedSender<Job>, job: Job) {
        if tx.send(job).is_err() {
            tracing::warn!(queue = %label, "serial queue stopped, job dropped");
        }
    }
}

impl ExecutionContext for SerialContext {
    fn label(&self) -> &str {
        &self.label
    }

    fn run(&self, job: Job) {
        Self::enqueue(&self.label, &self.tx, job);
    }

    fn run_after(&self, delay: Duration, job: Job) {
        let tx = self.tx.clone();
        let label = self.label.clone();
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            Self::enqueue(&label, &tx, job);
        });
    }
}
