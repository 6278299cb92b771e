//! Execution contexts for deferred values.
//!
//! This is the narrow waist underneath `deferred-core`. The core never owns a
//! thread or a timer; everything it needs from the outside world goes through
//! two capabilities defined here:
//!
//! - [`ExecutionContext`]: "run this job later" and "run this job after a
//!   delay", wrapped in a comparable [`Queue`] handle so the core can decide
//!   whether a continuation runs inline or must be redispatched.
//! - [`fault`]: a process-wide hook invoked when a contract is violated
//!   (for example an infallible value observing a failure).
//!
//! A [`Dispatcher`] supplies ready-made queues on top of a tokio runtime.
//!
//! # Example
//!
//! ```rust
//! use std::sync::mpsc;
//! use deferred_context::Queue;
//!
//! let queue = Queue::global();
//! let (tx, rx) = mpsc::channel();
//! let expected = queue.clone();
//! queue.run(move || {
//!     tx.send(Queue::current() == Some(expected)).unwrap();
//! });
//! assert!(rx.recv().unwrap());
//! ```

mod config;
mod context;
mod dispatcher;
mod error;
pub mod fault;
mod queue;

pub use config::DispatchConfig;
pub use context::{ExecutionContext, Job};
pub use dispatcher::{dispatcher, install, Dispatcher, SerialContext, TokioContext};
pub use error::DispatchError;
pub use fault::{Fault, FaultReporter};
pub use queue::{Queue, QueueId};
