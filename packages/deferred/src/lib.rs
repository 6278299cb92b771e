//! Deferred: a way to produce a value asynchronously, observe it exactly once
//! when ready, and compose chains of dependent operations with explicit
//! execution-context affinity.
//!
//! The work is split across layered crates, re-exported here:
//!
//! - `deferred-context`: execution contexts ([`Queue`], [`Dispatcher`]) and
//!   the process-wide [`fault`] hook.
//! - `deferred-core`: [`Promise`], [`Guarantee`], the [`Thenable`] and
//!   [`Catchable`] traits and the aggregate combinators.
//! - `deferred-any`: the dynamically typed bridge, [`AnyPromise`].
//!
//! Most code only needs the prelude:
//!
//! ```rust
//! use deferred::prelude::*;
//!
//! let queue = deferred::dispatcher().serial("example");
//! let greeting = Promise::on(&queue, || Ok("hello"))
//!     .map(|s| s.to_uppercase())
//!     .recover(|_| String::from("unreachable"));
//! assert_eq!(greeting.wait(), "HELLO");
//! ```

pub use deferred_any::{AnyError, AnyFuture, AnyPromise, AnyValue};
pub use deferred_context::{
    dispatcher, fault, install, DispatchConfig, DispatchError, Dispatcher, ExecutionContext, Job,
    Queue, QueueId, SerialContext, TokioContext,
};
pub use deferred_core::{
    config, configure, firstly, firstly_on, race, when_fulfilled, when_resolved, Catchable, Error,
    Guarantee, Outcome, Promise, PromiseConfig, Resolver, Seal, Settlement, Thenable,
};

/// The types and traits needed to build and consume chains.
pub mod prelude {
    pub use deferred_context::Queue;
    pub use deferred_core::{
        firstly, race, when_fulfilled, when_resolved, Catchable, Error, Guarantee, Promise,
        Thenable,
    };
}
