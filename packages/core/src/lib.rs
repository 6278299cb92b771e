//! Deferred values: produce a value asynchronously, observe it exactly once,
//! and compose chains of dependent operations with explicit queue affinity.
//!
//! Two concrete kinds share one single-assignment cell, [`Seal`]:
//!
//! - [`Promise<T>`] may fail with an [`Error`].
//! - [`Guarantee<T>`] cannot fail.
//!
//! Composition comes from two traits. [`Thenable`] is the observe/resolve
//! contract and supplies `map`, `then`, `done`, `as_void` and timeouts.
//! [`Catchable`] adds `reject` and supplies `catch`, `recover`, `ensure`
//! and the fallible `try_*` transforms. Aggregates live in free functions:
//! [`race`], [`when_fulfilled`], [`when_resolved`] and [`firstly`].
//!
//! Nothing here owns a thread. Continuations run inline or on a
//! [`deferred_context::Queue`]; timers come from the same crate.
//!
//! ```rust
//! use std::time::Duration;
//! use deferred_core::{race, Guarantee, Promise, Thenable};
//!
//! let fast = Guarantee::after(Duration::from_millis(5)).map(|()| "A");
//! let slow = Guarantee::after(Duration::from_millis(200)).map(|()| "B");
//! assert_eq!(race([slow, fast]).wait().unwrap(), "A");
//!
//! let doubled = Promise::value(21).map(|v| v * 2);
//! assert_eq!(doubled.wait().unwrap(), 42);
//! ```

mod after;
mod catchable;
mod channel;
mod config;
mod error;
mod firstly;
mod future;
mod guarantee;
mod promise;
mod race;
mod seal;
mod thenable;
mod timeout;
mod wait;
mod when;

pub use catchable::Catchable;
pub use config::{config, configure, PromiseConfig};
pub use error::Error;
pub use firstly::{firstly, firstly_on};
pub use future::Settlement;
pub use guarantee::{Guarantee, Resolver};
pub use promise::Promise;
pub use race::race;
pub use seal::{Outcome, Seal};
pub use thenable::Thenable;
pub use when::{when_fulfilled, when_resolved};
