//! Dynamically typed deferred values.
//!
//! [`AnyPromise`] carries an [`AnyValue`] instead of a concrete type, for
//! callers that cannot name the value type of the chain they consume
//! (plugin hosts, scripting bridges, FFI shims). Settlement semantics are
//! unchanged: exactly once, queue-aware. Typing is recovered at the edge
//! with [`AnyPromise::downcast`].
//!
//! ```rust
//! use std::sync::Arc;
//! use deferred_any::{AnyPromise, AnyValue};
//! use deferred_core::Promise;
//!
//! let bridged = AnyPromise::new(&Promise::value(20u32));
//! let bumped = bridged.map(|v: AnyValue| {
//!     let n = v.downcast_ref::<u32>().copied().unwrap_or_default();
//!     Arc::new(n + 1) as AnyValue
//! });
//! assert_eq!(bumped.downcast::<u32>().wait().unwrap(), 21);
//! ```

mod error;
mod future;
mod promise;

pub use error::AnyError;
pub use future::AnyFuture;
pub use promise::{AnyPromise, AnyValue};
