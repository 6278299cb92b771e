//! Fallback-on-timeout, built as a race against a timer.
//!
//! None of these cancel the source: it keeps running after the fallback
//! wins, and its result is discarded.

use std::time::Duration;

use thiserror::Error as ThisError;

use crate::catchable::Catchable;
use crate::config::config;
use crate::error::Error;
use crate::guarantee::Guarantee;
use crate::promise::Promise;
use crate::race::race;
use crate::thenable::Thenable;

/// Marks the error a timer injected, so it is told apart from a failure of
/// the source itself.
#[derive(Debug, ThisError)]
#[error("timed out: {underlying}")]
struct TimeoutError {
    underlying: Error,
}

pub(crate) fn substitute<P>(source: &P, delay: Duration, fallback: P::Value) -> Guarantee<P::Value>
where
    P: Thenable,
{
    first_of(
        source.map(|value| (value, false)),
        Guarantee::after(delay).map(move |()| (fallback, true)),
    )
}

pub(crate) fn absent<P>(source: &P, delay: Duration) -> Guarantee<Option<P::Value>>
where
    P: Thenable,
{
    first_of(
        source.map(|value| (Some(value), false)),
        Guarantee::after(delay).map(|()| (None, true)),
    )
}

/// Race two tagged guarantees; the tag marks the fallback.
fn first_of<V>(primary: Guarantee<(V, bool)>, fallback: Guarantee<(V, bool)>) -> Guarantee<V>
where
    V: Clone + Send + 'static,
{
    let winner = race([primary, fallback]);
    Thenable::map(&winner, |(value, timed_out)| {
        if timed_out {
            note_timeout(None);
        }
        value
    })
}

fn note_timeout(description: Option<&str>) {
    if !config().log_timeouts {
        return;
    }
    match description {
        Some(description) => tracing::info!(description, "timed out, using fallback"),
        None => tracing::info!("timed out, using fallback"),
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + 'static,
{
    /// Reject with `make_error()` unless this promise settles within
    /// `delay`. Failures of this promise pass through unchanged.
    pub fn timeout_with<F>(
        &self,
        delay: Duration,
        description: Option<String>,
        make_error: F,
    ) -> Promise<T>
    where
        F: FnOnce() -> Error + Send + 'static,
    {
        let timer = Guarantee::after(delay).as_promise().try_map(move |()| {
            Err(Error::new(TimeoutError {
                underlying: make_error(),
            }))
        });

        race([self.clone(), timer]).recover_promise(move |error| {
            let injected = error
                .downcast_ref::<TimeoutError>()
                .map(|timeout| timeout.underlying.clone());
            match injected {
                Some(underlying) => {
                    note_timeout(description.as_deref());
                    Promise::error(underlying)
                }
                None => Promise::error(error),
            }
        })
    }
}
