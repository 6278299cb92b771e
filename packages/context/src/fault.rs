//! Process-wide fault reporting.
//!
//! Faults are programming errors, not runtime failures: an infallible value
//! that observed a failure, or internal state that should be impossible.
//! They are never delivered through a deferred value's error channel.
//! Instead [`fatal`] hands them to the installed [`FaultReporter`] and then
//! terminates the process.
//!
//! The default reporter logs through `tracing`. Embedders install their own
//! at startup with [`install_reporter`]. A reporter that panics unwinds out
//! of [`fatal`] before the abort, which tests use to observe faults without
//! losing the process.

use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

/// A contract violation detected by the deferred-value machinery.
#[derive(Debug, Clone, Error)]
pub enum Fault {
    /// An infallible value was fed the failure branch of a fallible one.
    #[error("unexpectedly received error result from unfailable promise: {error}")]
    UnfailablePromiseFailed { error: String },

    /// Internal state that should be unreachable.
    #[error("internal inconsistency: {message}")]
    Inconsistency { message: String },
}

/// Receives faults before the process terminates.
pub trait FaultReporter: Send + Sync {
    fn report(&self, fault: &Fault);
}

impl<F> FaultReporter for F
where
    F: Fn(&Fault) + Send + Sync,
{
    fn report(&self, fault: &Fault) {
        self(fault)
    }
}

/// Default reporter: log at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl FaultReporter for LogReporter {
    fn report(&self, fault: &Fault) {
        tracing::error!(fault = %fault, "fatal fault");
    }
}

lazy_static::lazy_static! {
    static ref REPORTER: RwLock<Arc<dyn FaultReporter>> = RwLock::new(Arc::new(LogReporter));
}

/// Replace the process-wide reporter, returning the previous one.
pub fn install_reporter(reporter: Arc<dyn FaultReporter>) -> Arc<dyn FaultReporter> {
    let mut slot = REPORTER.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, reporter)
}

/// Hand `fault` to the installed reporter without terminating.
pub fn report(fault: &Fault) {
    let reporter = REPORTER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    reporter.report(fault);
}

/// Report `fault` and abort the process.
pub fn fatal(fault: Fault) -> ! {
    report(&fault);
    std::process::abort()
}
