//! Blocking bridge for callers without an event loop.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

use deferred_context::fault::{self, Fault};

use crate::seal::Outcome;
use crate::thenable::Thenable;

/// Counting latch: `wait` returns once `count_down` ran `count` times.
pub(crate) struct Latch {
    remaining: Mutex<usize>,
    released: Condvar,
}

impl Latch {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            released: Condvar::new(),
        }
    }

    pub(crate) fn count_down(&self) {
        let mut remaining = self.remaining.lock().unwrap_or_else(PoisonError::into_inner);
        if *remaining > 0 {
            *remaining -= 1;
            if *remaining == 0 {
                self.released.notify_all();
            }
        }
    }

    pub(crate) fn wait(&self) {
        let mut remaining = self.remaining.lock().unwrap_or_else(PoisonError::into_inner);
        while *remaining > 0 {
            remaining = self
                .released
                .wait(remaining)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Block until `source` settles and return its outcome.
pub(crate) fn block_on<P: Thenable>(source: &P) -> Outcome<P::Value> {
    let latch = Arc::new(Latch::new(1));
    let slot = Arc::new(Mutex::new(None));

    let (release, fill) = (latch.clone(), slot.clone());
    source.observe(move |outcome| {
        *fill.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
        release.count_down();
    });
    latch.wait();

    let outcome = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    match outcome {
        Some(outcome) => outcome,
        None => fault::fatal(Fault::Inconsistency {
            message: "wait released without an outcome".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    use crate::error::Error;
    use crate::promise::Promise;

    #[test]
    fn latch_releases_after_count() {
        let latch = Arc::new(Latch::new(3));
        for _ in 0..3 {
            let latch = latch.clone();
            thread::spawn(move || latch.count_down());
        }
        latch.wait();
        assert_eq!(*latch.remaining.lock().unwrap(), 0);
    }

    #[test]
    fn latch_at_zero_does_not_block() {
        let latch = Latch::new(0);
        latch.count_down();
        latch.wait();
    }

    #[test]
    fn blocks_until_settled_on_another_thread() {
        let (promise, seal) = Promise::pending();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            seal.resolve(17);
        });
        assert_eq!(block_on(&promise).unwrap(), 17);
    }

    #[test]
    fn raises_failure_on_calling_thread() {
        let (promise, seal) = Promise::<()>::pending();
        thread::spawn(move || seal.reject(Error::msg("remote failure")));
        assert_eq!(
            block_on(&promise).unwrap_err().to_string(),
            "remote failure"
        );
    }
}
