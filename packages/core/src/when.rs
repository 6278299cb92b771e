//! Joins over many deferred values.

use std::sync::{Arc, Mutex, PoisonError};

use crate::guarantee::Guarantee;
use crate::promise::Promise;
use crate::thenable::Thenable;

/// Succeed once every input succeeds; fail with the first failure seen.
///
/// Succeeds immediately when `thenables` is empty.
pub fn when_fulfilled<I>(thenables: I) -> Promise<()>
where
    I: IntoIterator,
    I::Item: Thenable,
{
    let thenables: Vec<I::Item> = thenables.into_iter().collect();
    if thenables.is_empty() {
        return Promise::value(());
    }

    let result = Promise::empty();
    let remaining = Arc::new(Mutex::new(thenables.len()));
    for thenable in &thenables {
        let (result, remaining) = (result.clone(), remaining.clone());
        thenable.observe(move |outcome| match outcome {
            Ok(_) => {
                if count_down(&remaining) {
                    result.seal().settle(Ok(()));
                }
            }
            Err(e) => {
                result.seal().settle(Err(e));
            }
        });
    }
    result
}

/// Resolve once every input has settled, whatever the outcomes.
///
/// Resolves immediately when `thenables` is empty.
pub fn when_resolved<I>(thenables: I) -> Guarantee<()>
where
    I: IntoIterator,
    I::Item: Thenable,
{
    let thenables: Vec<I::Item> = thenables.into_iter().collect();
    if thenables.is_empty() {
        return Guarantee::value(());
    }

    let result = Guarantee::empty();
    let remaining = Arc::new(Mutex::new(thenables.len()));
    for thenable in &thenables {
        let (result, remaining) = (result.clone(), remaining.clone());
        thenable.observe(move |_| {
            if count_down(&remaining) {
                result.seal().settle(Ok(()));
            }
        });
    }
    result
}

/// Decrement under the lock; true for the call that reached zero.
fn count_down(remaining: &Mutex<usize>) -> bool {
    let mut remaining = remaining.lock().unwrap_or_else(PoisonError::into_inner);
    *remaining = remaining.saturating_sub(1);
    *remaining == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::catchable::Catchable;
    use crate::error::Error;

    #[test]
    fn fulfilled_waits_for_last_success() {
        let (a, seal_a) = Promise::pending();
        let (b, seal_b) = Promise::pending();
        let all = when_fulfilled([a, b]);
        seal_a.resolve(1);
        assert!(!all.is_sealed());
        seal_b.resolve(2);
        assert!(all.wait().is_ok());
    }

    #[test]
    fn fulfilled_fails_fast() {
        let (slow, _still_pending) = Promise::<u8>::pending();
        let (failing, seal) = Promise::pending();
        let all = when_fulfilled([slow, failing, Promise::value(3)]);
        seal.reject(Error::msg("input 1 failed"));
        assert_eq!(all.wait().unwrap_err().to_string(), "input 1 failed");
    }

    #[test]
    fn fulfilled_keeps_first_failure() {
        let all = when_fulfilled([
            Promise::<()>::error(Error::msg("first")),
            Promise::error(Error::msg("second")),
        ]);
        assert_eq!(all.wait().unwrap_err().to_string(), "first");
    }

    #[test]
    fn empty_inputs_succeed_immediately() {
        assert!(when_fulfilled(Vec::<Promise<u8>>::new()).is_sealed());
        assert_eq!(when_resolved(Vec::<Promise<u8>>::new()).outcome(), Some(()));
    }

    #[test]
    fn resolved_counts_every_settlement() {
        let settled = Arc::new(AtomicUsize::new(0));
        let inputs: Vec<Promise<usize>> = (0..6)
            .map(|i| {
                let settled = settled.clone();
                let delay = Duration::from_millis(5 * i as u64);
                Guarantee::after(delay)
                    .as_promise()
                    .try_map(move |()| {
                        settled.fetch_add(1, Ordering::SeqCst);
                        if i % 2 == 0 {
                            Ok(i)
                        } else {
                            Err(Error::msg("odd"))
                        }
                    })
            })
            .collect();

        when_resolved(inputs).wait();
        assert_eq!(settled.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn works_with_guarantees() {
        let all = when_fulfilled([Guarantee::value(1), Guarantee::value(2)]);
        assert!(all.wait().is_ok());
    }
}
