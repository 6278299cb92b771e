use deferred_context::Queue;

use crate::promise::Promise;
use crate::thenable::{deliver, Thenable};

/// Settle with the result of whichever input settles first.
///
/// Losing inputs keep running; their results are discarded. Inputs are
/// observed on the caller's current queue, if any. An empty input never
/// settles.
pub fn race<I>(thenables: I) -> Promise<<I::Item as Thenable>::Value>
where
    I: IntoIterator,
    I::Item: Thenable,
{
    let current = Queue::current();
    let result = Promise::with_home(current.clone());
    for thenable in thenables {
        let winner = result.clone();
        deliver(&thenable, current.as_ref(), move |outcome| {
            winner.seal().settle(outcome);
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::error::Error;
    use crate::guarantee::Guarantee;

    #[test]
    fn first_settled_wins() {
        let (a, seal_a) = Promise::pending();
        let (b, seal_b) = Promise::pending();
        let winner = race([a, b]);
        seal_b.resolve("B");
        seal_a.resolve("A");
        assert_eq!(winner.wait().unwrap(), "B");
    }

    #[test]
    fn failure_can_win() {
        let (slow, _seal) = Promise::<u8>::pending();
        let winner = race([slow, Promise::error(Error::msg("fast failure"))]);
        assert_eq!(winner.wait().unwrap_err().to_string(), "fast failure");
    }

    #[test]
    fn earlier_timer_wins() {
        let a = Guarantee::after(Duration::from_millis(10)).map(|()| "A");
        let b = Guarantee::after(Duration::from_millis(50)).map(|()| "B");
        let winner = race([b, a]);
        assert_eq!(winner.wait().unwrap(), "A");
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(winner.outcome().unwrap().unwrap(), "A");
    }

    #[test]
    fn empty_race_stays_pending() {
        let winner = race(Vec::<Promise<()>>::new());
        assert!(!winner.is_sealed());
    }
}
