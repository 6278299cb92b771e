use std::time::Duration;

use deferred_context::Queue;

use crate::guarantee::Guarantee;

impl Guarantee<()> {
    /// Resolve after `delay`, timed on the global queue.
    pub fn after(delay: Duration) -> Self {
        Self::after_on(&Queue::global(), delay)
    }

    /// Resolve on `queue` after `delay`.
    pub fn after_on(queue: &Queue, delay: Duration) -> Self {
        let (guarantee, resolver) = Self::pending_on(queue);
        queue.run_after(delay, move || resolver.resolve(()));
        guarantee
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use crate::thenable::Thenable;

    #[test]
    fn resolves_after_delay() {
        let start = Instant::now();
        Guarantee::after(Duration::from_millis(30)).wait();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn resolves_on_given_queue() {
        let queue = deferred_context::dispatcher().serial("timer");
        let target = queue.clone();
        let on_queue = Guarantee::after_on(&queue, Duration::from_millis(5))
            .map(move |()| target.is_current());
        assert!(on_queue.wait());
    }
}
