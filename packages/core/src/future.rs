//! `.await` support.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::Error;
use crate::guarantee::Guarantee;
use crate::promise::Promise;
use crate::seal::Outcome;
use crate::thenable::Thenable;

/// Future completing when a deferred value settles.
///
/// Resolves to [`Error::Cancelled`] if every handle able to settle the
/// value is dropped first.
#[derive(Debug)]
pub struct Settlement<T> {
    receiver: oneshot::Receiver<Outcome<T>>,
}

impl<T> Settlement<T>
where
    T: Clone + Send + 'static,
{
    fn of<P: Thenable<Value = T>>(source: &P) -> Self {
        let (sender, receiver) = oneshot::channel();
        source.observe(move |outcome| {
            // The awaiting side may have been dropped.
            let _ = sender.send(outcome);
        });
        Self { receiver }
    }
}

impl<T> Future for Settlement<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(Error::Cancelled)))
    }
}

impl<T> IntoFuture for Promise<T>
where
    T: Clone + Send + 'static,
{
    type Output = Result<T, Error>;
    type IntoFuture = Settlement<T>;

    fn into_future(self) -> Settlement<T> {
        Settlement::of(&self)
    }
}

/// A guarantee cannot fail, but its resolver can still be dropped; that
/// surfaces as [`Error::Cancelled`].
impl<T> IntoFuture for Guarantee<T>
where
    T: Clone + Send + 'static,
{
    type Output = Result<T, Error>;
    type IntoFuture = Settlement<T>;

    fn into_future(self) -> Settlement<T> {
        Settlement::of(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn awaits_resolution() {
        let (promise, seal) = Promise::pending();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            seal.resolve(12);
        });
        assert_eq!(promise.await.unwrap(), 12);
    }

    #[tokio::test]
    async fn awaits_failure() {
        let promise = Promise::<()>::error(Error::msg("async failure"));
        assert_eq!(promise.await.unwrap_err().to_string(), "async failure");
    }

    #[tokio::test]
    async fn dropped_seal_cancels() {
        let (promise, seal) = Promise::<u8>::pending();
        drop(seal);
        assert!(promise.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn awaits_guarantee() {
        let value = Guarantee::after(Duration::from_millis(5))
            .map(|()| "later")
            .await;
        assert_eq!(value.unwrap(), "later");
    }
}
