use tokio::sync::broadcast::{self, error::RecvError};

use crate::error::Error;
use crate::promise::Promise;

impl<T> Promise<T>
where
    T: Clone + Send + 'static,
{
    /// Settle with the next message broadcast on `receiver`.
    ///
    /// Rejects with [`Error::ChannelClosed`] if every sender is dropped
    /// first. Messages missed by a lagging receiver are skipped.
    pub fn from_channel(mut receiver: broadcast::Receiver<T>) -> Self {
        let (promise, seal) = Self::pending();
        deferred_context::dispatcher().handle().spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => {
                        seal.resolve(message);
                        return;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "receiver lagged, waiting for next message");
                    }
                    Err(RecvError::Closed) => {
                        seal.reject(Error::ChannelClosed);
                        return;
                    }
                }
            }
        });
        promise
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_with_next_message() {
        let (tx, rx) = broadcast::channel(4);
        let promise = Promise::from_channel(rx);
        tx.send("first").unwrap();
        tx.send("second").unwrap();
        assert_eq!(promise.wait().unwrap(), "first");
    }

    #[test]
    fn closed_channel_rejects() {
        let (tx, rx) = broadcast::channel::<u8>(1);
        let promise = Promise::from_channel(rx);
        drop(tx);
        assert!(matches!(promise.wait(), Err(Error::ChannelClosed)));
    }

    #[test]
    fn lagging_receiver_skips_to_retained_message() {
        let (tx, rx) = broadcast::channel(1);
        for message in ["dropped", "also dropped", "kept"] {
            tx.send(message).unwrap();
        }
        let promise = Promise::from_channel(rx);
        assert_eq!(promise.wait().unwrap(), "kept");
    }
}
