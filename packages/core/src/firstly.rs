use deferred_context::Queue;

use crate::error::Error;
use crate::promise::Promise;
use crate::thenable::Thenable;

/// Start a chain with `body`, flattening the deferred value it returns.
///
/// An `Err` from `body` rejects the returned promise.
pub fn firstly<P, F>(body: F) -> Promise<P::Value>
where
    P: Thenable,
    F: FnOnce() -> Result<P, Error>,
{
    let promise = Promise::empty();
    match body() {
        Ok(inner) => promise.resolve_with(Queue::current().as_ref(), &inner),
        Err(e) => {
            promise.seal().settle(Err(e));
        }
    }
    promise
}

/// Like [`firstly`], running `body` on `queue`.
pub fn firstly_on<P, F>(queue: &Queue, body: F) -> Promise<P::Value>
where
    P: Thenable,
    F: FnOnce() -> Result<P, Error> + Send + 'static,
{
    let promise = Promise::with_home(Some(queue.clone()));
    let (target, home) = (promise.clone(), queue.clone());
    queue.run_if_needed(move || match body() {
        Ok(inner) => target.resolve_with(Some(&home), &inner),
        Err(e) => {
            target.seal().settle(Err(e));
        }
    });
    promise
}
