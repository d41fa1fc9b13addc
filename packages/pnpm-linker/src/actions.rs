use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Semaphore;

use crate::error::Error;

/// The table's terminal value per key. Wrapped in `Arc` because `Shared`
/// futures require a `Clone` output, and `Error` itself (carrying
/// `std::io::Error`/`serde_json::Error`) isn't.
pub type ActionResult = std::result::Result<(), Arc<Error>>;
pub type ActionHandle = Shared<BoxFuture<'static, ActionResult>>;

/// A keyed registry of in-flight asynchronous operations, capped at a
/// fixed process-wide concurrency budget (spec §4.3, §5).
///
/// Grounded on two patterns from the teacher: the `DashMap<String,
/// Arc<OnceCell<...>>>` "in-flight" table in `manifest_cache.rs`
/// (generalized here from a single-shot cache fill to a replaceable,
/// chainable task), and the bounded-concurrency `FuturesUnordered` loop in
/// `commands/workspaces_foreach.rs` (replaced with a `Semaphore`, the
/// more direct primitive for a fixed-size admission budget).
pub struct AsyncActions {
    semaphore: Arc<Semaphore>,
    tasks: DashMap<String, ActionHandle>,
}

impl AsyncActions {
    pub fn new(concurrency: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(concurrency)), tasks: DashMap::new() }
    }

    /// Enqueues `factory()` under the concurrency budget and replaces the
    /// key's current task. Returns a handle tracking this task specifically.
    ///
    /// The previous task for this key, if any, is not cancelled — it was
    /// already admitted through the semaphore and keeps running to
    /// completion — only the table's notion of "the current task for this
    /// key" moves on, so a `reduce()` issued after this `set()` observes
    /// this task rather than the old one.
    pub fn set<F, Fut>(&self, key: impl Into<String>, factory: F) -> ActionHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<(), Error>> + Send + 'static,
    {
        let key = key.into();
        let semaphore = self.semaphore.clone();

        let admitted: BoxFuture<'static, ActionResult> = async move {
            let _permit = semaphore.acquire_owned().await
                .expect("action-table semaphore is never closed while the table is alive");

            factory().await.map_err(Arc::new)
        }.boxed();

        let handle = tokio::spawn(admitted)
            .map(|joined| match joined {
                Ok(result) => result,
                Err(join_error) => Err(Arc::new(Error::Assertion(format!("action task panicked: {join_error}")))),
            })
            .boxed()
            .shared();

        self.tasks.insert(key, handle.clone());
        handle
    }

    /// Composes a new task that first awaits the key's current in-flight
    /// task (or an already-resolved placeholder if none exists yet), then
    /// runs `chain` with that result, and installs the composition via
    /// `set`. This is how dependency-farm construction is gated on the
    /// same package's materialisation (spec §4.5).
    pub fn reduce<C, Fut>(&self, key: impl Into<String>, chain: C) -> ActionHandle
    where
        C: FnOnce(ActionResult) -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<(), Error>> + Send + 'static,
    {
        let key = key.into();

        let prior: ActionHandle = self.tasks
            .get(&key)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| futures::future::ready(Ok(())).boxed().shared());

        self.set(key, move || async move {
            let prior_result = prior.await;
            chain(prior_result).await
        })
    }

    /// Resolves once every task registered so far has settled.
    pub async fn wait(&self) {
        let handles: Vec<ActionHandle> = self.tasks.iter().map(|entry| entry.value().clone()).collect();
        futures::future::join_all(handles).await;
    }
}
