//! Order-preserving parallel map

use std::future::Future;
use std::panic;
use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};
use tracing::trace;

/// Apply an async transform to every element concurrently
///
/// One task is spawned per element. The output has the same length as the
/// input and `output[i]` is the result for `input[i]`, whatever order the
/// tasks finish in. An empty input yields an empty `Vec`.
///
/// `transform` itself is called on the caller, once per element in input
/// order; only the futures it returns run concurrently. Put blocking or
/// expensive work inside the returned future, or use
/// [`parallel_map_blocking`].
///
/// # Panics
///
/// If a transform panics the panic is resumed on the caller; tasks still
/// running at that point are aborted. Also panics if an element task is
/// cancelled by runtime shutdown before producing its result.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use utilkit_async::parallel_map;
///
/// # tokio_test::block_on(async {
/// let squares = parallel_map(vec![1u64, 2, 3, 4, 5], |x| async move {
///     tokio::time::sleep(Duration::from_millis(10 * (5 - x))).await;
///     x * x
/// })
/// .await;
///
/// assert_eq!(squares, vec![1, 4, 9, 16, 25]);
/// # });
/// ```
pub async fn parallel_map<T, U, F, Fut>(
    input: impl IntoIterator<Item = T>,
    mut transform: F,
) -> Vec<U>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = U> + Send + 'static,
    U: Send + 'static,
{
    let mut tasks = JoinSet::new();
    for (index, item) in input.into_iter().enumerate() {
        let future = transform(item);
        tasks.spawn(async move { (index, future.await) });
    }

    collect_ordered(tasks).await
}

/// Apply a blocking transform to every element on the blocking thread pool
///
/// Same ordering contract as [`parallel_map`], for CPU-bound or blocking
/// transforms that must not run on the async workers.
///
/// # Panics
///
/// Resumes a transform panic on the caller. Also panics if an element task
/// is cancelled by runtime shutdown before producing its result.
pub async fn parallel_map_blocking<T, U, F>(
    input: impl IntoIterator<Item = T>,
    transform: F,
) -> Vec<U>
where
    F: Fn(T) -> U + Send + Sync + 'static,
    T: Send + 'static,
    U: Send + 'static,
{
    let transform = Arc::new(transform);
    let mut tasks = JoinSet::new();
    for (index, item) in input.into_iter().enumerate() {
        let transform = Arc::clone(&transform);
        tasks.spawn_blocking(move || (index, transform(item)));
    }

    collect_ordered(tasks).await
}

/// Drain a join set of `(index, value)` pairs into input order
async fn collect_ordered<U>(mut tasks: JoinSet<(usize, U)>) -> Vec<U>
where
    U: Send + 'static,
{
    let len = tasks.len();
    if len == 0 {
        return Vec::new();
    }

    trace!(len, "waiting for parallel map tasks");

    let mut slots: Vec<Option<U>> = std::iter::repeat_with(|| None).take(len).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, value)) => slots[index] = Some(value),
            Err(err) => resume_join_error(err),
        }
    }

    slots.into_iter().flatten().collect()
}

fn resume_join_error(err: JoinError) -> ! {
    match err.try_into_panic() {
        Ok(payload) => panic::resume_unwind(payload),
        // Tasks owned by the join set are only cancelled by runtime shutdown.
        Err(err) => panic!("parallel map task did not complete: {err}"),
    }
}
