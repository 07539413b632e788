use std::future::Future;

use futures::stream::{self, StreamExt};
use storescout_common::Concurrency;

/// Map `f` over `items`, either strictly sequentially or through a
/// bounded worker pool. Pooled results arrive in completion order; every
/// stage's downstream consumer is order-insensitive until the merge.
pub async fn map_items<T, R, F, Fut>(items: Vec<T>, mode: Concurrency, f: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    match mode {
        Concurrency::Sequential => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(f(item).await);
            }
            out
        }
        Concurrency::Pool(size) => {
            stream::iter(items.into_iter().map(f))
                .buffer_unordered(size.max(1))
                .collect()
                .await
        }
    }
}
