//! Content transforms carried by `ProcessMarkdownFile`

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type TransformFn = dyn Fn(String) -> BoxFuture<'static, String> + Send + Sync;

/// A content-to-content function, possibly asynchronous
///
/// Cloning is cheap (shared closure). Composition keeps temporal order:
/// `a.then(b)` runs `a` first and feeds its output to `b`.
#[derive(Clone)]
pub struct Transform {
    inner: Arc<TransformFn>,
}

impl Transform {
    /// Wrap a synchronous transform
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(move |content| futures::future::ready(f(content)).boxed()),
        }
    }

    /// Wrap an asynchronous transform
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |content| f(content).boxed()),
        }
    }

    /// Transform that returns its input unchanged
    pub fn identity() -> Self {
        Self::new(|content| content)
    }

    /// Apply the transform to `content`
    pub async fn apply(&self, content: String) -> String {
        (self.inner)(content).await
    }

    /// Compose: `self` runs first, `next` receives its output
    pub fn then(self, next: Transform) -> Transform {
        Transform {
            inner: Arc::new(move |content| {
                let first = self.clone();
                let next = next.clone();
                async move {
                    let intermediate = first.apply(content).await;
                    next.apply(intermediate).await
                }
                .boxed()
            }),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}
