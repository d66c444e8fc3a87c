//! Timeout utilities
//!
//! Wrappers bounding operations that may wait forever, such as waiting for
//! a bridge global a foreign script never calls.

use std::time::Duration;
use tokio::time::{timeout, Timeout};

/// Apply timeout to a future
pub fn with_timeout<F>(future: F, duration: Duration) -> Timeout<F>
where
    F: std::future::Future,
{
    timeout(duration, future)
}

/// Apply an optional timeout; `None` waits without a bound
pub async fn with_timeout_opt<F, T>(
    future: F,
    duration: Option<Duration>,
) -> Result<T, tokio::time::error::Elapsed>
where
    F: std::future::Future<Output = T>,
{
    match duration {
        Some(duration) => with_timeout(future, duration).await,
        None => Ok(future.await),
    }
}
