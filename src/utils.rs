use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::debug;

/// Upper bound for a single backoff pause.
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Runs `operation` until it succeeds or `max_retries` retries are spent,
/// sleeping along a Fibonacci sequence starting at `initial_delay`.
pub async fn retry_with_backoff<T, E, Fut, F>(
    what: &str,
    operation: F,
    initial_delay: Duration,
    max_retries: usize,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut fib = (initial_delay, initial_delay);

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                let delay = fib.0.min(MAX_DELAY);
                debug!("{what}: {e}; retrying in {delay:?} ({attempt}/{max_retries})");
                sleep(delay).await;
                fib = (fib.1, fib.0 + fib.1);
            }
            Err(e) => return Err(e),
        }
    }
}
