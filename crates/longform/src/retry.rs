use std::future::Future;
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_DELAY: Duration = Duration::from_millis(1500);

/// Fixed-delay retry for one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    Done(T),
    /// Every attempt failed; carries the last error.
    Exhausted(E),
    Cancelled,
}

enum Attempt<E> {
    Cancelled,
    Failed(E),
}

/// A backon sleeper whose wait ends early once `token` is cancelled.
pub fn cancellable_sleeper(
    token: CancellationToken,
) -> impl Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync + 'static {
    move |delay| {
        let token = token.clone();
        Box::pin(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => {}
            }
        })
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub fn backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(self.max_attempts.max(1) - 1)
    }

    /// Runs `attempt` until it succeeds, attempts run out, or `token` is
    /// cancelled. `notify` sees each failure that is about to be retried.
    ///
    /// The token is checked before every attempt and raced against every
    /// delay. A failure observed after cancellation counts as cancelled.
    pub async fn run<T, E, F, Fut, N>(
        &self,
        token: &CancellationToken,
        mut attempt: F,
        mut notify: N,
    ) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        N: FnMut(&E, Duration),
    {
        let result = (|| {
            let work = attempt();
            async move {
                if token.is_cancelled() {
                    return Err(Attempt::Cancelled);
                }
                work.await.map_err(Attempt::Failed)
            }
        })
        .retry(self.backoff())
        .sleep(cancellable_sleeper(token.clone()))
        .when(|e| matches!(e, Attempt::Failed(_)) && !token.is_cancelled())
        .notify(|e, delay| {
            if let Attempt::Failed(e) = e {
                notify(e, delay);
            }
        })
        .await;

        match result {
            Ok(value) => RetryOutcome::Done(value),
            Err(Attempt::Failed(_)) | Err(Attempt::Cancelled) if token.is_cancelled() => {
                RetryOutcome::Cancelled
            }
            Err(Attempt::Failed(e)) => RetryOutcome::Exhausted(e),
            Err(Attempt::Cancelled) => RetryOutcome::Cancelled,
        }
    }
}
