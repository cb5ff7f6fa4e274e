use crate::core::backoff::delay_with_jitter;
use crate::domain::model::OutboundUser;
use crate::domain::ports::UserSink;
use crate::utils::error::{DispatchError, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per record, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

/// Wraps a [`UserSink`] in a bounded, cancellable retry loop.
///
/// Each record gets at most `max_attempts` delivery attempts with jittered
/// exponential backoff between them. Cancellation is checked before every
/// attempt and raced against every backoff wait; it surfaces as
/// [`DispatchError::Cancelled`] so the caller can tell it apart from plain
/// retry exhaustion.
pub struct RetryingSender<S> {
    sink: S,
    policy: RetryPolicy,
    jitter: Box<dyn Fn(Duration, u32) -> Duration + Send + Sync>,
}

impl<S: UserSink> RetryingSender<S> {
    pub fn new(sink: S, policy: RetryPolicy) -> Self {
        Self::with_jitter(sink, policy, |base, attempt| {
            delay_with_jitter(base, attempt, &mut rand::thread_rng())
        })
    }

    /// Same sender with the randomness source swapped out, so tests can
    /// seed or record the backoff delays.
    pub fn with_jitter(
        sink: S,
        policy: RetryPolicy,
        jitter: impl Fn(Duration, u32) -> Duration + Send + Sync + 'static,
    ) -> Self {
        Self {
            sink,
            policy,
            jitter: Box::new(jitter),
        }
    }

    pub async fn deliver(&self, cancel: &CancellationToken, user: &OutboundUser) -> Result<()> {
        let mut causes: Vec<DispatchError> = Vec::new();

        for attempt in 0..self.policy.max_attempts {
            if cancel.is_cancelled() {
                tracing::warn!(
                    user_name = %user.name,
                    attempt = attempt + 1,
                    "cancelled, aborting delivery retries"
                );
                return Err(DispatchError::Cancelled);
            }

            if attempt > 0 {
                let delay = (self.jitter)(self.policy.base_delay, attempt);
                tracing::info!(
                    user_name = %user.name,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "retrying delivery"
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => {
                        tracing::warn!(
                            user_name = %user.name,
                            attempt = attempt + 1,
                            "cancelled during backoff wait"
                        );
                        return Err(DispatchError::Cancelled);
                    }
                }
            }

            match self.sink.send_one(cancel, user).await {
                Ok(()) => {
                    tracing::info!(
                        user_name = %user.name,
                        attempt = attempt + 1,
                        "delivered user downstream"
                    );
                    // Success is authoritative; earlier causes are dropped.
                    return Ok(());
                }
                Err(DispatchError::Cancelled) => return Err(DispatchError::Cancelled),
                Err(e) => {
                    tracing::warn!(
                        user_name = %user.name,
                        attempt = attempt + 1,
                        error = %e,
                        "delivery attempt failed"
                    );
                    causes.push(e);
                }
            }
        }

        let err = DispatchError::RetriesExhausted { causes };
        tracing::error!(
            user_name = %user.name,
            max_retries = self.policy.max_attempts,
            error = %err,
            "giving up on user after exhausting retries"
        );
        Err(err)
    }
}
