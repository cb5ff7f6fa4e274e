use crate::core::retry::RetryingSender;
use crate::domain::model::OutboundUser;
use crate::domain::ports::{UserSink, UserSource};
use crate::utils::error::{DispatchError, Result};
use tokio_util::sync::CancellationToken;

/// Email suffix marking the records that get forwarded downstream.
/// Matched case-sensitively against the raw address.
const TARGET_EMAIL_SUFFIX: &str = ".biz";

/// Counters for one processing pass, owned by the dispatch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingTally {
    /// Records that matched the filter and went through delivery.
    pub matched: u32,
    /// Records the filter rejected.
    pub skipped: u32,
}

/// Orchestrates one fetch → filter → deliver pass over all upstream records.
///
/// Items are processed strictly in fetch order, one at a time. A failed
/// delivery is logged and tolerated; only fetch failure and cancellation
/// abort the pass.
pub struct Dispatcher<Src, Snk> {
    source: Src,
    sender: RetryingSender<Snk>,
}

impl<Src: UserSource, Snk: UserSink> Dispatcher<Src, Snk> {
    pub fn new(source: Src, sender: RetryingSender<Snk>) -> Self {
        Self { source, sender }
    }

    pub async fn process_all(&self, cancel: &CancellationToken) -> Result<ProcessingTally> {
        let users = match self.source.fetch_all(cancel).await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch users");
                return Err(e);
            }
        };

        tracing::info!(total_users = users.len(), "starting users processing");

        let mut tally = ProcessingTally::default();

        for user in &users {
            if cancel.is_cancelled() {
                tracing::warn!("processing interrupted by cancellation");
                return Err(DispatchError::Cancelled);
            }

            if user.email.ends_with(TARGET_EMAIL_SUFFIX) {
                tally.matched += 1;
                match self.sender.deliver(cancel, &OutboundUser::from(user)).await {
                    Ok(()) => {}
                    Err(DispatchError::Cancelled) => {
                        tracing::warn!("processing interrupted by cancellation");
                        return Err(DispatchError::Cancelled);
                    }
                    Err(e) => {
                        tracing::error!(
                            user_name = %user.name,
                            user_email = %user.email,
                            error = %e,
                            "failed to deliver user downstream"
                        );
                    }
                }
            } else {
                tally.skipped += 1;
                tracing::info!(
                    user_name = %user.name,
                    user_email = %user.email,
                    "skipping user outside target domain"
                );
            }
        }

        tracing::info!(
            matched = tally.matched,
            skipped = tally.skipped,
            "processing completed"
        );

        Ok(tally)
    }
}
