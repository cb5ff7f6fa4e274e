use crate::domain::model::{OutboundUser, User};
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Upstream side: one bulk read of user records. Fetch failures are fatal
/// to the whole pass, so implementations do not retry.
#[async_trait]
pub trait UserSource: Send + Sync {
    async fn fetch_all(&self, cancel: &CancellationToken) -> Result<Vec<User>>;
}

/// Downstream side: one delivery attempt for one record. Retry lives in the
/// layer above, never here.
#[async_trait]
pub trait UserSink: Send + Sync {
    async fn send_one(&self, cancel: &CancellationToken, user: &OutboundUser) -> Result<()>;
}
