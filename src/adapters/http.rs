use crate::config::Config;
use crate::domain::model::{OutboundUser, User};
use crate::domain::ports::{UserSink, UserSource};
use crate::utils::error::{DispatchError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Outer bound on any single request; per-call timeouts from the config are
/// applied on top of this, per request.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin reqwest wrapper over both configured endpoints. Does one fetch and
/// one send per call; all retry policy lives in the core.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    fetch_url: String,
    send_url: String,
    call_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder().timeout(CLIENT_TIMEOUT).build()?;
        Ok(Self {
            http,
            fetch_url: config.fetch_url.clone(),
            send_url: config.send_url.clone(),
            call_timeout: config.call_timeout(),
        })
    }
}

#[async_trait]
impl UserSource for ApiClient {
    async fn fetch_all(&self, cancel: &CancellationToken) -> Result<Vec<User>> {
        tracing::info!(url = %self.fetch_url, "fetching users from source API");

        let request = async {
            let response = self
                .http
                .get(&self.fetch_url)
                .timeout(self.call_timeout)
                .send()
                .await?;

            let status = response.status();
            if status != StatusCode::OK {
                tracing::error!(status_code = status.as_u16(), "unexpected status from source API");
                return Err(DispatchError::UnexpectedStatus { status });
            }

            let body = response.bytes().await?;
            let users: Vec<User> = serde_json::from_slice(&body)?;
            Ok(users)
        };

        let users = tokio::select! {
            result = request => result?,
            _ = cancel.cancelled() => return Err(DispatchError::Cancelled),
        };

        tracing::info!(count = users.len(), "successfully fetched users");
        Ok(users)
    }
}

#[async_trait]
impl UserSink for ApiClient {
    async fn send_one(&self, cancel: &CancellationToken, user: &OutboundUser) -> Result<()> {
        let request = async {
            let response = self
                .http
                .post(&self.send_url)
                .timeout(self.call_timeout)
                .json(user)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                tracing::warn!(
                    status_code = status.as_u16(),
                    "received non-2xx status from target API"
                );
                return Err(DispatchError::UnexpectedStatus { status });
            }
            Ok(())
        };

        tokio::select! {
            result = request => result,
            _ = cancel.cancelled() => Err(DispatchError::Cancelled),
        }
    }
}
