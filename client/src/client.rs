use crate::{Error, Result};
use reqwest::Client as HttpClient;
use riddle_types::{
    api::{
        Clue, Completion, ErrorResponse, Leaderboard, PlayerRequest, PlayerSnapshot, Stats,
    },
    Stage, FINAL_STAGE,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;
use url::Url;

/// Timeout for connections and requests
const TIMEOUT: Duration = Duration::from_secs(30);

/// Retry policy for transient failures of read-only requests.
///
/// Stage submissions are never retried: a lost response after a successful
/// advance would turn the retry into a wrong-stage rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request (including the first attempt).
    pub max_attempts: usize,
    /// Delay after the first retryable failure; doubles on every retry.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Riddle hunt API client
#[derive(Clone)]
pub struct Client {
    pub base_url: Url,
    pub http_client: HttpClient,

    retry_policy: RetryPolicy,
}

impl Client {
    /// Create a new client
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        match base_url.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::InvalidScheme(scheme.to_string())),
        }

        let http_client = HttpClient::builder()
            .timeout(TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            base_url,
            http_client,
            retry_policy: RetryPolicy::default(),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// Returns a new client with the provided retry policy.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidScheme(self.base_url.scheme().to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let max_attempts = self.retry_policy.max_attempts.max(1);
        let mut backoff = self.retry_policy.initial_backoff;
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(%url, attempt, "GET");
            match self.http_client.get(url.clone()).send().await {
                Ok(response) => {
                    if !is_retryable_status(response.status()) || attempt >= max_attempts {
                        return decode(response).await;
                    }
                }
                Err(err) => {
                    if attempt >= max_attempts || !is_retryable_error(&err) {
                        return Err(Error::Reqwest(err));
                    }
                }
            }

            if backoff > Duration::ZERO {
                sleep(backoff).await;
                backoff = std::cmp::min(backoff.saturating_mul(2), self.retry_policy.max_backoff);
            }
        }
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, name: &str) -> Result<T> {
        let url = self.endpoint(&[path])?;
        debug!(%url, player = name, "POST");
        let response = self
            .http_client
            .post(url)
            .json(&PlayerRequest {
                name: name.to_string(),
            })
            .send()
            .await?;
        decode(response).await
    }

    /// Register a player and receive the first clue
    pub async fn start(&self, name: &str) -> Result<Clue> {
        self.post("start", name).await
    }

    /// Clear an intermediate stage and receive the next clue
    pub async fn advance(&self, name: &str, stage: Stage) -> Result<Clue> {
        self.post(stage.as_str(), name).await
    }

    /// Clear the final stage
    pub async fn finish(&self, name: &str) -> Result<Completion> {
        self.post(FINAL_STAGE, name).await
    }

    pub async fn players(&self) -> Result<Vec<PlayerSnapshot>> {
        self.get(self.endpoint(&["players"])?).await
    }

    /// Look up a single player, `None` if the name is unknown
    pub async fn player(&self, name: &str) -> Result<Option<PlayerSnapshot>> {
        match self.get(self.endpoint(&["players", name])?).await {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(Error::Rejected { status, .. }) if status == reqwest::StatusCode::NOT_FOUND => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn leaderboard(&self) -> Result<Leaderboard> {
        self.get(self.endpoint(&["leaderboard"])?).await
    }

    pub async fn stats(&self) -> Result<Stats> {
        self.get(self.endpoint(&["stats"])?).await
    }

    pub async fn health(&self) -> Result<()> {
        let response = self
            .http_client
            .get(self.endpoint(&["health"])?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Failed(response.status()));
        }
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    match response.json::<ErrorResponse>().await {
        Ok(body) => Err(Error::Rejected {
            status,
            message: body.error,
        }),
        Err(_) => Err(Error::Failed(status)),
    }
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    use reqwest::StatusCode;
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
