use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Maximum idle time between two reads of the response body.
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            user_agent: concat!("linkharvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A response body being received.
#[async_trait::async_trait]
pub trait BodyStream: Send {
    /// Declared size of the body, when the server sent one.
    fn total_bytes(&self) -> Option<u64>;

    /// Next piece of the body; `None` once the body is exhausted.
    async fn next_chunk(&mut self) -> Option<Result<Bytes, FetchError>>;
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues a GET and returns the body stream of a 2xx response.
    async fn open(&self, url: &str) -> Result<Box<dyn BodyStream>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .user_agent(settings.user_agent)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn open(&self, url: &str) -> Result<Box<dyn BodyStream>, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let total = response.content_length();
        Ok(Box::new(ReqwestBody {
            total,
            stream: Box::pin(response.bytes_stream()),
        }))
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

struct ReqwestBody {
    total: Option<u64>,
    stream: ByteStream,
}

#[async_trait::async_trait]
impl BodyStream for ReqwestBody {
    fn total_bytes(&self) -> Option<u64> {
        self.total
    }

    async fn next_chunk(&mut self) -> Option<Result<Bytes, FetchError>> {
        self.stream
            .next()
            .await
            .map(|chunk| chunk.map_err(map_reqwest_error))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
