use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::{
    error::{ConfigError, FetchError},
    model::Units,
};

/// Historical endpoint of the RSS weather feed this tool was written against.
pub const DEFAULT_ENDPOINT: &str = "http://weather.yahooapis.com/forecastrss";

/// Something that can hand back the raw feed document for a location.
#[async_trait]
pub trait FeedSource: Send + Sync + Debug {
    async fn fetch(&self, location: u64, units: Units) -> Result<String, FetchError>;
}

/// HTTP feed client: `GET <endpoint>?w=<location>&u=<units code>`.
#[derive(Debug, Clone)]
pub struct FeedClient {
    endpoint: Url,
    http: Client,
}

impl FeedClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidEndpoint(e.to_string()))?;

        Ok(Self { endpoint, http })
    }

    pub fn request_url(&self, location: u64, units: Units) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("w", &location.to_string())
            .append_pair("u", units.code());
        url
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch(&self, location: u64, units: Units) -> Result<String, FetchError> {
        let url = self.request_url(location, units);
        debug!(%url, "fetching feed");

        let res = self.http.get(url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
