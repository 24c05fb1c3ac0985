//! # HTTP Retrieval Utilities
//!
//! An asynchronous GET-JSON client around `reqwest` with the `reqwest-retry`
//! middleware. The retry budget is chosen per client; `0` means exactly one
//! request. Non-2xx responses are not errors: they come back as an
//! [`ApiResponse`] with `success == false` and the raw error body, leaving the
//! caller to decide how to degrade.

use std::time::Duration;

use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("lib_splash/", env!("CARGO_PKG_VERSION"));

/// Failures of the HTTP layer itself (not HTTP error statuses).
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The base URL did not parse as an absolute URL.
    #[error("invalid base url {url}: {source}")]
    InvalidBaseUrl {
        /// The rejected input.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// The request path could not be joined onto the base URL.
    #[error("cannot join path {path}: {source}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// The underlying `reqwest` client could not be built.
    #[error("http client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    /// The request failed (connect error, timeout, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    /// A 2xx body did not deserialize into the expected type.
    #[error("response body did not decode: {0}")]
    Decode(#[source] reqwest::Error),
}

/// A decoded body or the raw error body, with the status.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The deserialized body on success.
    pub data: Option<T>,
    /// The raw body on a non-2xx status.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Whether the status code was in the 2xx range.
    pub success: bool,
}

/// A base-URL-scoped JSON client with retry middleware.
#[derive(Clone)]
pub struct ApiClient {
    inner: ClientWithMiddleware,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl ApiClient {
    /// Creates a client that retries transient failures up to `max_retries`
    /// times.
    ///
    /// `base_url` should end with `/` if relative paths are meant to be
    /// appended rather than replace its last segment.
    pub fn new(base_url: &str, max_retries: u32) -> Result<Self, RetrieveError> {
        let url = Url::parse(base_url).map_err(|source| RetrieveError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(RetrieveError::Client)?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            inner: client,
            base_url: url,
        })
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET {base_url}{path}` and decode a JSON body.
    pub async fn get_json<T>(&self, path: &str) -> Result<ApiResponse<T>, RetrieveError>
    where
        T: DeserializeOwned,
    {
        let full_url = self
            .base_url
            .join(path)
            .map_err(|source| RetrieveError::InvalidPath {
                path: path.to_string(),
                source,
            })?;
        tracing::debug!(url = %full_url, "http get");

        let response: reqwest::Response = self.inner.get(full_url).send().await?;
        let status = response.status();

        if status.is_success() {
            let data = response.json::<T>().await.map_err(RetrieveError::Decode)?;
            Ok(ApiResponse {
                data: Some(data),
                error_body: None,
                status: status.as_u16(),
                success: true,
            })
        } else {
            let error_text = response.text().await.ok();
            Ok(ApiResponse {
                data: None,
                error_body: error_text,
                status: status.as_u16(),
                success: false,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_base_url_is_rejected() {
        let err = ApiClient::new("api/v4/latest/", 0).expect_err("relative url");
        assert!(matches!(err, RetrieveError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn trailing_slash_keeps_last_segment() {
        let client = ApiClient::new("https://api.example.com/v4/latest/", 3).expect("client");
        let joined = client.base_url().join("RUB").expect("join");
        assert_eq!(joined.as_str(), "https://api.example.com/v4/latest/RUB");
    }
}
