//! Network access for the package fetcher and library loader.
//!
//! The fetch layer only needs "GET a URL, give me status and body". Hosts
//! plug in their own [`Transport`]; an HTTP client backed by `reqwest` is
//! available behind the `http` feature.

use async_trait::async_trait;
use url::Url;

use crate::diagnostic::FetchError;

/// Response to a GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response body, decoded as text.
    pub body: String,
}

impl Response {
    /// A `200 OK` response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`FetchError::Status`].
    pub fn error_for_status(self, url: &Url) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

/// Source of remote content.
///
/// Futures are not required to be `Send`: browser hosts drive them on a
/// single-threaded executor.
#[async_trait(?Send)]
pub trait Transport {
    /// Perform a GET request.
    ///
    /// Only failures to complete the request are errors; any received
    /// status, including 4xx/5xx, is returned as a [`Response`].
    async fn get(&self, url: &Url) -> Result<Response, FetchError>;
}

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use url::Url;

    use super::{Response, Transport};
    use crate::config::Config;
    use crate::diagnostic::FetchError;

    /// [`Transport`] backed by a shared `reqwest` client.
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        client: reqwest::Client,
    }

    impl HttpTransport {
        /// Create a client sending `user_agent` with every request.
        pub fn new(user_agent: &str) -> Result<Self, FetchError> {
            let client = reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .map_err(|e| FetchError::Transport {
                    url: String::new(),
                    message: e.to_string(),
                })?;
            Ok(Self { client })
        }

        /// Create a client sending the configured user agent.
        pub fn from_config(config: &Config) -> Result<Self, FetchError> {
            Self::new(&config.user_agent)
        }
    }

    #[async_trait(?Send)]
    impl Transport for HttpTransport {
        async fn get(&self, url: &Url) -> Result<Response, FetchError> {
            let transport_err = |e: reqwest::Error| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            };

            tracing::debug!(%url, "GET");
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(transport_err)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(transport_err)?;
            Ok(Response { status, body })
        }
    }
}
