//! HTTP boundary of the adapter.

use std::{error::Error, time::Duration};

use error_stack::{report, ResultExt};
use masking::Maskable;
use once_cell::sync::OnceCell;
use reqwest::redirect::Policy;
use tracing::instrument;

use crate::{
    errors::{CustomResult, HttpClientError},
    logger,
};

/// Ordered request headers; masked values never reach the logs.
pub type Headers = Vec<(String, Maskable<String>)>;

static DEFAULT_CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

/// Posts one request document and hands back the raw reply body.
///
/// Implementations report anything that kept the request from reaching the processor
/// as a connection failure (see [`HttpClientError::is_connection_failure`]); the
/// committer relies on that to decide on failover.
#[async_trait::async_trait]
pub trait ConnectorTransport: Send + Sync {
    async fn send(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: Headers,
    ) -> CustomResult<Vec<u8>, HttpClientError>;
}

/// `reqwest` backed transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64) -> CustomResult<Self, HttpClientError> {
        Ok(Self {
            client: get_client()?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn get_client() -> CustomResult<reqwest::Client, HttpClientError> {
    DEFAULT_CLIENT
        .get_or_try_init(|| {
            reqwest::Client::builder()
                .redirect(Policy::none())
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .change_context(HttpClientError::ClientConstructionFailed)
                .attach_printable("Failed to construct base client")
        })
        .cloned()
}

#[async_trait::async_trait]
impl ConnectorTransport for HttpTransport {
    #[instrument(skip_all)]
    async fn send(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: Headers,
    ) -> CustomResult<Vec<u8>, HttpClientError> {
        logger::info!(?url, ?headers, "sending request to orbital");

        let url = url::Url::parse(url).change_context(HttpClientError::UrlParsingFailed)?;
        let request = headers
            .into_iter()
            .fold(self.client.post(url), |request, (name, value)| {
                request.header(name, value.into_inner())
            })
            .body(body)
            .timeout(self.timeout);

        // Never resent to the same endpoint; the body may already have been acted on.
        let response = execute(request).await?;

        let status = response.status();
        logger::info!(status_code = status.as_u16(), "received reply from orbital");
        if !status.is_success() {
            return Err(report!(HttpClientError::UnexpectedServerResponse(
                status.as_u16()
            )))
            .attach_printable_lazy(|| format!("orbital answered with status {status}"));
        }

        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .change_context(HttpClientError::ResponseDecodingFailed)
            .attach_printable("Error reading reply body")
    }
}

async fn execute(
    request: reqwest::RequestBuilder,
) -> CustomResult<reqwest::Response, HttpClientError> {
    request
        .send()
        .await
        .map_err(|error| match error {
            error if error.is_timeout() => HttpClientError::RequestTimeoutReceived,
            error if is_connection_closed_before_message_could_complete(&error) => {
                HttpClientError::ConnectionClosedIncompleteMessage
            }
            _ => HttpClientError::RequestNotSent(error.to_string()),
        })
        .attach_printable("Unable to send request to connector")
}

fn is_connection_closed_before_message_could_complete(error: &reqwest::Error) -> bool {
    let mut source = error.source();
    while let Some(err) = source {
        if let Some(hyper_err) = err.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() {
                return true;
            }
        }
        source = err.source();
    }
    false
}
