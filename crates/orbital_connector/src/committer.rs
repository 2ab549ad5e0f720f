//! Delivery of request documents with primary/secondary failover.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use error_stack::Report;
use masking::{Mask, Secret};
use tracing::instrument;

use crate::{
    configs::OrbitalSettings,
    consts::{self, headers},
    document::RequestDocument,
    errors::{ConnectorError, CustomResult, HttpClientError},
    logger,
    request_types::OperationOptions,
    scrub::scrub,
    transport::{ConnectorTransport, Headers},
};

/// Sends documents to the primary endpoint until a connection failure is observed,
/// then to the secondary endpoint for the rest of its life.
pub struct Committer {
    transport: Arc<dyn ConnectorTransport>,
    primary_url: String,
    secondary_url: String,
    merchant_id: Secret<String>,
    retry_logic: bool,
    use_secondary_url: AtomicBool,
}

impl std::fmt::Debug for Committer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Committer")
            .field("primary_url", &self.primary_url)
            .field("secondary_url", &self.secondary_url)
            .field("use_secondary_url", &self.is_using_secondary_url())
            .finish_non_exhaustive()
    }
}

impl Committer {
    pub fn new(transport: Arc<dyn ConnectorTransport>, settings: &OrbitalSettings) -> Self {
        Self {
            transport,
            primary_url: settings.primary_url().to_string(),
            secondary_url: settings.secondary_url().to_string(),
            merchant_id: settings.merchant_id.clone(),
            retry_logic: settings.retry_logic,
            use_secondary_url: AtomicBool::new(false),
        }
    }

    pub fn use_secondary_url(&self) {
        self.use_secondary_url.store(true, Ordering::Release);
    }

    pub fn is_using_secondary_url(&self) -> bool {
        self.use_secondary_url.load(Ordering::Acquire)
    }

    /// Serializes and posts `document`, returning the raw reply.
    ///
    /// At most two attempts are made: a connection failure on the primary endpoint is
    /// followed by one attempt on the secondary. Any reply, whatever its content, ends
    /// the commit.
    #[instrument(skip_all, fields(operation = %document.operation))]
    pub async fn commit(
        &self,
        document: &RequestDocument,
        options: &OperationOptions,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        let body = document.to_xml_bytes()?;
        let headers = self.build_headers(body.len(), options);
        logger::debug!(request = %scrub(&String::from_utf8_lossy(&body)));

        if !self.is_using_secondary_url() {
            match self
                .transport
                .send(&self.primary_url, body.clone(), headers.clone())
                .await
            {
                Ok(reply) => return Ok(reply),
                Err(error) if error.current_context().is_connection_failure() => {
                    logger::warn!(
                        error = ?error,
                        "primary endpoint unreachable, switching to the secondary endpoint"
                    );
                    self.use_secondary_url();
                }
                Err(error) => return Err(into_connector_error(error)),
            }
        }

        self.transport
            .send(&self.secondary_url, body, headers)
            .await
            .map_err(into_connector_error)
    }

    fn build_headers(&self, content_length: usize, options: &OperationOptions) -> Headers {
        let mut headers: Headers = vec![
            (headers::MIME_VERSION.to_string(), "1.1".into()),
            (headers::CONTENT_TYPE.to_string(), content_type().into()),
            (headers::CONTENT_TRANSFER_ENCODING.to_string(), "text".into()),
            (headers::REQUEST_NUMBER.to_string(), "1".into()),
            (headers::DOCUMENT_TYPE.to_string(), "Request".into()),
            (
                headers::INTERFACE_VERSION.to_string(),
                consts::INTERFACE_VERSION.into(),
            ),
            (
                headers::CONTENT_LENGTH.to_string(),
                content_length.to_string().into(),
            ),
        ];
        if let Some(trace_number) = options
            .trace_number
            .as_deref()
            .filter(|_| self.retry_logic || options.retry_logic)
        {
            headers.push((headers::TRACE_NUMBER.to_string(), trace_number.into()));
            headers.push((
                headers::MERCHANT_ID.to_string(),
                self.merchant_id.clone().into_masked(),
            ));
        }
        headers
    }
}

/// `application/PTI95` for protocol version 9.5.
fn content_type() -> String {
    format!("application/PTI{}", consts::PROTOCOL_VERSION.replace('.', ""))
}

fn into_connector_error(error: Report<HttpClientError>) -> Report<ConnectorError> {
    let context = match error.current_context() {
        HttpClientError::UnexpectedServerResponse(status) => {
            ConnectorError::UnexpectedHttpStatus(*status)
        }
        HttpClientError::UrlParsingFailed | HttpClientError::ClientConstructionFailed => {
            ConnectorError::InvalidConnectorConfig { config: "endpoints" }
        }
        HttpClientError::RequestNotSent(_)
        | HttpClientError::RequestTimeoutReceived
        | HttpClientError::ConnectionClosedIncompleteMessage
        | HttpClientError::ResponseDecodingFailed => ConnectorError::ConnectionFailure,
    };
    error.change_context(context)
}
