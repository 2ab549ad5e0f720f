//! Errors and error specific types for the Orbital adapter

/// Custom Result
/// A custom datatype that wraps the error variant <E> into a report, allowing
/// error_stack::Report<E> specific extendability
///
/// Effectively, equivalent to `Result<T, error_stack::Report<E>>`
pub type CustomResult<T, E> = error_stack::Result<T, E>;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConnectorError {
    #[error("Missing required option: {field_name}")]
    MissingRequiredOption { field_name: &'static str },
    #[error("Invalid value for option {field_name}: {reason}")]
    InvalidOptionValue {
        field_name: &'static str,
        reason: String,
    },
    #[error("Authorization string could not be decoded")]
    MalformedAuthorization,
    #[error("Unable to reach the processor on any endpoint")]
    ConnectionFailure,
    #[error("The processor answered with HTTP status {0}")]
    UnexpectedHttpStatus(u16),
    #[error("Failed to encode connector request")]
    RequestEncodingFailed,
    #[error("Failed to deserialize connector response")]
    ResponseDeserializationFailed,
    #[error("Invalid connector configuration: {config}")]
    InvalidConnectorConfig { config: &'static str },
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum HttpClientError {
    #[error("URL parsing failed")]
    UrlParsingFailed,
    #[error("Failed to construct the http client")]
    ClientConstructionFailed,
    #[error("Failed to send request to the processor: {0}")]
    RequestNotSent(String),
    #[error("Server responded with Request Timeout")]
    RequestTimeoutReceived,
    #[error("connection closed before a message could complete")]
    ConnectionClosedIncompleteMessage,
    #[error("Failed to decode response body")]
    ResponseDecodingFailed,
    #[error("Server responded with status {0}")]
    UnexpectedServerResponse(u16),
}

impl HttpClientError {
    /// Connection level failures are the only ones that move a commit to the
    /// secondary endpoint. A reply from the server, whatever its status, is not one.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::RequestNotSent(_)
                | Self::RequestTimeoutReceived
                | Self::ConnectionClosedIncompleteMessage
        )
    }
}
