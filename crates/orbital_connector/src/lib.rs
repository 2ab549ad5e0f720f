#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

//!
//! Adapter for the Orbital (Chase Paymentech) XML gateway: request composition,
//! delivery with endpoint failover, reply parsing and outcome classification.
//!

#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR" ), "/", "README.md"))]

pub mod authorization;
pub mod classifier;
pub mod codes;
pub mod committer;
pub mod configs;
pub mod consts;
pub mod document;
pub mod errors;
pub mod formatter;
pub mod orbital;
pub mod parser;
pub mod payment_method_data;
pub mod request_types;
pub mod scrub;
pub mod transformers;
pub mod transport;
pub mod types;

pub(crate) mod logger {
    pub(crate) use tracing::{debug, info, warn};
}

pub use classifier::{MessageType, Outcome};
pub use configs::OrbitalSettings;
pub use errors::{ConnectorError, CustomResult, HttpClientError};
pub use orbital::Orbital;
pub use transport::{ConnectorTransport, Headers, HttpTransport};
