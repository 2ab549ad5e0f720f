//! Adapter settings.

use config::{Config, Environment, File};
use error_stack::{report, ResultExt};
use masking::{PeekInterface, Secret};
use serde::Deserialize;

use crate::{
    consts,
    errors::{ConnectorError, CustomResult},
};

const CONFIG_FILE_PATH: &str = "config/orbital.toml";
const CONFIG_FILE_PREFIX: &str = "config/orbital_";
const ENV_PREFIX: &str = "ORBITAL";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrbitalSettings {
    pub merchant_id: Secret<String>,
    pub login: Option<Secret<String>>,
    pub password: Option<Secret<String>>,
    /// Source IP allow-listing at the processor; no credentials are sent.
    pub ip_authentication: bool,
    pub bin: Option<String>,
    pub test: bool,
    pub customer_profiles: bool,
    pub retry_logic: bool,
    /// Seconds.
    pub request_timeout: Option<u64>,
    pub endpoints: Endpoints,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub test_url: String,
    pub secondary_test_url: String,
    pub live_url: String,
    pub secondary_live_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            test_url: consts::TEST_URL.to_string(),
            secondary_test_url: consts::SECONDARY_TEST_URL.to_string(),
            live_url: consts::LIVE_URL.to_string(),
            secondary_live_url: consts::SECONDARY_LIVE_URL.to_string(),
        }
    }
}

impl OrbitalSettings {
    /// Loads `config/orbital.toml`, then `config/orbital_<RUN_ENV>.toml` if it exists,
    /// then `ORBITAL__*` environment variables.
    pub fn new() -> CustomResult<Self, ConnectorError> {
        let env = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE_PATH).required(false))
            .add_source(File::with_name(&format!("{CONFIG_FILE_PREFIX}{env}")).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(Config::try_deserialize)
            .change_context(ConnectorError::InvalidConnectorConfig {
                config: "orbital settings",
            })
            .attach_printable_lazy(|| format!("failed to load settings for environment {env}"))
    }

    pub fn validate(&self) -> CustomResult<(), ConnectorError> {
        when(self.merchant_id.peek().trim().is_empty(), || {
            Err(report!(ConnectorError::InvalidConnectorConfig {
                config: "merchant_id"
            }))
            .attach_printable("merchant id must not be empty")
        })?;
        when(!self.ip_authentication && is_blank(self.login.as_ref()), || {
            Err(report!(ConnectorError::InvalidConnectorConfig { config: "login" }))
                .attach_printable("login is required unless ip authentication is enabled")
        })?;
        when(!self.ip_authentication && is_blank(self.password.as_ref()), || {
            Err(report!(ConnectorError::InvalidConnectorConfig { config: "password" }))
                .attach_printable("password is required unless ip authentication is enabled")
        })
    }

    /// Routing BIN; merchants on the Salem platform have six character ids.
    pub fn get_bin(&self) -> String {
        match self.bin.as_deref() {
            Some(bin) if !bin.trim().is_empty() => bin.to_string(),
            _ if self.merchant_id.peek().len() == consts::SALEM_MERCHANT_ID_LENGTH => {
                consts::SALEM_BIN.to_string()
            }
            _ => consts::PNS_BIN.to_string(),
        }
    }

    pub fn primary_url(&self) -> &str {
        if self.test {
            &self.endpoints.test_url
        } else {
            &self.endpoints.live_url
        }
    }

    pub fn secondary_url(&self) -> &str {
        if self.test {
            &self.endpoints.secondary_test_url
        } else {
            &self.endpoints.secondary_live_url
        }
    }

    pub fn get_request_timeout(&self) -> u64 {
        self.request_timeout.unwrap_or(consts::REQUEST_TIME_OUT)
    }
}

fn is_blank(value: Option<&Secret<String>>) -> bool {
    value.map_or(true, |value| value.peek().trim().is_empty())
}

fn when<F>(predicate: bool, f: F) -> CustomResult<(), ConnectorError>
where
    F: FnOnce() -> CustomResult<(), ConnectorError>,
{
    if predicate {
        f()
    } else {
        Ok(())
    }
}
