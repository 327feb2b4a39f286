use std::{env, time::Duration};

use log::{debug, error, info};
use strum::{Display, EnumString};

use crate::error::{Result, ServeError};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// How the selector draws an index from the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum SelectionMode {
    /// Uniform over every catalog entry.
    #[default]
    Full,
    /// Uniform over `[0, len - 1)`, never picking the last entry.
    Legacy,
}

/// What happens to a link's cache entry after its fetch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum FailedFetchPolicy {
    /// Leave the entry empty so the next request fetches again.
    #[default]
    Skip,
    /// Store an empty payload, served as a hit from then on.
    Poison,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    pub bucket: String,
    pub prefix: String,
    pub endpoint: Option<String>,
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub s3: S3Config,
    pub bind_addr: String,
    pub selection: SelectionMode,
    pub failed_fetch_policy: FailedFetchPolicy,
    pub fetch_timeout: Option<Duration>,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or blank, or an option fails to parse.
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name))
    }

    /// Build the configuration from any variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or blank, or an option fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, env::VarError>,
    {
        let required = |name: &str| {
            let value = lookup(name).map_err(|e| {
                error!("Failed to load {name} from environment: {e}");
                ServeError::from(e)
            })?;
            if value.trim().is_empty() {
                error!("{name} is set but empty");
                return Err(ServeError::Config(format!("{name} must not be empty")));
            }
            Ok(value)
        };
        let optional = |name: &str| lookup(name).ok().filter(|value| !value.trim().is_empty());

        let region = required("REGION")?;
        let bucket = required("BUCKET")?;

        let selection = match optional("SELECTION_MODE") {
            Some(raw) => raw.parse::<SelectionMode>().map_err(|_| {
                ServeError::Config(format!(
                    "Invalid SELECTION_MODE '{raw}'. Supported: full, legacy"
                ))
            })?,
            None => SelectionMode::default(),
        };

        let failed_fetch_policy = match optional("FAILED_FETCH_POLICY") {
            Some(raw) => raw.parse::<FailedFetchPolicy>().map_err(|_| {
                ServeError::Config(format!(
                    "Invalid FAILED_FETCH_POLICY '{raw}'. Supported: skip, poison"
                ))
            })?,
            None => FailedFetchPolicy::default(),
        };

        let fetch_timeout = match optional("FETCH_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.trim().parse().map_err(|_| {
                ServeError::Config(format!("Invalid FETCH_TIMEOUT_SECS '{raw}'"))
            })?)),
            None => None,
        };

        let config = Self {
            s3: S3Config {
                region,
                bucket,
                prefix: optional("S3_PREFIX").unwrap_or_default(),
                endpoint: optional("S3_ENDPOINT"),
                public_base_url: optional("PUBLIC_BASE_URL"),
            },
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            selection,
            failed_fetch_policy,
            fetch_timeout,
        };

        info!("Configuration loaded successfully");
        debug!("Region: {}", config.s3.region);
        debug!("Bucket: {}", config.s3.bucket);
        debug!("Selection mode: {}", config.selection);
        debug!("Failed fetch policy: {}", config.failed_fetch_policy);

        Ok(config)
    }
}
