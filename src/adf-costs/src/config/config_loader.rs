use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config::builder::DefaultState;
use config::{Config as RConfig, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use url::Url;

use crate::constants::{
    API_VERSION, DEFAULT_DELIMITER, DEFAULT_OUTPUT_PATH, DEFAULT_SUMMARY_OUTPUT_PATH,
    LOGIN_ENDPOINT, MANAGEMENT_ENDPOINT, MAX_LOOKBACK_DAYS, TOKEN_RESOURCE,
};

fn default_lookback_days() -> u32 {
    1
}

/// Everything one scan needs, resolved once at startup and passed down explicitly.
#[derive(Clone, Deserialize)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub subscription_id: String,
    // aliased fields must not get builder defaults, or an aliased key
    // deserializes as a duplicate field
    #[serde(alias = "rg_name", default)]
    pub resource_group: String,
    #[serde(alias = "adf_name", default)]
    pub factory_name: String,
    #[serde(alias = "last_updated_days", default = "default_lookback_days")]
    pub lookback_days: u32,

    pub management_endpoint: String,
    pub login_endpoint: String,
    pub token_resource: String,
    pub api_version: String,

    pub output_path: PathBuf,
    pub summary_output_path: PathBuf,
    pub write_summary: bool,
    pub delimiter: String,
    pub decimal_comma: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .field("resource_group", &self.resource_group)
            .field("factory_name", &self.factory_name)
            .field("lookback_days", &self.lookback_days)
            .field("management_endpoint", &self.management_endpoint)
            .field("login_endpoint", &self.login_endpoint)
            .field("token_resource", &self.token_resource)
            .field("api_version", &self.api_version)
            .field("output_path", &self.output_path)
            .field("summary_output_path", &self.summary_output_path)
            .field("write_summary", &self.write_summary)
            .field("delimiter", &self.delimiter)
            .field("decimal_comma", &self.decimal_comma)
            .finish()
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("tenant_id", &self.tenant_id),
            ("subscription_id", &self.subscription_id),
            ("resource_group", &self.resource_group),
            ("factory_name", &self.factory_name),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| *key)
            .collect();
        if !missing.is_empty() {
            bail!("missing required settings: {}", missing.join(", "));
        }

        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            bail!(
                "lookback_days must be between 1 and {}, got {}",
                MAX_LOOKBACK_DAYS,
                self.lookback_days
            );
        }

        if self.delimiter.len() != 1 {
            bail!(
                "delimiter must be a single ascii character, got {:?}",
                self.delimiter
            );
        }

        Url::parse(&self.management_endpoint).context("invalid management_endpoint")?;
        Url::parse(&self.login_endpoint).context("invalid login_endpoint")?;

        Ok(())
    }

    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub lookback_days: Option<u32>,
    pub output_path: Option<PathBuf>,
    pub summary_output_path: Option<PathBuf>,
    pub write_summary: Option<bool>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(days) = self.lookback_days {
            config.lookback_days = days;
        }
        if let Some(path) = &self.output_path {
            config.output_path = path.clone();
        }
        if let Some(path) = &self.summary_output_path {
            config.summary_output_path = path.clone();
        }
        if let Some(write_summary) = self.write_summary {
            config.write_summary = write_summary;
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the optional TOML file, then the process environment
    /// (a `.env` file is loaded into it first), then command line overrides.
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Config> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err).context("failed to read .env file"),
        }

        Self::build(file, Some(Environment::default()), overrides)
    }

    pub(crate) fn build(
        file: Option<&Path>,
        environment: Option<Environment>,
        overrides: &ConfigOverrides,
    ) -> Result<Config> {
        let mut builder = Self::defaults()?;

        if let Some(path) = file {
            let path = path
                .to_str()
                .with_context(|| format!("config path {:?} is not valid utf-8", path))?;
            builder = builder.add_source(File::new(path, FileFormat::Toml).required(true));
        }

        if let Some(environment) = environment {
            builder = builder.add_source(environment);
        }

        let mut config: Config = builder
            .build()?
            .try_deserialize()
            .context("failed to parse configuration")?;

        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(RConfig::builder()
            .set_default("client_id", "")?
            .set_default("client_secret", "")?
            .set_default("tenant_id", "")?
            .set_default("subscription_id", "")?
            .set_default("management_endpoint", MANAGEMENT_ENDPOINT)?
            .set_default("login_endpoint", LOGIN_ENDPOINT)?
            .set_default("token_resource", TOKEN_RESOURCE)?
            .set_default("api_version", API_VERSION)?
            .set_default("output_path", DEFAULT_OUTPUT_PATH)?
            .set_default("summary_output_path", DEFAULT_SUMMARY_OUTPUT_PATH)?
            .set_default("write_summary", true)?
            .set_default("delimiter", DEFAULT_DELIMITER)?
            .set_default("decimal_comma", false)?)
    }
}
