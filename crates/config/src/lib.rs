//! Layered configuration for the `mapgen` binary.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. `config.toml` in the user's configuration directory
//!    (`~/.config/mapgen/config.toml` on Linux)
//! 3. An explicitly given file; TOML, YAML or JSON depending on its extension
//! 4. `MAPGEN_*` environment variables, with `__` between nested keys
//!    (`MAPGEN_OUTPUT__CAPACITY=1000`)

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use mapgen_compress::Compression;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "MAPGEN_";
/// Upper bound for [`OutputConfig::capacity`], the protocol's per-file limit.
pub const MAX_CAPACITY: usize = 50_000;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub ping: PingConfig,
}

/// Where and how sitemap files are written.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Existing directory the sitemap and index files are written to.
    pub folder: PathBuf,
    /// Batch file prefix; `site` produces `site_1.xml.gz`, `site_2.xml.gz`, ...
    pub name: String,
    /// Prefix for locations in the index, usually ending with `/`.
    pub public_url: String,
    /// Index file name, relative to `folder`. Must carry the suffix of
    /// `compression` (`.xml.gz` for gzip, `.xml` otherwise).
    pub index_file: String,
    /// `gzip` or `none`.
    pub compression: String,
    /// URLs per sitemap file.
    pub capacity: usize,
}
impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("."),
            name: "sitemap".to_string(),
            public_url: "/".to_string(),
            index_file: "sitemap_index.xml.gz".to_string(),
            compression: Compression::Gzip.to_string(),
            capacity: MAX_CAPACITY,
        }
    }
}
impl OutputConfig {
    pub fn compression(&self) -> Result<Compression> {
        self.compression
            .parse::<Compression>()
            .or_raise(|| ErrorKind::Invalid(format!("unknown compression {:?}", self.compression)))
    }

    pub fn index_path(&self) -> PathBuf {
        self.folder.join(&self.index_file)
    }

    /// Public location of the index file.
    pub fn index_location(&self) -> String {
        format!("{}{}", self.public_url, self.index_file)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PingConfig {
    /// Ping search engines after writing an index.
    pub enabled: bool,
    /// Overrides the notifier's built-in endpoints when set.
    pub endpoints: Option<Vec<String>>,
    /// Per-request timeout; no timeout when unset.
    pub timeout_secs: Option<u64>,
}
impl PingConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load and validate the configuration from every layer.
    ///
    /// # Errors
    ///
    /// [`NotFound`](ErrorKind::NotFound) if `explicit` is given but missing,
    /// [`Load`](ErrorKind::Load) if a source can't be parsed, and
    /// [`Invalid`](ErrorKind::Invalid) if [`validate`](Self::validate) fails.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let user = ProjectDirs::from("", "", "mapgen").map(|dirs| dirs.config_dir().join("config.toml"));
        Self::load_layers(user.as_deref(), explicit)
    }

    fn load_layers(user: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        // A missing user file is simply skipped by the provider.
        if let Some(user) = user {
            tracing::debug!(path = %user.display(), "Looking for user configuration");
            figment = figment.merge(Toml::file(user));
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "Loading configuration file");
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        let config: Self = figment.merge(Env::prefixed(ENV_PREFIX).split("__")).extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the batching pipeline would refuse later anyway.
    pub fn validate(&self) -> Result<()> {
        let output = &self.output;
        if !(1..=MAX_CAPACITY).contains(&output.capacity) {
            exn::bail!(ErrorKind::Invalid(format!(
                "output.capacity must be between 1 and {MAX_CAPACITY}, got {}",
                output.capacity
            )));
        }
        if output.name.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("output.name must not be empty".to_string()));
        }
        if output.index_file.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("output.index_file must not be empty".to_string()));
        }
        let suffix = output.compression()?.xml_suffix();
        if !output.index_file.ends_with(suffix) {
            exn::bail!(ErrorKind::Invalid(format!(
                "output.index_file {:?} must end with {suffix:?} for {} compression",
                output.index_file, output.compression
            )));
        }
        if self.ping.enabled && self.ping.endpoints.as_ref().is_some_and(Vec::is_empty) {
            exn::bail!(ErrorKind::Invalid("ping.endpoints must not be empty when pinging is enabled".to_string()));
        }
        Ok(())
    }
}
