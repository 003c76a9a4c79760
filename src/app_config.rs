//! Settings file loading for CLI defaults.
//!
//! The settings file holds transport and client tuning, never credentials
//! (those live in the state file managed by the library's config store).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use shelf_archiver_core::catalog::{DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT};
use shelf_archiver_core::config::store::default_config_dir;
use shelf_archiver_core::database::DEFAULT_API_VERSION;
use shelf_archiver_core::proxy::{
    DEFAULT_PROXY_PARAM, DEFAULT_PUBLIC_PROXY_ENDPOINT, HttpSettings,
};
use shelf_archiver_core::TransportMode;

use crate::cli::{GlobalArgs, TransportArg};

const SETTINGS_FILE_NAME: &str = "config.toml";

/// Values read from `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default transport strategy.
    pub transport: Option<TransportArg>,
    /// Same-origin relay endpoint for `transport = "relay"`.
    pub relay_url: Option<String>,
    /// Public bridge endpoint for `transport = "proxy"`.
    pub proxy_url: Option<String>,
    /// Query parameter the public bridge reads the target URL from.
    pub proxy_param: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    /// Catalog results per search (1..=100).
    pub max_results: Option<u32>,
    /// Database API version header.
    pub notion_version: Option<String>,
    /// Base URL that `share` prepends to the shared query.
    pub share_base_url: Option<String>,
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;

        if let Some(max_results) = self.max_results
            && !(1..=MAX_RESULTS_LIMIT).contains(&max_results)
        {
            bail!(
                "Invalid config value for `max_results`: {max_results}. Expected range: 1..={MAX_RESULTS_LIMIT}"
            );
        }

        for (field, value) in [
            ("relay_url", self.relay_url.as_deref()),
            ("proxy_url", self.proxy_url.as_deref()),
            ("share_base_url", self.share_base_url.as_deref()),
        ] {
            if let Some(value) = value
                && url::Url::parse(value).is_err()
            {
                bail!("Invalid config value for `{field}`: '{value}' is not an absolute URL");
            }
        }

        if let Some(param) = &self.proxy_param
            && param.trim().is_empty()
        {
            bail!("Invalid config value for `proxy_param`: must not be empty");
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Verbose => "verbose",
            Self::Quiet => "quiet",
            Self::Debug => "debug",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    pub fn loaded_from_file(&self) -> bool {
        self.config.is_some()
    }
}

/// Resolves the settings path next to the state file.
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    default_config_dir()
        .ok()
        .map(|dir| dir.join(SETTINGS_FILE_NAME))
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "transport" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.transport = Some(parse_transport(&parsed).with_context(|| {
                    format!("Invalid `transport` value '{parsed}' on line {line_no}")
                })?);
            }
            "relay_url" => cfg.relay_url = Some(parse_string_literal(value).with_context(invalid)?),
            "proxy_url" => cfg.proxy_url = Some(parse_string_literal(value).with_context(invalid)?),
            "proxy_param" => {
                cfg.proxy_param = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "max_results" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                let n = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_results out of range for u32"))?;
                cfg.max_results = Some(n);
            }
            "notion_version" => {
                cfg.notion_version = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "share_base_url" => {
                cfg.share_base_url = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_transport(value: &str) -> Result<TransportArg> {
    match value {
        "direct" => Ok(TransportArg::Direct),
        "relay" => Ok(TransportArg::Relay),
        "proxy" => Ok(TransportArg::Proxy),
        _ => bail!("Expected one of: direct, relay, proxy"),
    }
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

/// Effective runtime settings: CLI flags over the settings file over defaults.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub transport: TransportMode,
    pub http: HttpSettings,
    pub max_results: u32,
    pub api_version: String,
    pub share_base_url: Option<String>,
}

impl RuntimeSettings {
    /// Merges `global` CLI flags over `file`.
    pub fn resolve(global: &GlobalArgs, file: &FileConfig) -> Result<Self> {
        let transport = match global.transport.or(file.transport).unwrap_or_default() {
            TransportArg::Direct => TransportMode::Direct,
            TransportArg::Relay => {
                let Some(endpoint) = global.relay_url.as_deref().or(file.relay_url.as_deref())
                else {
                    bail!("Relay transport needs an endpoint: pass --relay-url or set `relay_url`");
                };
                TransportMode::relay(endpoint)
                    .with_context(|| format!("Invalid relay URL '{endpoint}'"))?
            }
            TransportArg::Proxy => {
                let endpoint = global
                    .proxy_url
                    .as_deref()
                    .or(file.proxy_url.as_deref())
                    .unwrap_or(DEFAULT_PUBLIC_PROXY_ENDPOINT);
                let param = file.proxy_param.as_deref().unwrap_or(DEFAULT_PROXY_PARAM);
                TransportMode::public_proxy(endpoint, param)
                    .with_context(|| format!("Invalid proxy URL '{endpoint}'"))?
            }
        };

        let defaults = HttpSettings::default();
        Ok(Self {
            transport,
            http: HttpSettings {
                connect_timeout_secs: file
                    .connect_timeout_secs
                    .unwrap_or(defaults.connect_timeout_secs),
                read_timeout_secs: file.read_timeout_secs.or(defaults.read_timeout_secs),
            },
            max_results: file.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            api_version: file
                .notion_version
                .clone()
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            share_base_url: file.share_base_url.clone(),
        })
    }
}
