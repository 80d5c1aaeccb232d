// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use clap::Parser;

use crate::constants::{
    DEFAULT_COMMAND, DEFAULT_SERVER_ADDR, ENV_COMMAND, ENV_KEY_ID, ENV_KMS_ENDPOINT,
    ENV_LOG_FORMAT, ENV_SERVER_ADDR, ENV_SERVER_ONLY,
};
use crate::errors::{ConfigError, ShimError};

/// Command line of the shim.
///
/// Everything except `--version` belongs to the child command and is passed
/// through untouched, including `--help`.
#[derive(Debug, Clone, Parser)]
#[command(
    author,
    about,
    long_about = None,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Print the shim version followed by the child command's version.
    #[arg(long)]
    pub version: bool,
    /// Arguments forwarded to the child command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    pub args: Vec<String>,
}

impl Cli {
    pub fn wants_version(&self) -> bool {
        self.version
            || self
                .args
                .iter()
                .any(|arg| arg == "--version" || arg == "-version")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Process configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub key_id: Option<String>,
    pub server_addr: String,
    pub command: String,
    pub server_only: bool,
    pub kms_endpoint: Option<String>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            key_id: None,
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            command: DEFAULT_COMMAND.to_string(),
            server_only: false,
            kms_endpoint: None,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration from `lookup`. Empty values count as unset.
    ///
    /// | Field | Variables | Default |
    /// |-------|-----------|---------|
    /// | `key_id` | `KMS_SHIM_KEY_ID`, then `AWS_KMS_KEY_ID` | none |
    /// | `server_addr` | `KMS_SHIM_SERVER_ADDR` | `127.0.0.1:8200` |
    /// | `command` | `KMS_SHIM_COMMAND` | `sops` |
    /// | `server_only` | `KMS_SHIM_SERVER_ONLY` | `false` |
    /// | `kms_endpoint` | `KMS_SHIM_KMS_ENDPOINT` | none |
    /// | `log_format` | `KMS_SHIM_LOG_FORMAT` | `text` |
    ///
    /// The key id is only required once the server is about to start, see
    /// [`Config::require_key_id`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let server_only = match value(ENV_SERVER_ONLY) {
            Some(raw) => parse_bool(ENV_SERVER_ONLY, &raw)?,
            None => defaults.server_only,
        };
        let log_format = match value(ENV_LOG_FORMAT) {
            Some(raw) => parse_log_format(ENV_LOG_FORMAT, &raw)?,
            None => defaults.log_format,
        };

        Ok(Config {
            key_id: ENV_KEY_ID.iter().find_map(|name| value(name)),
            server_addr: value(ENV_SERVER_ADDR).unwrap_or(defaults.server_addr),
            command: value(ENV_COMMAND).unwrap_or(defaults.command),
            server_only,
            kms_endpoint: value(ENV_KMS_ENDPOINT),
            log_format,
        })
    }

    /// Resolves only the wrapped command, ignoring every other variable.
    ///
    /// `--version` uses this so a malformed unrelated setting cannot hide the
    /// version output.
    pub fn command_from_lookup<F>(lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(ENV_COMMAND)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_COMMAND.to_string())
    }

    /// Returns the configured key id or [`ShimError::MissingKeyId`].
    pub fn require_key_id(&self) -> Result<&str, ShimError> {
        self.key_id
            .as_deref()
            .filter(|key_id| !key_id.trim().is_empty())
            .ok_or(ShimError::MissingKeyId)
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: raw.to_string(),
        }),
    }
}

fn parse_log_format(name: &'static str, raw: &str) -> Result<LogFormat, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        _ => Err(ConfigError::InvalidLogFormat {
            name,
            value: raw.to_string(),
        }),
    }
}
