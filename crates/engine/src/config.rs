// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generation config (`wg.toml`).
//!
//! Every field has a default matching the stock deployment, so a missing
//! file and an empty file are equivalent. Relative paths are resolved
//! against the base directory passed to [`GenerationConfig::resolve`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wg_core::{Sentinel, StageLayout};

use crate::runner::{GeneratorCommand, RunnerLimits};

/// File name looked up in the base directory when no explicit path is given.
pub const CONFIG_FILE: &str = "wg.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_program() -> String {
    "python".to_string()
}

fn default_args() -> Vec<String> {
    vec!["-u".to_string(), "createWindFiles.py".to_string()]
}

fn default_working_dir() -> Option<PathBuf> {
    Some(PathBuf::from("utility"))
}

fn default_root() -> PathBuf {
    PathBuf::from("share/tg")
}

fn default_dataset() -> String {
    "rap".to_string()
}

fn default_transient_extension() -> String {
    "grib2".to_string()
}

fn default_timeout_secs() -> u64 {
    7200
}

fn default_kill_grace_ms() -> u64 {
    5000
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("log")
}

/// `[generator]`: the external program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSection {
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments before the staging directory
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default = "default_working_dir")]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            working_dir: default_working_dir(),
            env: BTreeMap::new(),
        }
    }
}

/// `[staging]`: where datasets live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagingSection {
    /// Parent of the live, staging and backup directories
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_dataset")]
    pub dataset: String,
    /// Files with this extension are removed from the top level after promotion
    #[serde(default = "default_transient_extension")]
    pub transient_extension: String,
}

impl Default for StagingSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            dataset: default_dataset(),
            transient_extension: default_transient_extension(),
        }
    }
}

/// `[job]`: completion detection and limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSection {
    #[serde(default)]
    pub sentinel: Sentinel,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,
    /// Promote only after the process exits successfully
    #[serde(default)]
    pub require_clean_exit: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for JobSection {
    fn default() -> Self {
        Self {
            sentinel: Sentinel::default(),
            timeout_secs: default_timeout_secs(),
            kill_grace_ms: default_kill_grace_ms(),
            require_clean_exit: false,
            log_dir: default_log_dir(),
        }
    }
}

/// Parsed `wg.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    #[serde(default)]
    pub generator: GeneratorSection,
    #[serde(default)]
    pub staging: StagingSection,
    #[serde(default)]
    pub job: JobSection,
}

impl GenerationConfig {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path: path.to_path_buf(), source }),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.program.trim().is_empty() {
            return Err(ConfigError::Invalid("generator.program must not be empty".into()));
        }
        let dataset = &self.staging.dataset;
        if dataset.is_empty() || dataset.contains('/') || dataset == "." || dataset == ".." {
            return Err(ConfigError::Invalid(format!(
                "staging.dataset must be a single directory name, got {:?}",
                dataset
            )));
        }
        if self.job.sentinel.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid("job.sentinel must not be empty".into()));
        }
        if self.job.timeout_secs == 0 {
            return Err(ConfigError::Invalid("job.timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Resolve relative paths against `home` and build runtime settings.
    pub fn resolve(&self, home: &Path) -> OrchestratorConfig {
        let under_home = |p: &Path| if p.is_absolute() { p.to_path_buf() } else { home.join(p) };

        let mut command = GeneratorCommand::new(&self.generator.program)
            .args(self.generator.args.iter().cloned());
        if let Some(dir) = &self.generator.working_dir {
            command = command.working_dir(under_home(dir));
        }
        for (key, value) in &self.generator.env {
            command = command.env(key, value);
        }

        OrchestratorConfig {
            command,
            layout: StageLayout::new(under_home(&self.staging.root), &self.staging.dataset),
            transient_extension: self.staging.transient_extension.clone(),
            sentinel: self.job.sentinel.clone(),
            limits: RunnerLimits {
                timeout: Duration::from_secs(self.job.timeout_secs),
                kill_grace: Duration::from_millis(self.job.kill_grace_ms),
            },
            require_clean_exit: self.job.require_clean_exit,
            log_dir: under_home(&self.job.log_dir),
        }
    }
}

/// Fully resolved settings the orchestrator runs with.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub command: GeneratorCommand,
    pub layout: StageLayout,
    pub transient_extension: String,
    pub sentinel: Sentinel,
    pub limits: RunnerLimits,
    pub require_clean_exit: bool,
    pub log_dir: PathBuf,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
