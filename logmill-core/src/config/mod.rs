use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration, read from a TOML file. A missing file is not an
/// error: every section has a usable default, matching the behavior of
/// running with no config at all.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogmillConfig {
    pub log: LogConfig,
    pub database: DatabaseConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Extraction pattern with the eight named capture groups. Absent means
    /// the built-in Apache combined layout.
    pub pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logmill.db"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}

impl LogmillConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;

        tracing::info!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ingest.batch_size == 0 {
            anyhow::bail!("ingest.batch_size must be at least 1");
        }
        Ok(())
    }
}
