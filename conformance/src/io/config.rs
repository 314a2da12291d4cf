//! Harness configuration (`conformance.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::model::ImplementationInfo;
use crate::core::report::Maintainer;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_PATH: &str = "conformance.toml";

/// Harness configuration (TOML).
///
/// Every field is optional in the file; CLI flags take precedence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Vector document to execute.
    pub vectors: PathBuf,

    /// Where the conformance report is written.
    pub report: PathBuf,

    /// Wall-clock budget for one vector against an out-of-process model.
    pub vector_timeout_secs: u64,

    /// Overrides for what the implementation reports about itself.
    pub implementation: ImplementationOverrides,

    /// Certification contact; enables certification metadata in the report.
    pub maintainer: Option<Maintainer>,

    /// `YYYY-MM-DD`; defaults to today when a maintainer is set.
    pub certification_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImplementationOverrides {
    pub name: Option<String>,
    pub version: Option<String>,
    pub language: Option<String>,
    pub license: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            vectors: PathBuf::from("test-vectors/test-vectors.json"),
            report: PathBuf::from("conformance-report.json"),
            vector_timeout_secs: 30,
            implementation: ImplementationOverrides::default(),
            maintainer: None,
            certification_date: None,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.vectors.as_os_str().is_empty() {
            return Err(anyhow!("vectors must be a non-empty path"));
        }
        if self.report.as_os_str().is_empty() {
            return Err(anyhow!("report must be a non-empty path"));
        }
        if self.vector_timeout_secs == 0 {
            return Err(anyhow!("vector_timeout_secs must be > 0"));
        }
        if let Some(maintainer) = &self.maintainer
            && (maintainer.name.trim().is_empty() || maintainer.email.trim().is_empty())
        {
            return Err(anyhow!("maintainer.name and maintainer.email must be non-empty"));
        }
        if let Some(date) = &self.certification_date {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("certification_date '{date}' must be YYYY-MM-DD"))?;
        }
        Ok(())
    }
}

impl ImplementationOverrides {
    pub fn apply(&self, mut info: ImplementationInfo) -> ImplementationInfo {
        if let Some(name) = &self.name {
            info.name = name.clone();
        }
        if let Some(version) = &self.version {
            info.version = version.clone();
        }
        if let Some(language) = &self.language {
            info.language = language.clone();
        }
        if let Some(license) = &self.license {
            info.license = Some(license.clone());
        }
        info
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `HarnessConfig::default()`.
pub fn load_config(path: &Path) -> Result<HarnessConfig> {
    if !path.exists() {
        let cfg = HarnessConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: HarnessConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
