/// `load_config` module: reads the optional YAML deployment config.
///
/// Every section and key has a default, so an empty file (or no file at all)
/// yields a usable configuration. Command-line flags are applied on top of
/// the loaded values by the caller.
///
/// ```yaml
/// build:
///   script: ./build.py
///   project_dir: .
///   build_dir: build
///   variants: [local, mobile]
///   available: [local, mobile]
///   default: local
/// site:
///   title: IITC Dev Build
/// upload:
///   bucket: my-iitc-bucket
///   region: us-east-1
///   credentials_file: ~/.boto
///   concurrency: 4
///   max_attempts: 3
/// ```
use anyhow::Result;
use iitc_deploy_core::builder::DEFAULT_VARIANTS;
use iitc_deploy_core::index::DEFAULT_SITE_TITLE;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub build: BuildSection,
    pub site: SiteSection,
    pub upload: UploadSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Executable invoked as `<script> <build name>`.
    pub script: PathBuf,
    /// Working directory for the build script.
    pub project_dir: PathBuf,
    /// Directory holding one subdirectory per variant after a build.
    pub build_dir: PathBuf,
    /// Variants walked and published, in page order.
    pub variants: Vec<String>,
    /// Build names accepted by `-b`.
    pub available: Vec<String>,
    /// Build run when none is requested.
    pub default: Option<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        let defaults: Vec<String> = DEFAULT_VARIANTS.iter().map(|v| v.to_string()).collect();
        Self {
            script: PathBuf::from("./build.py"),
            project_dir: PathBuf::from("."),
            build_dir: PathBuf::from("build"),
            variants: defaults.clone(),
            available: defaults,
            default: Some("local".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    pub title: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: DEFAULT_SITE_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UploadSection {
    pub bucket: Option<String>,
    pub region: String,
    /// Overrides the regional S3 endpoint, e.g. for S3-compatible stores.
    pub endpoint: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub concurrency: usize,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for UploadSection {
    fn default() -> Self {
        Self {
            bucket: None,
            region: "us-east-1".to_string(),
            endpoint: None,
            credentials_file: None,
            concurrency: 4,
            max_attempts: 3,
            retry_delay_ms: 500,
        }
    }
}

/// Loads the YAML config file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // serde_yaml rejects an empty document for a struct, even a defaulted one.
    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file empty, using defaults");
        return Ok(CliConfig::default());
    }

    match serde_yaml::from_str::<CliConfig>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Loads `path` when given, otherwise returns the defaults.
pub fn load_optional_config(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            info!("No config file given, using defaults");
            Ok(CliConfig::default())
        }
    }
}
