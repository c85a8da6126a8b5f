//! Build steps that run before publishing: invoking the project build script
//! per variant, pointing the build at the bucket URL, and zipping the mobile
//! output.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

pub const ALL_BUILDS: &str = "all";
pub const LOCAL_SETTINGS_FILE: &str = "localbuildsettings.json";
pub const MOBILE_VARIANT: &str = "mobile";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown build {name}, expected one of: {available}")]
    UnknownBuild { name: String, available: String },
    #[error("no build requested and no default build configured")]
    NoBuild,
    #[error("`{command}` failed: {status}")]
    CommandFailed { command: String, status: String },
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode build settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Turn the requested build names into the list to run.
///
/// Nothing requested means the default build; `all` anywhere in the request
/// means every available build.
pub fn resolve_builds(
    requested: &[String],
    available: &[String],
    default: Option<&str>,
) -> Result<Vec<String>, BuildError> {
    if requested.is_empty() {
        return default
            .map(|d| vec![d.to_string()])
            .ok_or(BuildError::NoBuild);
    }
    if requested.iter().any(|r| r == ALL_BUILDS) {
        return Ok(available.to_vec());
    }
    for name in requested {
        if !available.contains(name) {
            return Err(BuildError::UnknownBuild {
                name: name.clone(),
                available: available.join(", "),
            });
        }
    }
    Ok(requested.to_vec())
}

/// Run `<script> <name>` from `project_dir`.
pub fn run_build(script: &Path, name: &str, project_dir: &Path) -> Result<(), BuildError> {
    let command = format!("{} {}", script.display(), name);
    info!(build = name, command = %command, "Running build");
    run(Command::new(script).arg(name).current_dir(project_dir), command)
}

/// Per-variant URL overrides read by the build script.
#[derive(Debug, Serialize)]
struct VariantUrls {
    #[serde(rename = "resourceUrlBase")]
    resource_url_base: String,
    #[serde(rename = "distUrlBase")]
    dist_url_base: String,
}

/// Write `localbuildsettings.json` so each variant resolves its resources
/// under `<build_url>/<variant>`.
pub fn write_local_settings<S: AsRef<str>>(
    project_dir: &Path,
    build_url: &str,
    variants: &[S],
) -> Result<PathBuf, BuildError> {
    let build_url = build_url.trim_end_matches('/');
    let settings: BTreeMap<&str, VariantUrls> = variants
        .iter()
        .map(|variant| {
            let url = format!("{build_url}/{}", variant.as_ref());
            (
                variant.as_ref(),
                VariantUrls {
                    resource_url_base: url.clone(),
                    dist_url_base: url,
                },
            )
        })
        .collect();

    let path = project_dir.join(LOCAL_SETTINGS_FILE);
    let json = serde_json::to_string_pretty(&settings)?;
    fs::write(&path, json).map_err(|source| BuildError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), build_url, "Wrote local build settings");
    Ok(path)
}

/// Public URL of a bucket when no explicit build URL is given.
pub fn default_build_url(bucket: &str) -> String {
    format!("http://s3.amazonaws.com/{bucket}")
}

/// Zip `build_dir/mobile` into `build_dir/mobile/mobile.zip`, replacing any
/// archive left by a previous run.
pub fn archive_mobile(build_dir: &Path) -> Result<PathBuf, BuildError> {
    let target = build_dir.join(MOBILE_VARIANT).join("mobile.zip");
    let staging = build_dir.join("mobile.zip");
    for stale in [&target, &staging] {
        if stale.exists() {
            fs::remove_file(stale).map_err(|source| BuildError::Io {
                path: stale.clone(),
                source,
            })?;
            debug!(path = %stale.display(), "Removed stale archive");
        }
    }

    run(
        Command::new("zip")
            .args(["-r", "mobile.zip", MOBILE_VARIANT])
            .current_dir(build_dir),
        "zip -r mobile.zip mobile".to_string(),
    )?;

    fs::rename(&staging, &target).map_err(|source| BuildError::Io {
        path: staging.clone(),
        source,
    })?;
    info!(path = %target.display(), "Archived mobile build");
    Ok(target)
}

fn run(command: &mut Command, command_line: String) -> Result<(), BuildError> {
    match command.status() {
        Ok(status) if status.success() => {
            debug!(command = %command_line, "Command succeeded");
            Ok(())
        }
        Ok(status) => {
            error!(command = %command_line, %status, "Command exited with failure");
            Err(BuildError::CommandFailed {
                command: command_line,
                status: status.to_string(),
            })
        }
        Err(source) => {
            error!(command = %command_line, error = ?source, "Failed to launch command");
            Err(BuildError::Launch {
                command: command_line,
                source,
            })
        }
    }
}
