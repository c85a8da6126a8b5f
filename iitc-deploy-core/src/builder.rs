//! Populate a [`PathTree`] from build output directories on disk.

use std::path::{Component, Path};

use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::meta::ScriptMeta;
use crate::tree::{NodeSeed, PathTree, SeedClass, TreeError};

/// Variant directories walked when none are configured: desktop then mobile.
pub const DEFAULT_VARIANTS: &[&str] = &["local", "mobile"];

/// Walk each variant directory below `base` and mirror it into one tree.
///
/// Node paths are relative to `base`, so `base/local/plugins/foo.user.js`
/// becomes `local/plugins/foo.user.js`. Variants are inserted in the order
/// given, which is the order index pages list them in.
pub fn build_tree<S: AsRef<str>>(base: &Path, variants: &[S]) -> Result<PathTree, TreeError> {
    let mut tree = PathTree::new();

    for variant in variants {
        let variant = variant.as_ref();
        let variant_dir = base.join(variant);
        info!(variant, path = %variant_dir.display(), "Walking build variant");

        if !variant_dir.is_dir() {
            error!(path = %variant_dir.display(), "Build variant directory is missing");
            return Err(TreeError::Read {
                path: variant_dir.display().to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "build variant directory not found",
                ),
            });
        }

        for entry in WalkDir::new(&variant_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .unwrap_or(variant_dir.as_path())
                    .display()
                    .to_string();
                error!(path = %path, error = %e, "Failed to walk build directory");
                TreeError::Walk { path, source: e }
            })?;

            let Some(relative) = relative_key(base, entry.path()) else {
                continue;
            };
            let name = entry.file_name().to_string_lossy();
            // Symlinked directories are not descended into, but stay directories.
            let is_dir = entry.file_type().is_dir() || entry.path().is_dir();
            let seed = match SeedClass::classify(&name, is_dir) {
                SeedClass::Directory => NodeSeed::Directory,
                SeedClass::File => NodeSeed::File,
                SeedClass::Script => NodeSeed::Script,
                SeedClass::ScriptMeta => NodeSeed::ScriptMeta(read_meta(entry.path())?),
            };
            tree.insert(&relative, seed)?;
        }
    }

    info!(nodes = tree.len(), "Build tree complete");
    Ok(tree)
}

fn read_meta(path: &Path) -> Result<ScriptMeta, TreeError> {
    let bytes = std::fs::read(path).map_err(|e| {
        error!(path = %path.display(), error = ?e, "Failed to read metadata file");
        TreeError::Read {
            path: path.display().to_string(),
            source: e,
        }
    })?;
    let meta = ScriptMeta::parse(&String::from_utf8_lossy(&bytes));
    debug!(path = %path.display(), ?meta, "Parsed script metadata");
    Ok(meta)
}

/// Slash-joined path of `path` relative to `base`.
fn relative_key(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}
