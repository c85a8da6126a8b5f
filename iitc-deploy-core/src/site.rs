//! End-to-end pipeline: walk the build output, build the index pages, then
//! publish or write them.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};

use crate::builder::build_tree;
use crate::contract::ObjectStore;
use crate::index::{build_index_documents, IndexError};
use crate::publish::{publish, PublishError, PublishOptions, PublishReport};
use crate::tree::TreeError;
use crate::workdir::ScopedWorkingDir;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("cannot enter build directory {path}: {source}")]
    BuildDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Publish the variants found in `build_dir` together with their index pages.
///
/// The working directory is switched to `build_dir` for the duration of the
/// walk and the upload, and restored afterwards on every path out.
pub async fn deploy_site<S, V>(
    store: &S,
    build_dir: &Path,
    variants: &[V],
    site_title: &str,
    options: &PublishOptions,
) -> Result<PublishReport, SiteError>
where
    S: ObjectStore + ?Sized,
    V: AsRef<str>,
{
    let _cwd = ScopedWorkingDir::enter(build_dir).map_err(|source| {
        error!(path = %build_dir.display(), error = ?source, "[DEPLOY][ERROR] Cannot enter build directory");
        SiteError::BuildDir {
            path: build_dir.to_path_buf(),
            source,
        }
    })?;

    let base = Path::new("");
    let tree = build_tree(base, variants)?;
    let documents = build_index_documents(&tree, site_title)?;
    info!(
        files = tree.files().count(),
        pages = documents.len(),
        bucket = %options.bucket,
        "[DEPLOY] Publishing build"
    );
    let report = publish(store, base, &tree, &documents, options).await?;
    Ok(report)
}

/// Write the index pages into `build_dir` for local preview.
pub fn render_site<V: AsRef<str>>(
    build_dir: &Path,
    variants: &[V],
    site_title: &str,
) -> Result<Vec<PathBuf>, SiteError> {
    let tree = build_tree(build_dir, variants)?;
    let documents = build_index_documents(&tree, site_title)?;

    let mut written = Vec::with_capacity(documents.len());
    for document in &documents {
        let path = build_dir.join(document.filename());
        std::fs::write(&path, document.render()).map_err(|source| SiteError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), title = document.title(), "[RENDER] Wrote index page");
        written.push(path);
    }
    Ok(written)
}
