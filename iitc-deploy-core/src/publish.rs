//! Push a built tree and its index pages to a bucket.
//!
//! Every non-directory node becomes one object keyed by its full path; every
//! [`IndexDocument`] becomes one `text/html` object keyed by its filename.
//! For each key the publisher looks the object up, writes it (creating or
//! overwriting in place) and makes it public.
//!
//! # Error Handling
//! Store calls are retried up to `max_attempts`. Objects that still fail are
//! collected and reported together through [`PublishError::Incomplete`] once
//! every other object has been attempted. Local read failures are not retried.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::contract::{ObjectStore, PutObject, StoreError};
use crate::index::IndexDocument;
use crate::tree::PathTree;

pub const HTML_CONTENT_TYPE: &str = "text/html";

#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub bucket: String,
    /// Objects uploaded at the same time.
    pub concurrency: usize,
    /// Attempts per store call, first try included.
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl PublishOptions {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            concurrency: 4,
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadAction {
    /// The key did not exist before this run.
    Created,
    /// An existing object was replaced in place.
    Overwritten,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub key: String,
    pub action: UploadAction,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub key: String,
    pub attempts: u32,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct PublishReport {
    pub uploaded: Vec<UploadedObject>,
}

impl PublishReport {
    pub fn created(&self) -> impl Iterator<Item = &UploadedObject> {
        self.uploaded
            .iter()
            .filter(|o| o.action == UploadAction::Created)
    }

    pub fn overwritten(&self) -> impl Iterator<Item = &UploadedObject> {
        self.uploaded
            .iter()
            .filter(|o| o.action == UploadAction::Overwritten)
    }

    pub fn get(&self, key: &str) -> Option<&UploadedObject> {
        self.uploaded.iter().find(|o| o.key == key)
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(
        "{} of {} uploads failed:{}",
        .failures.len(),
        .failures.len() + .uploaded.len(),
        list_failures(.failures)
    )]
    Incomplete {
        uploaded: Vec<UploadedObject>,
        failures: Vec<UploadFailure>,
    },
}

/// ` key (error);` per failure.
fn list_failures(failures: &[UploadFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!(" {} ({});", failure.key, failure.error))
        .collect()
}

enum Body {
    File(PathBuf),
    Html(String),
}

struct UploadJob {
    key: String,
    body: Body,
    content_type: Option<String>,
    content_encoding: Option<String>,
}

/// Upload every file of `tree` (read from `base/<full path>`) and every
/// document to `options.bucket`.
pub async fn publish<S>(
    store: &S,
    base: &Path,
    tree: &PathTree,
    documents: &[IndexDocument],
    options: &PublishOptions,
) -> Result<PublishReport, PublishError>
where
    S: ObjectStore + ?Sized,
{
    let mut jobs: Vec<UploadJob> = tree
        .files()
        .map(|node| {
            let info = node.file_info().cloned().unwrap_or_default();
            UploadJob {
                key: node.full_path.clone(),
                body: Body::File(base.join(&node.full_path)),
                content_type: info.content_type,
                content_encoding: info.content_encoding,
            }
        })
        .collect();
    jobs.extend(documents.iter().map(|doc| UploadJob {
        key: doc.filename(),
        body: Body::Html(doc.render()),
        content_type: Some(HTML_CONTENT_TYPE.to_string()),
        content_encoding: None,
    }));

    info!(
        bucket = %options.bucket,
        objects = jobs.len(),
        concurrency = options.concurrency,
        "[PUBLISH] Starting upload"
    );

    let results: Vec<Result<UploadedObject, UploadFailure>> = stream::iter(jobs)
        .map(|job| upload_one(store, job, options))
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    let mut uploaded = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(object) => uploaded.push(object),
            Err(failure) => failures.push(failure),
        }
    }
    uploaded.sort_by(|a, b| a.key.cmp(&b.key));
    failures.sort_by(|a, b| a.key.cmp(&b.key));

    if !failures.is_empty() {
        error!(
            failed = failures.len(),
            uploaded = uploaded.len(),
            "[PUBLISH][ERROR] Upload incomplete"
        );
        return Err(PublishError::Incomplete { uploaded, failures });
    }

    info!(uploaded = uploaded.len(), "[PUBLISH] Upload complete");
    Ok(PublishReport { uploaded })
}

async fn upload_one<S>(
    store: &S,
    job: UploadJob,
    options: &PublishOptions,
) -> Result<UploadedObject, UploadFailure>
where
    S: ObjectStore + ?Sized,
{
    let UploadJob {
        key,
        body,
        content_type,
        content_encoding,
    } = job;
    let bucket = options.bucket.as_str();

    let body = match body {
        Body::Html(html) => html.into_bytes(),
        Body::File(path) => tokio::fs::read(&path).await.map_err(|e| {
            error!(path = %path.display(), error = ?e, "[PUBLISH][ERROR] Failed to read file");
            UploadFailure {
                key: key.clone(),
                attempts: 0,
                error: format!("read failure at {}: {e}", path.display()),
            }
        })?,
    };
    let put = PutObject {
        bucket,
        key: &key,
        body: &body,
        content_type: content_type.as_deref(),
        content_encoding: content_encoding.as_deref(),
    };

    let mut attempts = 0;
    let action = loop {
        attempts += 1;
        match store_one(store, put).await {
            Ok(action) => break action,
            Err(e) if attempts < options.max_attempts => {
                warn!(key = %key, attempt = attempts, error = %e, "[PUBLISH] Upload failed, retrying");
                tokio::time::sleep(options.retry_delay).await;
            }
            Err(e) => {
                error!(key = %key, attempts, error = %e, "[PUBLISH][ERROR] Upload failed");
                return Err(UploadFailure {
                    key,
                    attempts,
                    error: e.to_string(),
                });
            }
        }
    };

    debug!(key = %key, ?action, bytes = body.len(), "[PUBLISH] Uploaded");
    Ok(UploadedObject {
        bytes: body.len(),
        key,
        action,
    })
}

async fn store_one<S>(store: &S, req: PutObject<'_>) -> Result<UploadAction, StoreError>
where
    S: ObjectStore + ?Sized,
{
    let action = match store.get_object(req.bucket, req.key).await? {
        Some(_) => UploadAction::Overwritten,
        None => UploadAction::Created,
    };
    store.put_object(req).await?;
    store.make_public(req.bucket, req.key).await?;
    Ok(action)
}
