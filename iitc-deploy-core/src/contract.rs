#![allow(unused)]

//! # contract: object storage boundary
//!
//! The publisher only needs three calls from a bucket: look a key up, write
//! an object, and make it world readable. [`ObjectStore`] captures exactly
//! that so the S3 client in the CLI crate and `mockall` mocks in tests are
//! interchangeable.
//!
//! All methods are async and return the boxed [`StoreError`]; implementors
//! convert transport or API errors into it and attach the bucket/key.

use async_trait::async_trait;

use mockall::{automock, predicate::*};

/// Error type for [`ObjectStore`] calls.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// An object that already exists in the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub content_type: Option<String>,
    pub size: Option<u64>,
}

/// Everything needed to write one object.
#[derive(Debug, Clone, Copy)]
pub struct PutObject<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub body: &'a [u8],
    /// Sent as `Content-Type` when known.
    pub content_type: Option<&'a str>,
    /// Sent as `Content-Encoding` when the file name carried a compression suffix.
    pub content_encoding: Option<&'a str>,
}

/// Trait for reading and writing objects in a bucket.
///
/// Writing to an existing key replaces its content in place.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch object metadata, or `None` when the key does not exist.
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<StoredObject>, StoreError>;

    /// Create or overwrite an object.
    async fn put_object<'a>(&self, req: PutObject<'a>) -> Result<(), StoreError>;

    /// Grant public read access to an object.
    async fn make_public(&self, bucket: &str, key: &str) -> Result<(), StoreError>;
}
