//! # S3 object store
//!
//! Implements [`ObjectStore`] against the S3 REST API with path-style
//! addressing (`<endpoint>/<bucket>/<key>`) and SigV4-signed requests.
//!
//! - `get_object` issues `HEAD`; a 404 means the key is absent.
//! - `put_object` issues `PUT` with the body and its content headers.
//! - `make_public` issues `PUT ?acl` with the `public-read` canned ACL.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, StatusCode, Url};

use iitc_deploy_core::contract::{ObjectStore, PutObject, StoreError, StoredObject};

use crate::credentials::Credentials;
use crate::signing::{self, uri_encode, CanonicalRequest};

pub struct S3Client {
    http: reqwest::Client,
    endpoint: Url,
    region: String,
    credentials: Credentials,
}

/// Regional endpoint used when none is configured.
pub fn default_endpoint(region: &str) -> String {
    if region == "us-east-1" {
        "https://s3.amazonaws.com".to_string()
    } else {
        format!("https://s3.{region}.amazonaws.com")
    }
}

impl S3Client {
    pub fn new(credentials: Credentials, region: &str, endpoint: Option<&str>) -> Result<Self> {
        let endpoint = endpoint
            .map(str::to_string)
            .unwrap_or_else(|| default_endpoint(region));
        let endpoint = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|e| anyhow!("Invalid S3 endpoint {endpoint}: {e}"))?;
        if endpoint.host_str().is_none() {
            return Err(anyhow!("S3 endpoint {endpoint} has no host"));
        }
        tracing::info!(endpoint = %endpoint, region, "Initialised S3 client");
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            region: region.to_string(),
            credentials,
        })
    }

    /// Canonical (encoded) path of an object.
    pub fn object_path(&self, bucket: &str, key: &str) -> String {
        let prefix = self.endpoint.path().trim_end_matches('/');
        format!(
            "{prefix}/{}/{}",
            uri_encode(bucket, false),
            uri_encode(key.trim_start_matches('/'), true)
        )
    }

    /// Full request URL of an object, with an optional raw query.
    pub fn object_url(&self, bucket: &str, key: &str, query: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(&self.object_path(bucket, key));
        url.set_query(query);
        url
    }

    fn host(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    async fn send(
        &self,
        method: Method,
        bucket: &str,
        key: &str,
        query: Option<&str>,
        mut headers: BTreeMap<String, String>,
        body: Vec<u8>,
    ) -> Result<reqwest::Response, StoreError> {
        let url = self.object_url(bucket, key, query);
        let path = self.object_path(bucket, key);
        let query_string = query.map(canonical_query).unwrap_or_default();

        headers.insert("host".to_string(), self.host());
        signing::sign(
            &self.credentials,
            &self.region,
            &CanonicalRequest {
                method: method.as_str(),
                path: &path,
                query: &query_string,
                payload: &body,
            },
            &mut headers,
            Utc::now(),
        );

        let mut request = self.http.request(method.clone(), url);
        for (name, value) in headers {
            // reqwest derives Host from the URL.
            if name != "host" {
                request = request.header(name, value);
            }
        }
        let response = request.body(body).send().await?;
        tracing::debug!(%method, bucket, key, status = %response.status(), "S3 response");
        Ok(response)
    }
}

/// `acl` becomes `acl=`; pairs are sorted.
fn canonical_query(raw: &str) -> String {
    let mut pairs: Vec<(String, String)> = raw
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (uri_encode(k, false), uri_encode(v, false)),
            None => (uri_encode(pair, false), String::new()),
        })
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

async fn failure(response: reqwest::Response, action: &str, key: &str) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::error!(action, key, %status, body = %body, "S3 request failed");
    format!("{action} {key} failed with {status}: {body}").into()
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, StoreError> {
        let response = self
            .send(Method::HEAD, bucket, key, None, BTreeMap::new(), Vec::new())
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let headers = response.headers();
                let content_type = headers
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let size = headers
                    .get(reqwest::header::CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                Ok(Some(StoredObject {
                    key: key.to_string(),
                    content_type,
                    size,
                }))
            }
            _ => Err(failure(response, "HEAD", key).await),
        }
    }

    async fn put_object<'a>(&self, req: PutObject<'a>) -> Result<(), StoreError> {
        let mut headers = BTreeMap::new();
        if let Some(content_type) = req.content_type {
            headers.insert("content-type".to_string(), content_type.to_string());
        }
        if let Some(encoding) = req.content_encoding {
            headers.insert("content-encoding".to_string(), encoding.to_string());
        }
        let response = self
            .send(Method::PUT, req.bucket, req.key, None, headers, req.body.to_vec())
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(failure(response, "PUT", req.key).await)
        }
    }

    async fn make_public(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let mut headers = BTreeMap::new();
        headers.insert("x-amz-acl".to_string(), "public-read".to_string());
        let response = self
            .send(Method::PUT, bucket, key, Some("acl"), headers, Vec::new())
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(failure(response, "PUT ?acl", key).await)
        }
    }
}
