//! AWS credentials from a boto-style INI file or the environment.
//!
//! The file format is the one boto reads:
//!
//! ```ini
//! [Credentials]
//! aws_access_key_id = AKIA...
//! aws_secret_access_key = ...
//! ```

use std::env;
use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    // The INI loader may lowercase section names.
    #[serde(alias = "Credentials")]
    credentials: CredentialsSection,
}

#[derive(Debug, Deserialize)]
struct CredentialsSection {
    aws_access_key_id: String,
    aws_secret_access_key: String,
    #[serde(default)]
    aws_session_token: Option<String>,
}

impl Credentials {
    pub fn from_file(path: &Path) -> Result<Self> {
        let parsed: CredentialsFile = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| {
                error!(path = %path.display(), error = %e, "Failed to read credentials file");
                anyhow!("Failed to read credentials file {}: {e}", path.display())
            })?;

        info!(path = %path.display(), "Loaded AWS credentials from file");
        Ok(Self {
            access_key_id: parsed.credentials.aws_access_key_id,
            secret_access_key: parsed.credentials.aws_secret_access_key,
            session_token: parsed.credentials.aws_session_token,
        })
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let access_key_id =
            env::var("AWS_ACCESS_KEY_ID").context("AWS_ACCESS_KEY_ID missing in environment")?;
        let secret_access_key = env::var("AWS_SECRET_ACCESS_KEY")
            .context("AWS_SECRET_ACCESS_KEY missing in environment")?;
        let session_token = env::var("AWS_SESSION_TOKEN").ok().filter(|t| !t.is_empty());
        info!(
            session = session_token.is_some(),
            "Loaded AWS credentials from environment"
        );
        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }

    /// The file when one is given, otherwise the environment.
    pub fn resolve(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }
}
