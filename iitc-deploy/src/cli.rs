//! # iitc-deploy CLI
//!
//! Command parsing and orchestration. The domain work (tree building, index
//! pages, publishing, build steps) lives in `iitc-deploy-core`; this module
//! only maps flags and config onto those calls.
//!
//! - [`Cli`] / [`Commands`] define the user-facing surface.
//! - [`run`] is the async entry point shared by `main` and the tests.
use crate::credentials::Credentials;
use crate::load_config::{load_optional_config, CliConfig};
use crate::upload::S3Client;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use iitc_deploy_core::publish::PublishOptions;
use iitc_deploy_core::site::{deploy_site, render_site};
use iitc_deploy_core::variants::{
    archive_mobile, default_build_url, resolve_builds, run_build, write_local_settings,
    MOBILE_VARIANT,
};
use std::path::PathBuf;
use std::time::Duration;

/// Build IITC variants and publish them, with generated index pages, to S3.
#[derive(Parser, Debug)]
#[clap(
    name = "iitc-deploy",
    version,
    about = "Build IITC userscript variants and publish them with index pages to an S3 bucket"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the builds, then upload the build directory and its index pages
    Deploy {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Build to run; repeatable, `all` runs every available build
        #[clap(short = 'b', long = "build")]
        builds: Vec<String>,
        /// Skip the build step and upload what is already built
        #[clap(long)]
        no_builds: bool,
        /// Run the builds only
        #[clap(long)]
        no_upload: bool,
        /// Target bucket, overrides `upload.bucket`
        #[clap(long)]
        s3_bucket: Option<String>,
        /// boto-style credentials file, overrides `upload.credentials_file`
        #[clap(long)]
        aws_credentials_file: Option<PathBuf>,
        /// Base URL the built scripts are served from; defaults to the bucket URL
        #[clap(long)]
        build_url: Option<String>,
    },
    /// Write the index pages into the build directory for a local preview
    Render {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Build directory, overrides `build.build_dir`
        #[clap(long)]
        build_dir: Option<PathBuf>,
    },
}

/// Async CLI entry point for `main()` and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Deploy {
            config,
            builds,
            no_builds,
            no_upload,
            s3_bucket,
            aws_credentials_file,
            build_url,
        } => {
            let config = load_optional_config(config.as_deref())?;
            let bucket = s3_bucket.or_else(|| config.upload.bucket.clone());

            if no_builds {
                tracing::info!(command = "deploy", "Skipping builds");
            } else {
                let build_url = build_url.or_else(|| bucket.as_deref().map(default_build_url));
                run_builds(&config, &builds, build_url.as_deref())?;
            }

            if no_upload {
                tracing::info!(command = "deploy", "Skipping upload");
                return Ok(());
            }

            let bucket = bucket.ok_or_else(|| {
                anyhow!("No S3 bucket configured; pass --s3-bucket or set upload.bucket")
            })?;
            let credentials_file =
                aws_credentials_file.or_else(|| config.upload.credentials_file.clone());
            let credentials = Credentials::resolve(credentials_file.as_deref())?;
            let client = S3Client::new(
                credentials,
                &config.upload.region,
                config.upload.endpoint.as_deref(),
            )?;

            let options = PublishOptions {
                bucket,
                concurrency: config.upload.concurrency,
                max_attempts: config.upload.max_attempts,
                retry_delay: Duration::from_millis(config.upload.retry_delay_ms),
            };
            match deploy_site(
                &client,
                &config.build.build_dir,
                &config.build.variants,
                &config.site.title,
                &options,
            )
            .await
            {
                Ok(report) => {
                    tracing::info!(
                        command = "deploy",
                        bucket = %options.bucket,
                        created = report.created().count(),
                        overwritten = report.overwritten().count(),
                        "Deploy complete"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "deploy", error = %e, "Deploy failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Render { config, build_dir } => {
            let config = load_optional_config(config.as_deref())?;
            let build_dir = build_dir.unwrap_or_else(|| config.build.build_dir.clone());
            let written = render_site(&build_dir, &config.build.variants, &config.site.title)
                .with_context(|| format!("Rendering index pages in {}", build_dir.display()))?;
            tracing::info!(command = "render", pages = written.len(), "Render complete");
            Ok(())
        }
    }
}

fn run_builds(config: &CliConfig, requested: &[String], build_url: Option<&str>) -> Result<()> {
    let build = &config.build;
    let names = resolve_builds(requested, &build.available, build.default.as_deref())?;

    match build_url {
        Some(url) => {
            write_local_settings(&build.project_dir, url, &build.variants)?;
        }
        None => tracing::warn!("No build URL or bucket given, leaving local build settings untouched"),
    }

    for name in &names {
        run_build(&build.script, name, &build.project_dir)?;
    }

    if names.iter().any(|n| n == MOBILE_VARIANT) {
        archive_mobile(&build.build_dir)?;
    }
    tracing::info!(builds = ?names, "Builds complete");
    Ok(())
}
