//! Publication of aggregated artifacts to a Maven repository.
//!
//! Each module is published as one logical unit: its main artifact, its
//! sources bundle when present, a generated POM, and SHA-256/SHA-512
//! checksums of each. The repository offers no multi-file transaction, so a
//! failure part-way through deletes everything this publication already
//! uploaded before the module is reported as failed.
//!
//! Failures are isolated per module. [`Publisher::publish_all`] always
//! visits every module and returns one [`PublishOutcome`] each.
//!
//! - [`channel`] - snapshot/release selection (`RepositoryChannel`).
//! - [`coordinates`] - group id composition and Maven paths.
//! - [`credentials`] - per-channel credentials from the environment.
//! - [`pom`] - minimal POM rendering.
//! - [`retry`] - bounded retry with exponential backoff.
//! - [`transport`] - HTTP transport trait and `ureq` implementation.

pub mod channel;
pub mod coordinates;
pub mod credentials;
pub mod pom;
pub mod retry;
pub mod transport;

use crate::aggregator::{AggregationReport, ModuleAggregation};
use crate::artifact::Artifact;
use crate::config::OrchestratorConfig;
use crate::module_name::ModuleName;
use crate::registry::ModuleDescriptor;
use camino::Utf8PathBuf;
use channel::RepositoryChannel;
use coordinates::Coordinates;
use credentials::Credentials;
use log::{info, warn};
use retry::RetryPolicy;
use serde::Serialize;
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;
use transport::{RepositoryTransport, TransportError};

/// Errors confined to a single module's publication.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The channel has no endpoint or its credentials are not available.
    #[error("missing credentials for {channel} channel: {detail}")]
    MissingCredentials {
        /// The channel selected for the version.
        channel: RepositoryChannel,
        /// What is missing.
        detail: String,
    },

    /// The module was never aggregated.
    #[error("no aggregation result for {module}")]
    MissingArtifact {
        /// The module.
        module: ModuleName,
    },

    /// An artifact file could not be read.
    #[error("failed to read {path}")]
    ArtifactRead {
        /// The unreadable file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An upload failed; files already uploaded were deleted again.
    #[error("publication of {module} failed and was rolled back: {source}")]
    PartialPublish {
        /// The module.
        module: ModuleName,
        /// The request that failed.
        #[source]
        source: TransportError,
        /// Uploaded files that could not be deleted.
        rollback_failures: Vec<String>,
    },
}

/// Final state of one module's publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    /// Every file was uploaded.
    Published,
    /// Dry run: files were planned but not uploaded.
    Planned,
    /// The module produced no artifact, so there was nothing to publish.
    Skipped,
    /// The publication failed and nothing of it remains remotely.
    Failed,
}

/// The record and result of publishing one module.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    /// The module.
    pub module: ModuleName,
    /// Group id, artifact id, and version submitted.
    pub coordinates: Coordinates,
    /// The channel selected from the version.
    pub channel: RepositoryChannel,
    /// The channel's repository URL, when configured.
    pub endpoint: Option<String>,
    /// What happened.
    pub status: PublishStatus,
    /// URLs uploaded, or planned for a dry run.
    pub files: Vec<String>,
    /// Non-fatal notes.
    pub warnings: Vec<String>,
    /// The failure, rendered, when `status` is [`PublishStatus::Failed`].
    pub error: Option<String>,
}

impl PublishOutcome {
    /// Whether the module failed to publish.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status == PublishStatus::Failed
    }
}

/// One file of a publication.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Upload {
    url: String,
    body: Vec<u8>,
}

/// Publishes modules to the channel selected by their version.
pub struct Publisher<'a> {
    config: &'a OrchestratorConfig,
    transport: &'a dyn RepositoryTransport,
    retry: RetryPolicy,
    dry_run: bool,
}

impl<'a> Publisher<'a> {
    /// Create a publisher using the configured retry policy.
    #[must_use]
    pub fn new(config: &'a OrchestratorConfig, transport: &'a dyn RepositoryTransport) -> Self {
        Self {
            config,
            transport,
            retry: RetryPolicy::from_settings(&config.publish),
            dry_run: false,
        }
    }

    /// Plan publications without network I/O or credential checks.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Publish every module in registry order.
    ///
    /// Never stops early: each module's failure is recorded in its outcome.
    #[must_use]
    pub fn publish_all(&self, report: &AggregationReport) -> Vec<PublishOutcome> {
        self.config
            .registry
            .iter()
            .map(|module| self.publish(module, report.module(module.name().as_str())))
            .collect()
    }

    /// Publish one module's aggregated artifacts.
    #[must_use]
    pub fn publish(
        &self,
        module: &ModuleDescriptor,
        aggregation: Option<&ModuleAggregation>,
    ) -> PublishOutcome {
        let version = self.config.module_version(module).clone();
        let channel = RepositoryChannel::for_version(&version);
        let coordinates = Coordinates::new(
            &self.config.project.namespace,
            module.namespace(),
            module.name(),
            version,
        );
        let settings = channel.settings(&self.config.publish);
        let mut outcome = PublishOutcome {
            module: module.name().clone(),
            coordinates,
            channel,
            endpoint: settings.map(|s| s.url.clone()),
            status: PublishStatus::Failed,
            files: Vec::new(),
            warnings: Vec::new(),
            error: None,
        };

        match self.try_publish(module, aggregation, &mut outcome) {
            Ok(status) => outcome.status = status,
            Err(err) => {
                warn!("publish {}: {err}", module.name());
                outcome.files.clear();
                outcome.error = Some(err.to_string());
            }
        }
        outcome
    }

    fn try_publish(
        &self,
        module: &ModuleDescriptor,
        aggregation: Option<&ModuleAggregation>,
        outcome: &mut PublishOutcome,
    ) -> Result<PublishStatus, PublishError> {
        let aggregation = aggregation.ok_or_else(|| PublishError::MissingArtifact {
            module: module.name().clone(),
        })?;
        let Some(main) = aggregation.main.as_ref() else {
            info!("publish {}: no artifact produced, skipped", module.name());
            outcome
                .warnings
                .push("module produced no artifact; nothing to publish".to_owned());
            return Ok(PublishStatus::Skipped);
        };
        let sources = aggregation.sources.as_ref();
        if sources.is_none() {
            outcome
                .warnings
                .push("no sources bundle found; publishing without sources".to_owned());
        }

        let base_url = match (&outcome.endpoint, self.dry_run) {
            (Some(url), _) => url.clone(),
            (None, true) => {
                outcome
                    .warnings
                    .push(format!("no {} repository configured", outcome.channel));
                String::new()
            }
            (None, false) => {
                return Err(PublishError::MissingCredentials {
                    channel: outcome.channel,
                    detail: format!("no [publish.{}] repository configured", outcome.channel),
                });
            }
        };

        let uploads = plan_uploads(&outcome.coordinates, &base_url, main, sources)?;
        outcome.files = uploads.iter().map(|u| u.url.clone()).collect();

        if self.dry_run {
            info!(
                "publish {} (dry run): {} to {} channel, {} file(s)",
                module.name(),
                outcome.coordinates,
                outcome.channel,
                uploads.len()
            );
            return Ok(PublishStatus::Planned);
        }

        let credentials = outcome
            .channel
            .settings(&self.config.publish)
            .ok_or_else(|| PublishError::MissingCredentials {
                channel: outcome.channel,
                detail: "channel not configured".to_owned(),
            })
            .and_then(|settings| Credentials::from_env(outcome.channel, settings))?;

        self.upload_atomically(module.name(), &uploads, &credentials)?;
        info!(
            "published {} to {} ({})",
            outcome.coordinates, outcome.channel, base_url
        );
        Ok(PublishStatus::Published)
    }

    fn upload_atomically(
        &self,
        module: &ModuleName,
        uploads: &[Upload],
        credentials: &Credentials,
    ) -> Result<(), PublishError> {
        for (index, upload) in uploads.iter().enumerate() {
            let result = self.retry.run(&format!("upload {}", upload.url), || {
                self.transport.put(&upload.url, &upload.body, credentials)
            });
            if let Err(source) = result {
                // A timed-out PUT may still have been stored remotely.
                let attempted = if source.is_retryable() { index + 1 } else { index };
                let rollback_failures = self.roll_back(&uploads[..attempted], credentials);
                return Err(PublishError::PartialPublish {
                    module: module.clone(),
                    source,
                    rollback_failures,
                });
            }
        }
        Ok(())
    }

    /// Delete already-uploaded files, newest first. Returns the URLs that
    /// could not be deleted.
    fn roll_back(&self, uploaded: &[Upload], credentials: &Credentials) -> Vec<String> {
        let mut failures = Vec::new();
        for upload in uploaded.iter().rev() {
            let result = self.retry.run(&format!("delete {}", upload.url), || {
                self.transport.delete(&upload.url, credentials)
            });
            if let Err(err) = result {
                warn!("rollback: {err}");
                failures.push(upload.url.clone());
            }
        }
        failures
    }
}

fn plan_uploads(
    coordinates: &Coordinates,
    base_url: &str,
    main: &Artifact,
    sources: Option<&Artifact>,
) -> Result<Vec<Upload>, PublishError> {
    let mut files = vec![(coordinates.file_name(None, "jar"), read_artifact(main)?)];
    if let Some(sources) = sources {
        files.push((
            coordinates.file_name(Some("sources"), "jar"),
            read_artifact(sources)?,
        ));
    }
    files.push((
        coordinates.file_name(None, "pom"),
        pom::render_pom(coordinates).into_bytes(),
    ));

    let mut uploads = Vec::with_capacity(files.len() * 3);
    for (name, body) in files {
        let sha256 = format!("{:x}", Sha256::digest(&body));
        let sha512 = format!("{:x}", Sha512::digest(&body));
        uploads.push(Upload {
            url: coordinates.url(base_url, &name),
            body,
        });
        uploads.push(Upload {
            url: coordinates.url(base_url, &format!("{name}.sha256")),
            body: sha256.into_bytes(),
        });
        uploads.push(Upload {
            url: coordinates.url(base_url, &format!("{name}.sha512")),
            body: sha512.into_bytes(),
        });
    }
    Ok(uploads)
}

fn read_artifact(artifact: &Artifact) -> Result<Vec<u8>, PublishError> {
    std::fs::read(&artifact.source).map_err(|source| PublishError::ArtifactRead {
        path: artifact.source.clone(),
        source,
    })
}
