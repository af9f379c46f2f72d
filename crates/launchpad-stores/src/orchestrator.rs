//! Deploy orchestration
//!
//! Every enabled destination for a platform is attempted. Uploads run
//! concurrently and each outcome is recorded independently: an error, a
//! timeout or a panic in one client becomes a failed [`DeployResult`] for that
//! destination only.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use launchpad_core::{Config, Platform};

use crate::apple::{AppStoreClient, TestFlightClient};
use crate::client::{DestinationClient, UploadRequest, UploadResponse};
use crate::error::{Result, StoreError};
use crate::google::{FirebaseClient, PlayConsoleClient};
use crate::result::{DeployResult, Destination, DeploymentResults};

/// Fans an artifact out to a platform's enabled destinations
pub struct DeployOrchestrator {
    clients: HashMap<Destination, Arc<dyn DestinationClient>>,
    timeout: Option<Duration>,
}

impl DeployOrchestrator {
    /// Create an orchestrator with explicit clients
    pub fn new(clients: HashMap<Destination, Arc<dyn DestinationClient>>) -> Self {
        Self {
            clients,
            timeout: None,
        }
    }

    /// Build the real clients for a platform from config
    pub fn for_platform(platform: Platform, config: &Config, base_dir: &Path) -> Self {
        let orchestrator = Self::new(clients_from_config(platform, config, base_dir));
        match config.deploy.timeout_secs {
            0 => orchestrator,
            secs => orchestrator.with_timeout(Duration::from_secs(secs)),
        }
    }

    /// Outer bound on each destination's upload
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Deploy `artifact` to every destination enabled for `platform`
    #[instrument(skip(self, config, request), fields(platform = %platform, artifact = %artifact.display()))]
    pub async fn deploy(
        &self,
        platform: Platform,
        artifact: &Path,
        config: &Config,
        request: &UploadRequest,
    ) -> DeploymentResults {
        let mut results = DeploymentResults::new(platform);
        let destinations = Destination::enabled_for(platform, &config.deploy);

        if destinations.is_empty() {
            info!("no destinations enabled");
            return results;
        }

        if !artifact.is_file() {
            error!("artifact not found");
            for destination in destinations {
                results.push(DeployResult::failed(
                    destination,
                    format!("artifact not found: {}", artifact.display()),
                ));
            }
            return results;
        }

        let mut handles = Vec::with_capacity(destinations.len());
        for destination in destinations {
            let Some(client) = self.clients.get(&destination).cloned() else {
                handles.push((destination, None));
                continue;
            };

            let artifact = artifact.to_path_buf();
            let request = request.clone();
            let timeout = self.timeout;
            let handle = tokio::spawn(async move {
                let started = Instant::now();
                let outcome = upload_with_timeout(client.as_ref(), &artifact, &request, timeout).await;
                (outcome, started.elapsed().as_millis() as u64)
            });
            handles.push((destination, Some(handle)));
        }

        for (destination, handle) in handles {
            let result = match handle {
                None => DeployResult::failed(
                    destination,
                    format!("no client configured for {}", destination.display_name()),
                ),
                Some(handle) => match handle.await {
                    Ok((Ok(response), elapsed)) => {
                        to_deploy_result(destination, response).with_duration(elapsed)
                    }
                    Ok((Err(e), elapsed)) => {
                        DeployResult::failed(destination, e.to_string()).with_duration(elapsed)
                    }
                    Err(e) => DeployResult::failed(destination, format!("upload task failed: {}", e)),
                },
            };

            if result.success {
                info!(destination = %destination, build_id = ?result.build_id, "deployed");
            } else {
                warn!(destination = %destination, error = ?result.error, "deploy failed");
            }
            results.push(result);
        }

        results
    }
}

async fn upload_with_timeout(
    client: &dyn DestinationClient,
    artifact: &Path,
    request: &UploadRequest,
    timeout: Option<Duration>,
) -> Result<UploadResponse> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, client.upload(artifact, request))
            .await
            .map_err(|_| StoreError::Timeout(format!("no response after {}s", limit.as_secs())))?,
        None => client.upload(artifact, request).await,
    }
}

fn to_deploy_result(destination: Destination, response: UploadResponse) -> DeployResult {
    let result = if response.success {
        DeployResult::succeeded(destination, response.message)
    } else {
        let mut failed = DeployResult::failed(
            destination,
            response.error.unwrap_or_else(|| "rejected".to_string()),
        );
        if !response.message.is_empty() {
            failed.message = response.message;
        }
        failed
    };
    result
        .with_build_id(response.build_id)
        .with_build_url(response.build_url)
}

/// Stands in for a client whose construction failed, so the failure is
/// reported as that destination's result.
struct UnavailableClient {
    destination: Destination,
    reason: String,
}

#[async_trait]
impl DestinationClient for UnavailableClient {
    fn destination(&self) -> Destination {
        self.destination
    }

    async fn upload(&self, _artifact: &Path, _request: &UploadRequest) -> Result<UploadResponse> {
        Err(StoreError::ConfigurationError(self.reason.clone()))
    }
}

/// Construct the clients for every destination enabled for `platform`
pub fn clients_from_config(
    platform: Platform,
    config: &Config,
    base_dir: &Path,
) -> HashMap<Destination, Arc<dyn DestinationClient>> {
    let deploy = &config.deploy;
    let mut clients: HashMap<Destination, Arc<dyn DestinationClient>> = HashMap::new();

    for destination in Destination::enabled_for(platform, deploy) {
        let built: Result<Arc<dyn DestinationClient>> = match (platform, destination) {
            (Platform::Android, Destination::Firebase) => {
                FirebaseClient::new(&deploy.android.firebase, config, base_dir)
                    .map(|c| Arc::new(c) as Arc<dyn DestinationClient>)
            }
            (Platform::Ios, Destination::Firebase) => {
                FirebaseClient::new(&deploy.ios.firebase, config, base_dir)
                    .map(|c| Arc::new(c) as Arc<dyn DestinationClient>)
            }
            (_, Destination::PlayConsole) => {
                PlayConsoleClient::new(&deploy.android.play_console, config, base_dir)
                    .map(|c| Arc::new(c) as Arc<dyn DestinationClient>)
            }
            (_, Destination::TestFlight) => {
                TestFlightClient::new(&deploy.ios.testflight, config, base_dir)
                    .map(|c| Arc::new(c) as Arc<dyn DestinationClient>)
            }
            (_, Destination::AppStore) => AppStoreClient::new(&deploy.ios.app_store, config, base_dir)
                .map(|c| Arc::new(c) as Arc<dyn DestinationClient>),
        };

        let client = built.unwrap_or_else(|e| {
            warn!(destination = %destination, error = %e, "destination unavailable");
            Arc::new(UnavailableClient {
                destination,
                reason: e.to_string(),
            })
        });
        clients.insert(destination, client);
    }

    clients
}
