//! Launchpad Stores - distribution destinations
//!
//! Each destination (Firebase App Distribution, Play Console, TestFlight and
//! the App Store) is a [`DestinationClient`]. The [`DeployOrchestrator`]
//! uploads one platform's artifact to all of its enabled destinations and
//! collects the outcomes in [`DeploymentResults`].
//!
//! ## Usage
//!
//! ```ignore
//! use launchpad_stores::{DeployOrchestrator, UploadRequest};
//!
//! let orchestrator = DeployOrchestrator::for_platform(Platform::Android, &config, &base_dir);
//! let results = orchestrator
//!     .deploy(Platform::Android, &artifact, &config, &UploadRequest::new())
//!     .await;
//! println!("{}", results.message());
//! ```

pub mod apple;
pub mod client;
pub mod error;
pub mod google;
pub mod notify;
pub mod orchestrator;
pub mod result;

pub use client::{DestinationClient, UploadRequest, UploadResponse};
pub use error::{Result, StoreError};
pub use notify::{deploy_summary, WebhookNotifier};
pub use orchestrator::{clients_from_config, DeployOrchestrator};
pub use result::{DeployResult, DeploymentResults, Destination};
