//! Launchpad Signing - Android artifact signing
//!
//! Credentials are resolved and validated by [`resolve_signing`] before any
//! tool runs. The [`SigningOrchestrator`] picks an [`ArtifactSigner`] by file
//! extension: APKs go through `apksigner`, bundles through `jarsigner`.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod signer;
pub mod signers;
pub mod tools;

pub use config::{resolve_signing, SignatureSchemes, SigningConfig, SigningValidation};
pub use error::{Result, SigningError};
pub use orchestrator::SigningOrchestrator;
pub use signer::{ArtifactSigner, ArtifactType, SigningResult};
pub use signers::{AabSigner, ApkSigner};
