//! Core types for hwperf: configuration, errors, metric records, and the interfaces shared
//! with the pipeline tooling.

pub mod config;
pub mod error;
pub mod labels;
pub mod secret;
pub mod stage;
pub mod types;
pub mod vcs;

pub use config::{ExtractProfile, RemoteConfig, ReportConfig};
pub use error::{Error, Result};
pub use secret::{RemoteCredential, Secret};
pub use types::*;
pub use vcs::GitIdentity;
