//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod config_file;
pub mod error;
pub mod prerequisites;
pub mod service;

pub use config::{EnvMap, RuntimeConfig, SecretBundle, resolve};
pub use error::{
    ConfigError, EnvironmentError, ProvisionError, SecretProblem, SecretsError, ServiceError,
};
pub use prerequisites::OsFamily;
pub use service::{
    LaunchCommand, ProbePolicy, ServiceHandle, ServiceState, Signal, StopOutcome, SupervisorTimings,
};
