//! Application services — use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports` — never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod config_writer;
pub mod dependencies;
pub mod environment_check;
pub mod health_probe;
pub mod install;
pub mod packages;
pub mod repository;
pub mod runtime_env;
pub mod supervisor;
