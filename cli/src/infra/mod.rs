//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, package
//! management, git, filesystem access, and network probes.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod apt;
pub mod command_runner;
pub mod fs;
pub mod git;
pub mod logging;
pub mod network;
pub mod process;
