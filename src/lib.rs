//! Launcher for the jscpd-rs native copy/paste detector
//!
//! Resolves the host platform, downloads the matching `jscpd-rs` release
//! archive from GitHub into a per-user cache, and forwards invocations to
//! the cached executable, mirroring its output and exit code.

pub mod cli;
pub mod config;
pub mod error;
pub mod install;

pub use config::LauncherConfig;
pub use error::{LauncherError, Result};
pub use install::{BinaryManager, Exit, Invocation};
