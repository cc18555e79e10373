//! Installation state detection
//!
//! An installation is the executable plus `receipt.json`, both directly in the
//! install directory. The receipt records which release the executable came
//! from so a launcher at another version (or on another platform) notices
//! that the cached executable is not the one it should run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use super::download::ToolRelease;
use crate::error::{LauncherError, Result};

const RECEIPT_FILE: &str = "receipt.json";

/// Prefix of scratch files written next to the installation before rename.
pub(crate) const STAGING_PREFIX: &str = ".staging-";

/// On-disk locations owned by one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    dir: PathBuf,
    binary_file_name: String,
}

impl InstallLayout {
    pub fn new(dir: impl Into<PathBuf>, binary_file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            binary_file_name: binary_file_name.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn binary_file_name(&self) -> &str {
        &self.binary_file_name
    }

    /// Canonical path of the installed executable.
    pub fn binary_path(&self) -> PathBuf {
        self.dir.join(&self.binary_file_name)
    }

    pub fn receipt_path(&self) -> PathBuf {
        self.dir.join(RECEIPT_FILE)
    }

    pub fn read_receipt(&self) -> Option<InstallReceipt> {
        let path = self.receipt_path();
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                debug!("Ignoring unreadable receipt {}: {e}", path.display());
                None
            }
        }
    }

    /// Write the receipt via a scratch file so readers never see half of it.
    pub fn write_receipt(&self, receipt: &InstallReceipt) -> Result<()> {
        let path = self.receipt_path();
        let staging = self.dir.join(format!("{STAGING_PREFIX}{RECEIPT_FILE}"));
        let json = serde_json::to_vec_pretty(receipt)
            .map_err(|e| LauncherError::io("serialize receipt for", &path)(e.into()))?;
        fs::write(&staging, json).map_err(LauncherError::io("write", &staging))?;
        fs::rename(&staging, &path).map_err(LauncherError::io("rename receipt to", &path))?;
        Ok(())
    }
}

/// Bookkeeping written after a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReceipt {
    pub tool: String,
    pub version: String,
    pub platform: String,
    pub url: String,
    /// SHA-256 of the downloaded archive. Recorded only; releases publish
    /// no checksum to compare it against.
    pub archive_sha256: String,
    pub installed_at: DateTime<Utc>,
}

impl InstallReceipt {
    pub fn matches(&self, release: &ToolRelease) -> bool {
        self.tool == release.tool
            && self.version == release.version
            && self.platform == release.platform.as_str()
    }
}

/// Installation state enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationState {
    /// Neither executable nor receipt present
    NotInstalled,
    /// Something is present but not a complete install of the expected
    /// release (repair by reinstalling)
    PartiallyInstalled,
    /// Executable present and the receipt matches the expected release
    FullyInstalled,
}

/// Check current installation state against the release that should be installed
///
/// Returns:
/// - `FullyInstalled` if the executable exists and the receipt names `release`
/// - `NotInstalled` if neither the executable nor a receipt exists
/// - `PartiallyInstalled` otherwise (missing half, stale version or platform)
pub fn check_installation_state(
    layout: &InstallLayout,
    release: &ToolRelease,
) -> InstallationState {
    let binary_ok = layout.binary_path().is_file();
    let receipt = layout.read_receipt();

    match (binary_ok, receipt) {
        (true, Some(receipt)) if receipt.matches(release) => InstallationState::FullyInstalled,
        (false, None) if !layout.receipt_path().exists() => InstallationState::NotInstalled,
        _ => InstallationState::PartiallyInstalled,
    }
}
