//! Lifecycle of the cached native executable: install, run, uninstall.
//!
//! The cache directory is unsynchronized local state. Concurrent launcher
//! processes installing, running or uninstalling against the same directory
//! may observe or leave behind a broken installation; within one process the
//! executable is only ever replaced by an atomic rename.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info};
use sha2::{Digest, Sha256};

use super::detection::{
    InstallLayout, InstallReceipt, InstallationState, STAGING_PREFIX, check_installation_state,
};
use super::download::{
    Fetch, Host, HttpFetcher, PlatformId, ReleaseLocator, ToolRelease,
    extract_binary_from_package, platform,
};
use super::forward::{Exit, Invocation, forward};
use crate::config::LauncherConfig;
use crate::error::{LauncherError, Result};

/// Owns the single installation of the native tool.
#[derive(Debug)]
pub struct BinaryManager<F = HttpFetcher> {
    tool: String,
    version: String,
    locator: ReleaseLocator,
    layout: InstallLayout,
    host: Option<Host>,
    fetcher: F,
}

impl BinaryManager<HttpFetcher> {
    /// Manager for the bundled descriptor's release at its default location.
    pub fn from_config(config: &LauncherConfig) -> Result<Self> {
        let layout = InstallLayout::new(config.install_dir()?, config.binary_file_name());
        Self::new(config, layout, HttpFetcher::new()?)
    }
}

impl<F: Fetch> BinaryManager<F> {
    pub fn new(config: &LauncherConfig, layout: InstallLayout, fetcher: F) -> Result<Self> {
        Ok(Self {
            tool: config.tool().to_string(),
            version: config.version().to_string(),
            locator: config.locator()?,
            layout,
            host: None,
            fetcher,
        })
    }

    /// Resolve releases for `host` instead of the running machine.
    pub fn with_host(mut self, host: Host) -> Self {
        self.host = Some(host);
        self
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn platform(&self) -> Result<PlatformId> {
        match self.host {
            Some(host) => host.resolve(),
            None => platform::detect(),
        }
    }

    /// The release this manager installs on the current host.
    pub fn release(&self) -> Result<ToolRelease> {
        Ok(ToolRelease::new(&self.tool, &self.version, self.platform()?))
    }

    pub fn state(&self) -> Result<InstallationState> {
        Ok(check_installation_state(&self.layout, &self.release()?))
    }

    /// Download the release archive and (re)place the executable at its
    /// canonical path, replacing any previous installation.
    ///
    /// The archive digest is recorded in the receipt but not verified.
    pub async fn install(&self) -> Result<InstallReceipt> {
        let release = self.release()?;
        self.install_release(&release).await
    }

    async fn install_release(&self, release: &ToolRelease) -> Result<InstallReceipt> {
        let url = self.locator.locate_release(release);
        info!(
            "Installing {} {} for {} from {url}",
            release.tool,
            release.tag(),
            release.platform
        );

        let dir = self.layout.dir();
        fs::create_dir_all(dir).map_err(LauncherError::io("create directory", dir))?;

        // Scratch space next to the installation so the final move is a rename
        // on the same filesystem. Removed on drop, including on error paths.
        let scratch = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(dir)
            .map_err(LauncherError::io("create scratch directory in", dir))?;

        let archive = scratch.path().join(release.asset_name());
        let bytes = self.fetcher.download(url.as_str(), &archive).await?;
        let archive_sha256 = sha256_file(&archive)?;
        info!("Downloaded {bytes} bytes, SHA-256 {archive_sha256} (unverified)");

        let extracted = extract_binary_from_package(
            &archive,
            self.layout.binary_file_name(),
            scratch.path(),
        )
        .await?;
        set_executable(&extracted)?;

        let dest = self.layout.binary_path();
        fs::rename(&extracted, &dest).map_err(LauncherError::io("move executable to", &dest))?;

        let receipt = InstallReceipt {
            tool: release.tool.clone(),
            version: release.version.clone(),
            platform: release.platform.to_string(),
            url: url.to_string(),
            archive_sha256,
            installed_at: Utc::now(),
        };
        self.layout.write_receipt(&receipt)?;

        info!("Installed {}", dest.display());
        Ok(receipt)
    }

    /// Install unless the expected release is already fully installed.
    /// Returns the executable path.
    pub async fn ensure_installed(&self) -> Result<PathBuf> {
        let release = self.release()?;
        match check_installation_state(&self.layout, &release) {
            InstallationState::FullyInstalled => {
                debug!("Installation verified at {}", self.layout.binary_path().display());
            }
            state => {
                info!("Installation required: {state:?}");
                self.install_release(&release).await?;
            }
        }
        Ok(self.layout.binary_path())
    }

    /// Run the tool, installing it first if needed, and report how it exited.
    pub async fn run(&self, invocation: Invocation) -> Result<Exit> {
        let binary = self.ensure_installed().await?;
        forward(&binary, invocation).await
    }

    /// Remove the installation. Returns whether anything was removed; an
    /// absent installation is not an error.
    pub fn uninstall(&self) -> Result<bool> {
        let dir = self.layout.dir();
        let mut removed = false;

        for path in [self.layout.binary_path(), self.layout.receipt_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Removed {}", path.display());
                    removed = true;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(LauncherError::io("remove", &path)(e)),
            }
        }

        // Leftovers of interrupted installs.
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(removed),
            Err(e) => return Err(LauncherError::io("read directory", dir)(e)),
        };
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {e}", dir.display());
                    continue;
                }
            };
            if !entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX) {
                continue;
            }
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            result.map_err(LauncherError::io("remove", &path))?;
            debug!("Removed leftover {}", path.display());
            removed = true;
        }

        // Only succeeds when nothing else lives in the directory.
        if let Err(e) = fs::remove_dir(dir) {
            debug!("Keeping {}: {e}", dir.display());
        }
        Ok(removed)
    }
}

fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path).map_err(LauncherError::io("open", path))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(LauncherError::io("hash", path))?;
    Ok(hex::encode(hasher.finalize()))
}

fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(path)
            .map_err(LauncherError::io("read metadata of", path))?
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).map_err(LauncherError::io("set permissions on", path))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
