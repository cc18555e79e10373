//! Host platform resolution for release asset selection

use std::fmt;

use once_cell::sync::OnceCell;

use crate::error::{LauncherError, Result};

/// Platforms with a published release asset, keyed by the host's
/// `std::env::consts::{OS, ARCH}` names.
///
/// One row per platform. Only enable a row once a release asset for it is
/// actually published.
const SUPPORTED_PLATFORMS: &[(&str, &str, &str)] = &[
    // ("windows", "x86_64", "x86_64-pc-windows-msvc"),
    // ("linux", "x86_64", "x86_64-unknown-linux-musl"),
    ("macos", "x86_64", "x86_64-apple-darwin"),
];

/// Global cache for host platform detection
static HOST_PLATFORM: OnceCell<PlatformId> = OnceCell::new();

/// Release platform token, e.g. `x86_64-apple-darwin`.
///
/// Only obtainable from the supported platform table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformId(&'static str);

impl PlatformId {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// OS/architecture pair as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Host {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Host {
    /// The machine this process runs on.
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }

    pub fn resolve(&self) -> Result<PlatformId> {
        resolve(self.os, self.arch)
    }
}

/// Map an OS/architecture pair to its release platform.
///
/// Exact, case-sensitive lookup in the supported platform table.
pub fn resolve(os: &str, arch: &str) -> Result<PlatformId> {
    SUPPORTED_PLATFORMS
        .iter()
        .find(|(row_os, row_arch, _)| *row_os == os && *row_arch == arch)
        .map(|&(_, _, id)| PlatformId(id))
        .ok_or_else(|| LauncherError::unsupported_platform(os, arch))
}

/// Resolve the running host (cached after first call)
pub fn detect() -> Result<PlatformId> {
    HOST_PLATFORM
        .get_or_try_init(|| Host::current().resolve())
        .copied()
}

/// Every platform a release is published for.
pub fn supported_platforms() -> impl Iterator<Item = PlatformId> {
    SUPPORTED_PLATFORMS.iter().map(|&(_, _, id)| PlatformId(id))
}
