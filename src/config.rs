//! Bundled launcher descriptor and installation location.

use std::ffi::OsString;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{LauncherError, Result};
use crate::install::download::ReleaseLocator;

/// Descriptor compiled into the launcher.
const BUNDLED_DESCRIPTOR: &str = include_str!("../launcher.toml");

/// Overrides the installation directory when set to a non-empty path.
///
/// Exists so tests can point the launcher at a scratch directory; it is not a
/// supported user-facing setting and may change without notice.
pub const INSTALL_DIR_ENV: &str = "JSCPDRS_CLI_INSTALL_DIR";

/// Log filter for the launcher's own diagnostics (`env_logger` syntax).
pub const LOG_ENV: &str = "JSCPDRS_CLI_LOG";

/// Directory under the per-user cache dir that holds the installation.
const CACHE_DIR_NAME: &str = "jscpdrs-cli";

fn default_origin() -> String {
    "https://github.com".to_string()
}

/// Top‑level launcher descriptor.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    pub release: ReleaseConfig,
}

/// Where releases of the native tool are published and what they contain.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseConfig {
    #[serde(default = "default_origin")]
    pub origin: String,
    pub owner: String,
    pub repo: String,
    /// Tool name used in asset file names.
    pub tool: String,
    /// Executable name inside the release archive (without `.exe`).
    pub binary: String,
    /// Release to fetch; the launcher's own package version when unset.
    #[serde(default)]
    pub version: Option<String>,
}

impl LauncherConfig {
    /// The descriptor bundled at compile time.
    pub fn bundled() -> Result<Self> {
        Self::from_toml(BUNDLED_DESCRIPTOR)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| LauncherError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let release = &self.release;
        if release.tool.trim().is_empty() {
            return Err(LauncherError::Config("`release.tool` must not be empty".into()));
        }
        if release.binary.trim().is_empty()
            || release.binary.contains(['/', '\\'])
            || release.binary == "."
            || release.binary == ".."
        {
            return Err(LauncherError::Config(format!(
                "`release.binary` must be a plain file name, got '{}'",
                release.binary
            )));
        }
        if self.version().trim().is_empty() {
            return Err(LauncherError::Config("`release.version` must not be empty".into()));
        }
        // Surface a bad origin at load time rather than on first install.
        self.locator().map(|_| ())
    }

    /// Version of the tool release this launcher fetches.
    pub fn version(&self) -> &str {
        self.release
            .version
            .as_deref()
            .unwrap_or(env!("CARGO_PKG_VERSION"))
    }

    pub fn tool(&self) -> &str {
        &self.release.tool
    }

    /// Executable file name on this host, e.g. `jscpd-rs` or `jscpd-rs.exe`.
    pub fn binary_file_name(&self) -> String {
        format!("{}{}", self.release.binary, std::env::consts::EXE_SUFFIX)
    }

    pub fn locator(&self) -> Result<ReleaseLocator> {
        ReleaseLocator::new(&self.release.origin, &self.release.owner, &self.release.repo)
    }

    /// Installation directory, honouring [`INSTALL_DIR_ENV`].
    pub fn install_dir(&self) -> Result<PathBuf> {
        install_dir_from(std::env::var_os(INSTALL_DIR_ENV))
    }
}

/// Resolve the installation directory from an optional override.
///
/// Without an override: `<cache dir>/jscpdrs-cli`, e.g. `~/.cache/jscpdrs-cli`
/// on Linux or `~/Library/Caches/jscpdrs-cli` on macOS.
pub fn install_dir_from(override_dir: Option<OsString>) -> Result<PathBuf> {
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::cache_dir()
        .map(|cache| cache.join(CACHE_DIR_NAME))
        .ok_or(LauncherError::NoCacheDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [release]
        owner = "spring-catponents"
        repo = "jscpd-rs"
        tool = "jscpd-rs"
        binary = "jscpd-rs"
    "#;

    #[test]
    fn test_bundled_descriptor_loads() {
        let config = LauncherConfig::bundled().unwrap();
        assert_eq!(config.tool(), "jscpd-rs");
        assert_eq!(config.release.owner, "spring-catponents");
        assert_eq!(config.release.repo, "jscpd-rs");
        assert_eq!(config.locator().unwrap().origin().as_str(), "https://github.com/");
    }

    #[test]
    fn test_version_defaults_to_package_version() {
        let config = LauncherConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.version(), env!("CARGO_PKG_VERSION"));
        assert_eq!(config.release.origin, "https://github.com");
    }

    #[test]
    fn test_pinned_version() {
        let source = format!("{MINIMAL}\nversion = \"1.2.3\"\n");
        let config = LauncherConfig::from_toml(&source).unwrap();
        assert_eq!(config.version(), "1.2.3");
    }

    #[test]
    fn test_binary_file_name_has_host_suffix() {
        let config = LauncherConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(
            config.binary_file_name(),
            format!("jscpd-rs{}", std::env::consts::EXE_SUFFIX)
        );
    }

    #[test]
    fn test_rejects_invalid_descriptors() {
        let bad_origin = MINIMAL.replace("[release]", "[release]\norigin = \"ftp:nope\"");
        assert!(matches!(
            LauncherConfig::from_toml(&bad_origin),
            Err(LauncherError::Config(_))
        ));

        let nested_binary = MINIMAL.replace("binary = \"jscpd-rs\"", "binary = \"bin/jscpd-rs\"");
        assert!(matches!(
            LauncherConfig::from_toml(&nested_binary),
            Err(LauncherError::Config(_))
        ));

        let unknown_key = format!("{MINIMAL}\nmirror = \"x\"\n");
        assert!(matches!(
            LauncherConfig::from_toml(&unknown_key),
            Err(LauncherError::Config(_))
        ));

        assert!(matches!(
            LauncherConfig::from_toml("[release]\nowner = \"o\"\n"),
            Err(LauncherError::Config(_))
        ));
    }

    #[test]
    fn test_install_dir_override() {
        let dir = install_dir_from(Some(OsString::from("/opt/jscpdrs"))).unwrap();
        assert_eq!(dir, PathBuf::from("/opt/jscpdrs"));
    }

    #[test]
    fn test_empty_override_falls_back_to_cache_dir() {
        if let Some(cache) = dirs::cache_dir() {
            let dir = install_dir_from(Some(OsString::new())).unwrap();
            assert_eq!(dir, cache.join(CACHE_DIR_NAME));
        }
    }
}
