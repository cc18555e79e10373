//! GitHub release download URLs

use url::Url;

use super::platform::PlatformId;
use crate::error::{LauncherError, Result};

/// Archive format of published release assets.
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// One downloadable release asset: tool, version and platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRelease {
    pub tool: String,
    pub version: String,
    pub platform: PlatformId,
}

impl ToolRelease {
    pub fn new(tool: impl Into<String>, version: impl Into<String>, platform: PlatformId) -> Self {
        Self {
            tool: tool.into(),
            version: version.into(),
            platform,
        }
    }

    /// Release tag, `v<version>`.
    pub fn tag(&self) -> String {
        format!("v{}", self.version)
    }

    /// Asset file name, `<tool>-v<version>-<platform>.tar.gz`.
    pub fn asset_name(&self) -> String {
        format!(
            "{}-v{}-{}.{}",
            self.tool, self.version, self.platform, ARCHIVE_EXTENSION
        )
    }
}

/// Builds release asset URLs under a fixed `<origin>/<owner>/<repo>`.
///
/// Pure string composition; never touches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLocator {
    origin: Url,
    owner: String,
    repo: String,
}

impl ReleaseLocator {
    /// Fails when `origin` is not an absolute http(s) URL that can carry a path.
    pub fn new(origin: &str, owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| LauncherError::Config(format!("invalid release origin '{origin}': {e}")))?;
        if origin.cannot_be_a_base() || !matches!(origin.scheme(), "http" | "https") {
            return Err(LauncherError::Config(format!(
                "release origin must be an http(s) URL, got '{origin}'"
            )));
        }

        let owner = owner.into();
        let repo = repo.into();
        if owner.is_empty() || repo.is_empty() {
            return Err(LauncherError::Config(
                "release owner and repository must not be empty".to_string(),
            ));
        }

        Ok(Self {
            origin,
            owner,
            repo,
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// `<origin>/<owner>/<repo>/releases/download/v<version>/<tool>-v<version>-<platform>.tar.gz`
    pub fn locate(&self, tool: &str, version: &str, platform: PlatformId) -> Url {
        self.locate_release(&ToolRelease::new(tool, version, platform))
    }

    pub fn locate_release(&self, release: &ToolRelease) -> Url {
        let tag = release.tag();
        let asset = release.asset_name();

        let mut url = self.origin.clone();
        url.set_query(None);
        url.set_fragment(None);
        // Each component is its own percent-encoded segment, so a '/' inside
        // a version can never shift the asset into another path.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                self.owner.as_str(),
                self.repo.as_str(),
                "releases",
                "download",
                tag.as_str(),
                asset.as_str(),
            ]);
        }
        url
    }
}
