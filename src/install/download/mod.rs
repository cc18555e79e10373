//! GitHub release download and archive extraction
//!
//! ## Module Organization
//!
//! - `platform` - Host platform resolution against the supported platform table
//! - `github` - Release asset URL construction
//! - `core` - HTTP download behind the `Fetch` seam
//! - `extract` - Executable extraction from `.tar.gz` release archives

mod core;
mod extract;
mod github;
pub mod platform;

pub use self::core::{Fetch, HttpFetcher};
pub use extract::{extract_binary_from_package, extract_from_tar_gz};
pub use github::{ARCHIVE_EXTENSION, ReleaseLocator, ToolRelease};
pub use platform::{Host, PlatformId};
