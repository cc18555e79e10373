//! Release archive extraction
//!
//! Release assets are gzip-compressed tarballs holding the executable either
//! at the root or inside a single top-level directory.

use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::debug;
use tar::Archive;

use crate::error::{LauncherError, Result};

/// Entry names quoted in a "binary not found" error before truncating.
const LISTED_ENTRIES: usize = 16;

/// Extract `binary_name` from a `.tar.gz` archive into `output_dir`.
///
/// The first regular file whose file name equals `binary_name` wins,
/// wherever it sits in the archive. Returns the extracted path.
pub fn extract_from_tar_gz(
    archive_path: &Path,
    binary_name: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    let fail = |message: String| LauncherError::extraction(archive_path, binary_name, message);

    let file = File::open(archive_path).map_err(|e| fail(format!("cannot open archive: {e}")))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    let entries = archive
        .entries()
        .map_err(|e| fail(format!("cannot read archive: {e}")))?;

    let mut seen = Vec::new();
    for entry in entries {
        let mut entry = entry.map_err(|e| fail(format!("corrupt archive entry: {e}")))?;
        let entry_path = entry
            .path()
            .map_err(|e| fail(format!("invalid entry path: {e}")))?
            .into_owned();

        let is_file = entry.header().entry_type().is_file();
        if is_file && entry_path.file_name() == Some(OsStr::new(binary_name)) {
            let dest = output_dir.join(binary_name);
            entry
                .unpack(&dest)
                .map_err(|e| fail(format!("cannot unpack {}: {e}", entry_path.display())))?;
            debug!("Extracted {} to {}", entry_path.display(), dest.display());
            return Ok(dest);
        }

        if seen.len() < LISTED_ENTRIES {
            seen.push(entry_path.display().to_string());
        }
    }

    let contents = if seen.is_empty() {
        "archive is empty".to_string()
    } else {
        format!("archive contains: {}", seen.join(", "))
    };
    Err(fail(format!("binary not found; {contents}")))
}

/// Extract the executable off the async runtime (tar/gzip decoding is CPU-bound).
pub async fn extract_binary_from_package(
    archive_path: &Path,
    binary_name: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    let archive = archive_path.to_path_buf();
    let binary = binary_name.to_string();
    let output = output_dir.to_path_buf();

    tokio::task::spawn_blocking(move || extract_from_tar_gz(&archive, &binary, &output))
        .await
        .map_err(|e| {
            LauncherError::extraction(
                archive_path,
                binary_name,
                format!("extraction task failed: {e}"),
            )
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::test_support::tar_gz;

    fn write_archive(dir: &Path, bytes: &[u8]) -> PathBuf {
        let path = dir.join("asset.tar.gz");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_extracts_binary_at_root() {
        let temp = tempfile::tempdir().unwrap();
        let archive = write_archive(
            temp.path(),
            &tar_gz(&[("README.md", b"docs", 0o644), ("jscpd-rs", b"binary", 0o755)]),
        );
        let out = temp.path().join("out");
        std::fs::create_dir(&out).unwrap();

        let path = extract_from_tar_gz(&archive, "jscpd-rs", &out).unwrap();
        assert_eq!(path, out.join("jscpd-rs"));
        assert_eq!(std::fs::read(&path).unwrap(), b"binary");
    }

    #[test]
    fn test_extracts_binary_from_nested_directory() {
        let temp = tempfile::tempdir().unwrap();
        let archive = write_archive(
            temp.path(),
            &tar_gz(&[("jscpd-rs-v1.0.0/jscpd-rs", b"nested", 0o755)]),
        );

        let path = extract_from_tar_gz(&archive, "jscpd-rs", temp.path()).unwrap();
        assert_eq!(path, temp.path().join("jscpd-rs"));
        assert_eq!(std::fs::read(&path).unwrap(), b"nested");
    }

    #[test]
    fn test_missing_binary_lists_contents() {
        let temp = tempfile::tempdir().unwrap();
        let archive = write_archive(
            temp.path(),
            &tar_gz(&[("LICENSE", b"mit", 0o644), ("jscpd-rs.sig", b"sig", 0o644)]),
        );

        let err = extract_from_tar_gz(&archive, "jscpd-rs", temp.path()).unwrap_err();
        match err {
            LauncherError::Extraction { binary, message, .. } => {
                assert_eq!(binary, "jscpd-rs");
                assert!(message.contains("LICENSE"), "{message}");
                assert!(message.contains("jscpd-rs.sig"), "{message}");
            }
            other => panic!("expected Extraction, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_archive_is_extraction_error() {
        let temp = tempfile::tempdir().unwrap();
        let archive = write_archive(temp.path(), b"<html>Not Found</html>");

        let err = extract_from_tar_gz(&archive, "jscpd-rs", temp.path()).unwrap_err();
        assert!(matches!(err, LauncherError::Extraction { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_async_extraction() {
        let temp = tempfile::tempdir().unwrap();
        let archive = write_archive(temp.path(), &tar_gz(&[("jscpd-rs", b"ok", 0o755)]));

        let path = extract_binary_from_package(&archive, "jscpd-rs", temp.path())
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"ok");
    }
}
