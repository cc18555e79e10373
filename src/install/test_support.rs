//! Fixtures shared by the install tests.

use std::cell::{Cell, RefCell};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use super::download::Fetch;
use crate::error::{LauncherError, Result};

/// Build an in-memory `.tar.gz` from `(path, contents, mode)` entries.
pub(crate) fn tar_gz(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for &(path, data, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_cksum();
        builder.append_data(&mut header, path, data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Shell script that prints its arguments on one line and exits with `code`.
#[cfg(unix)]
pub(crate) fn echo_script(code: i32) -> Vec<u8> {
    format!("#!/bin/sh\necho \"$@\"\nexit {code}\n").into_bytes()
}

/// [`Fetch`] that serves a canned archive and records every requested URL.
pub(crate) struct FakeFetcher {
    archive: Option<Vec<u8>>,
    pub(crate) requests: RefCell<Vec<String>>,
    calls: Cell<usize>,
}

impl FakeFetcher {
    pub(crate) fn serving(archive: Vec<u8>) -> Self {
        Self {
            archive: Some(archive),
            requests: RefCell::new(Vec::new()),
            calls: Cell::new(0),
        }
    }

    /// Every download fails as if the host were unreachable.
    pub(crate) fn unreachable() -> Self {
        Self {
            archive: None,
            requests: RefCell::new(Vec::new()),
            calls: Cell::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Fetch for FakeFetcher {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        self.calls.set(self.calls.get() + 1);
        self.requests.borrow_mut().push(url.to_string());
        match &self.archive {
            Some(bytes) => {
                std::fs::write(dest, bytes).map_err(LauncherError::io("write", dest))?;
                Ok(bytes.len() as u64)
            }
            None => Err(LauncherError::download(url, "connection refused")),
        }
    }
}
