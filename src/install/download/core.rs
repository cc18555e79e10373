//! Release archive download with progress reporting

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use crate::error::{LauncherError, Result};

const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(30); // Initial connection
const DOWNLOAD_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(300); // 5 min no data

/// Source of release archives.
pub trait Fetch {
    /// Download `url` into the file at `dest`, returning the byte count.
    fn download(&self, url: &str, dest: &Path) -> impl Future<Output = Result<u64>>;
}

/// Downloads release archives over HTTP(S).
///
/// Never retries; a failed download is reported to the caller as is.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    inactivity_timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(DOWNLOAD_CONNECT_TIMEOUT)
            .user_agent(concat!("jscpdrs-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LauncherError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            inactivity_timeout: DOWNLOAD_INACTIVITY_TIMEOUT,
        })
    }

    /// Override how long a download may go without receiving data.
    pub fn with_inactivity_timeout(mut self, inactivity_timeout: Duration) -> Self {
        self.inactivity_timeout = inactivity_timeout;
        self
    }
}

impl Fetch for HttpFetcher {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        debug!("Downloading {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LauncherError::download(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::download(url, format!("HTTP {status}")));
        }

        let total_bytes = response.content_length();
        let progress = progress_bar(total_bytes);

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(LauncherError::io("create", dest))?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        loop {
            let chunk = match timeout(self.inactivity_timeout, stream.next()).await {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => {
                    progress.abandon();
                    return Err(LauncherError::download(url, e.to_string()));
                }
                Ok(None) => break,
                Err(_) => {
                    progress.abandon();
                    return Err(LauncherError::download(
                        url,
                        format!(
                            "no data received for {} seconds after {downloaded} bytes",
                            self.inactivity_timeout.as_secs()
                        ),
                    ));
                }
            };

            file.write_all(&chunk)
                .await
                .map_err(LauncherError::io("write", dest))?;
            downloaded += chunk.len() as u64;
            progress.set_position(downloaded);
        }

        file.flush().await.map_err(LauncherError::io("flush", dest))?;
        progress.finish_and_clear();

        if let Some(total) = total_bytes
            && downloaded != total
        {
            return Err(LauncherError::download(
                url,
                format!("incomplete download: {downloaded} of {total} bytes"),
            ));
        }

        debug!("Downloaded {downloaded} bytes to {}", dest.display());
        Ok(downloaded)
    }
}

/// Progress bar on stderr; indicatif skips drawing when stderr is not a terminal.
fn progress_bar(total_bytes: Option<u64>) -> ProgressBar {
    let bar = match total_bytes {
        Some(total) => ProgressBar::new(total),
        None => ProgressBar::new_spinner(),
    };
    if let Ok(style) =
        ProgressStyle::with_template("{msg} [{bar:30}] {bytes}/{total_bytes} ({eta})")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message("Downloading");
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on a local port.
    async fn serve_once(status_line: &'static str, body: &'static [u8]) -> String {
        let head = format!(
            "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        serve_raw([head.as_bytes(), body].concat(), Duration::ZERO).await
    }

    /// Serve `response` verbatim, then hold the connection open for `stall`
    /// before closing it.
    async fn serve_raw(response: Vec<u8>, stall: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(&response).await.unwrap();
            socket.flush().await.ok();
            tokio::time::sleep(stall).await;
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/asset.tar.gz")
    }

    const SHORT_BODY: &[u8] =
        b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\n0123456789";

    #[tokio::test]
    async fn test_download_writes_body() {
        let url = serve_once("200 OK", b"archive-bytes").await;
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("asset.tar.gz");

        let bytes = HttpFetcher::new().unwrap().download(&url, &dest).await.unwrap();
        assert_eq!(bytes, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"archive-bytes");
    }

    #[tokio::test]
    async fn test_http_404_is_download_error() {
        let url = serve_once("404 Not Found", b"Not Found").await;
        let temp = tempfile::tempdir().unwrap();

        let err = HttpFetcher::new()
            .unwrap()
            .download(&url, &temp.path().join("asset.tar.gz"))
            .await
            .unwrap_err();
        match err {
            LauncherError::Download { url: failed, message } => {
                assert_eq!(failed, url);
                assert!(message.contains("404"), "{message}");
            }
            other => panic!("expected Download, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refused_connection_is_download_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let temp = tempfile::tempdir().unwrap();

        let err = HttpFetcher::new()
            .unwrap()
            .download(&format!("http://{addr}/asset.tar.gz"), &temp.path().join("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Download { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        let url = serve_raw(SHORT_BODY.to_vec(), Duration::from_secs(30)).await;
        let temp = tempfile::tempdir().unwrap();

        let err = HttpFetcher::new()
            .unwrap()
            .with_inactivity_timeout(Duration::from_secs(1))
            .download(&url, &temp.path().join("asset.tar.gz"))
            .await
            .unwrap_err();
        match err {
            LauncherError::Download { message, .. } => {
                assert!(message.contains("no data received"), "{message}");
                assert!(message.contains("after 10 bytes"), "{message}");
            }
            other => panic!("expected Download, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_truncated_body_is_download_error() {
        let url = serve_raw(SHORT_BODY.to_vec(), Duration::ZERO).await;
        let temp = tempfile::tempdir().unwrap();

        let err = HttpFetcher::new()
            .unwrap()
            .download(&url, &temp.path().join("asset.tar.gz"))
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Download { .. }), "{err:?}");
    }
}
