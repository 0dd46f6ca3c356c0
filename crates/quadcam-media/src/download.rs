//! HTTP video download.
//!
//! Fetches a remote recording and streams the body to disk chunk by chunk so
//! large files never sit fully in memory.

use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{MediaError, MediaResult};
use crate::fs_utils::remove_file_quietly;

/// Download `url` into `dest`, returning the number of bytes written.
///
/// Non-success HTTP statuses and empty bodies are download failures. A
/// partially written file is removed before the error is returned.
pub async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: impl AsRef<Path>,
) -> MediaResult<u64> {
    let dest = dest.as_ref();
    info!("Downloading video from {} to {}", url, dest.display());

    let result = stream_to_file(client, url, dest).await;
    match result {
        Ok(0) => {
            remove_file_quietly(dest).await;
            Err(MediaError::download_failed(format!(
                "Server returned an empty body for {}",
                url
            )))
        }
        Ok(bytes) => {
            info!("Downloaded {} bytes to {}", bytes, dest.display());
            Ok(bytes)
        }
        Err(e) => {
            warn!("Download of {} failed: {}", url, e);
            remove_file_quietly(dest).await;
            Err(e)
        }
    }
}

async fn stream_to_file(client: &reqwest::Client, url: &str, dest: &Path) -> MediaResult<u64> {
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| MediaError::download_failed(format!("Request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(MediaError::download_failed(format!(
            "Server responded with HTTP {}",
            status.as_u16()
        )));
    }

    let mut file = File::create(dest).await?;
    let mut written = 0u64;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| MediaError::download_failed(format!("Reading body failed: {}", e)))?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_writes_body() {
        let server = MockServer::start().await;
        let body = vec![7u8; 64 * 1024];
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mp4");
        let client = reqwest::Client::new();

        let written = download_to_file(&client, &format!("{}/clip.mp4", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn test_download_http_error_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing.mp4");
        let client = reqwest::Client::new();

        let err = download_to_file(&client, &format!("{}/missing.mp4", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(err.is_user_error());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_empty_body_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("empty.mp4");
        let client = reqwest::Client::new();

        let err = download_to_file(&client, &server.uri(), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_unreachable_host() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("x.mp4");
        let client = reqwest::Client::new();

        let err = download_to_file(&client, "http://127.0.0.1:1/x.mp4", &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::DownloadFailed { .. }));
    }
}
