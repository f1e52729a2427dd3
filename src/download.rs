use std::path::Path;

use reqwest::Client;
use tokio::{fs::File, io::AsyncWriteExt};

use crate::request::random_headers;
use crate::retry::{retry_call, RetryPolicy};
use crate::{Error, Result};

/// Fetches the image and writes the full body to `dest`, overwriting any
/// existing file. Every request error counts as retryable here; once the
/// policy is exhausted the last error is returned to the caller.
pub(crate) async fn download_image(
    client: &Client,
    policy: &RetryPolicy,
    url: &str,
    dest: &Path,
) -> Result<()> {
    let bytes = retry_call(policy, |_| true, move || async move {
        let res = client.get(url).headers(random_headers()).send().await?;
        if !res.status().is_success() {
            return Err(Error::HttpStatus {
                url: url.to_owned(),
                status: res.status(),
            });
        }
        Ok(res.bytes().await?)
    })
    .await?;

    let mut file = File::create(dest).await?;
    file.write_all(&bytes).await?;
    tracing::info!("image downloaded: {}", dest.display());
    Ok(())
}

/// Last path segment of the image URL, used to name the saved file.
pub(crate) fn url_basename(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
