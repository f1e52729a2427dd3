use rand::seq::SliceRandom;
use reqwest::{header, Client, StatusCode};

use crate::retry::{retry_call, RetryPolicy};
use crate::{Error, Result};

/// User-Agent pool; one is picked at random per request to dodge the most
/// trivial bot blocking.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Safari/605.1.15",
];

/// Statuses worth another attempt; anything else fails immediately.
const RETRY_STATUSES: &[StatusCode] = &[
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
    StatusCode::FORBIDDEN,
];

/// Document page URL for an id.
pub(crate) fn page_url(host: &str, id: u64) -> String {
    format!("{host}/documento/V{id}")
}

/// Fresh headers for every request: random User-Agent, fixed language and
/// connection headers.
pub(crate) fn random_headers() -> header::HeaderMap {
    let ua = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0]);

    let mut headers = header::HeaderMap::new();
    headers.insert(header::USER_AGENT, header::HeaderValue::from_static(ua));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(
        header::CONNECTION,
        header::HeaderValue::from_static("keep-alive"),
    );
    headers
}

pub(crate) fn is_retryable_fetch(err: &Error) -> bool {
    match err {
        Error::HttpStatus { status, .. } => RETRY_STATUSES.contains(status),
        Error::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        _ => false,
    }
}

/// GETs a document page and returns the HTML body, retrying per `policy`.
/// Network errors and retryable statuses are surfaced only after the policy
/// is exhausted.
pub(crate) async fn fetch_page(client: &Client, policy: &RetryPolicy, url: &str) -> Result<String> {
    retry_call(policy, is_retryable_fetch, move || async move {
        let res = client.get(url).headers(random_headers()).send().await?;
        if !res.status().is_success() {
            return Err(Error::HttpStatus {
                url: url.to_owned(),
                status: res.status(),
            });
        }
        let html = res.text().await?;
        Ok(html)
    })
    .await
}
