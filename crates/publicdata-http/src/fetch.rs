//! Retrying GET with bounded, doubling backoff.

use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{HttpError, HttpResult};
use crate::retry::RetryPolicy;

/// True when a status should be retried: server errors, throttling (429),
/// and request timeouts (408).
#[must_use]
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

pub(crate) async fn fetch_with_retry(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
    headers: Option<&HeaderMap>,
) -> HttpResult<Response> {
    let mut last_error: Option<HttpError> = None;

    for attempt in 0..policy.max_retries {
        let mut request = client.get(url);
        if let Some(extra) = headers {
            request = request.headers(extra.clone());
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if is_retryable_status(status) {
                    warn!(url, attempt = attempt + 1, status = %status, "retryable status from fetch");
                    last_error = Some(HttpError::RetryableStatus {
                        url: url.to_string(),
                        status,
                    });
                } else if status.is_client_error() {
                    return Err(HttpError::ClientStatus {
                        url: url.to_string(),
                        status,
                    });
                } else {
                    debug!(url, attempt = attempt + 1, status = %status, "fetch succeeded");
                    return Ok(response);
                }
            }
            Err(source) => {
                if source.is_builder() {
                    return Err(HttpError::Request {
                        url: url.to_string(),
                        source,
                    });
                }
                warn!(url, attempt = attempt + 1, error = %source, "transport failure during fetch");
                last_error = Some(HttpError::transport(url, source));
            }
        }

        if attempt + 1 < policy.max_retries {
            let delay = policy.delay_for(attempt);
            debug!(url, ?delay, "sleeping before retry");
            sleep(delay).await;
        }
    }

    Err(last_error.unwrap_or_else(|| HttpError::AttemptsExhausted {
        url: url.to_string(),
        attempts: policy.max_retries,
    }))
}
