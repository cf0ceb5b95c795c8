//! Shared plumbing for outbound provider calls.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Response};

use crate::core::errors::ProviderError;

pub fn build_client(provider: &'static str, timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::http(provider, e))
}

/// Runs `fut` with a hard deadline.
///
/// The reqwest client timeout covers a single request; this also bounds
/// retries and body decoding done inside the future.
pub async fn bounded<T, F>(provider: &'static str, limit: Duration, fut: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            provider,
            secs: limit.as_secs(),
        }),
    }
}

pub async fn ensure_success(provider: &'static str, res: Response) -> Result<Response, ProviderError> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        provider,
        status,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_passes_through_fast_results() {
        let value = bounded("stub", Duration::from_secs(1), async { Ok::<_, ProviderError>(7) })
            .await
            .expect("should finish in time");
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn bounded_reports_timeout() {
        let err = bounded("stub", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, ProviderError>(())
        })
        .await
        .expect_err("should time out");
        assert!(err.is_timeout());
    }
}
