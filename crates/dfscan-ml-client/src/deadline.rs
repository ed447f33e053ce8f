//! Per-call deadlines.

use std::future::Future;
use std::time::Duration;

use crate::error::{MlError, MlResult};

/// Run `fut` to completion or fail with [`MlError::Timeout`].
///
/// The future is dropped on expiry, which aborts any in-flight request.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> MlResult<T>
where
    F: Future<Output = MlResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(MlError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_passes_result_through() {
        let value = with_deadline(Duration::from_secs(1), async { Ok::<_, MlError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_deadline_expires() {
        let err = with_deadline(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, MlError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, MlError::Timeout(_)));
    }
}
