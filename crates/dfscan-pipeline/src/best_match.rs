//! Best identity match across frames.

use dfscan_ml_client::MlResult;
use dfscan_models::{BestMatch, RecognitionResult};

/// Fold recognition outcomes, in frame order, into the best match.
///
/// Starts from the unidentified sentinel. A candidate replaces the running
/// best only when its call succeeded with a 2xx status and its similarity is
/// strictly higher, so the earliest frame wins a tie. Failed calls are skipped.
pub fn select_best_match<'a, I>(outcomes: I) -> BestMatch
where
    I: IntoIterator<Item = &'a MlResult<RecognitionResult>>,
{
    outcomes
        .into_iter()
        .filter_map(|outcome| outcome.as_ref().ok())
        .fold(RecognitionResult::unidentified(), |best, candidate| {
            if candidate.is_success() && candidate.similarity > best.similarity {
                candidate.clone()
            } else {
                best
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfscan_ml_client::MlError;
    use dfscan_models::UNIDENTIFIED;
    use std::time::Duration;

    fn ok(status: u16, similarity: f64, identity: &str) -> MlResult<RecognitionResult> {
        Ok(RecognitionResult::new(status, similarity, identity))
    }

    #[test]
    fn test_highest_similarity_wins() {
        let best = select_best_match(&[
            ok(200, 0.5, "A"),
            ok(200, 0.9, "B"),
            Ok(RecognitionResult::unidentified()),
        ]);
        assert_eq!(best, RecognitionResult::new(200, 0.9, "B"));
    }

    #[test]
    fn test_tie_keeps_earliest_frame() {
        let best = select_best_match(&[ok(200, 0.7, "First"), ok(200, 0.7, "Second")]);
        assert_eq!(best.identity, "First");

        let best = select_best_match(&[ok(200, 0.7, "Second"), ok(200, 0.7, "First")]);
        assert_eq!(best.identity, "Second");
    }

    #[test]
    fn test_non_success_status_never_wins() {
        let best = select_best_match(&[ok(500, 0.99, "Ghost"), ok(200, 0.4, "Real")]);
        assert_eq!(best.identity, "Real");
    }

    #[test]
    fn test_failed_calls_are_skipped() {
        let best = select_best_match(&[
            Err(MlError::Timeout(Duration::from_secs(60))),
            ok(200, 0.3, "C"),
        ]);
        assert_eq!(best.identity, "C");
    }

    #[test]
    fn test_nothing_found_is_sentinel() {
        let none: [MlResult<RecognitionResult>; 0] = [];
        let best = select_best_match(&none);
        assert_eq!(best, RecognitionResult::unidentified());
        assert_eq!(best.identity, UNIDENTIFIED);
        assert_eq!(best.status_code, 404);

        let best = select_best_match(&[ok(200, 0.0, "Zero")]);
        assert_eq!(best.identity, UNIDENTIFIED);
    }
}
