//! Nearest-neighbour matching against enrolled embeddings.

use facegate_core::{Embedding, MatchResult};
use facegate_storage::EnrolledFace;
use tracing::warn;

/// Find the enrolled face closest to `probe`.
///
/// Ties go to the earliest face in `enrolled`, which is enrollment order when
/// loaded from the store. Faces whose dimension differs from the probe are
/// skipped. Returns `None` when nothing comparable is enrolled.
///
/// # Examples
///
/// ```
/// use facegate_core::{Embedding, Identity};
/// use facegate_engine::matcher::best_match;
/// use facegate_storage::EnrolledFace;
///
/// let enrolled = vec![
///     EnrolledFace {
///         identity: Identity::new("alice").unwrap(),
///         embedding: Embedding::new(vec![0.0, 0.0]).unwrap(),
///         enrolled_at: chrono::Utc::now(),
///     },
///     EnrolledFace {
///         identity: Identity::new("bob").unwrap(),
///         embedding: Embedding::new(vec![1.0, 1.0]).unwrap(),
///         enrolled_at: chrono::Utc::now(),
///     },
/// ];
///
/// let probe = Embedding::new(vec![0.9, 1.0]).unwrap();
/// let result = best_match(&probe, &enrolled).unwrap();
/// assert_eq!(result.identity.as_str(), "bob");
/// ```
pub fn best_match(probe: &Embedding, enrolled: &[EnrolledFace]) -> Option<MatchResult> {
    let mut best: Option<(&EnrolledFace, f64)> = None;

    for face in enrolled {
        let distance = match probe.distance_to(&face.embedding) {
            Ok(d) => d,
            Err(e) => {
                warn!(identity = %face.identity, error = %e, "Skipping incomparable enrollment");
                continue;
            }
        };
        if best.is_none_or(|(_, min)| distance < min) {
            best = Some((face, distance));
        }
    }

    best.map(|(face, distance)| MatchResult::new(face.identity.clone(), distance))
}
