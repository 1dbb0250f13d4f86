//! Role services.
//!
//! Each service holds the shared `Arc<CoreConfig>` and opens the record store per
//! operation, so every call works on a fresh snapshot of the collection files.

pub mod appointments;
pub mod auth;
pub mod billing;
pub mod inventory;
pub mod patients;
pub mod reports;
pub mod users;

/// Similarity between two strings in `[0, 1]`, ignoring case.
pub(crate) fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.trim().to_lowercase(), &b.trim().to_lowercase())
}

/// Returns up to `limit` candidates scoring at least `cutoff`, best first.
///
/// Ties keep their original order.
pub(crate) fn closest<'a, T>(
    query: &str,
    candidates: &'a [T],
    key: impl Fn(&T) -> &str,
    limit: usize,
    cutoff: f64,
) -> Vec<&'a T> {
    let mut scored: Vec<(f64, &T)> = candidates
        .iter()
        .filter(|c| !key(*c).trim().is_empty())
        .map(|c| (similarity(query, key(c)), c))
        .filter(|(score, _)| *score >= cutoff)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, c)| c).collect()
}
