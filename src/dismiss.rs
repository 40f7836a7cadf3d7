use crate::models::Hit;

/// Returns `hits` without the first hit whose id equals `hit_id`.
///
/// Later hits sharing the id stay put: pages are merged without
/// deduplication and each dismissal accounts for exactly one row.
pub fn without_first(hits: &[Hit], hit_id: &str) -> Vec<Hit> {
    let mut remaining = hits.to_vec();
    if let Some(pos) = remaining.iter().position(|hit| hit.id == hit_id) {
        remaining.remove(pos);
    }
    remaining
}
