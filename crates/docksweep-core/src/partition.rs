//! Balanced partitioning of work items into job-sized chunks.

use tracing::info;

/// Splits `items` into `chunks` contiguous, non-overlapping chunks whose
/// sizes differ by at most one. The first `len % chunks` chunks receive one
/// extra item. When more chunks are requested than there are items, every
/// item gets its own chunk and the caller ends up with fewer jobs than it
/// asked for; that is a degraded but valid outcome, not an error.
///
/// The split is pure: the same input order and chunk count always produce
/// the same partitioning, which later manifest/job-index correlation
/// relies on.
pub fn split_items<T: Clone>(items: &[T], chunks: usize) -> Vec<Vec<T>> {
    if chunks > items.len() {
        info!(
            requested = chunks,
            items = items.len(),
            "more jobs than items, launching one job per item"
        );
        return items.iter().map(|item| vec![item.clone()]).collect();
    }

    let base = items.len() / chunks;
    let rem = items.len() % chunks;

    let mut out = Vec::with_capacity(chunks);
    let mut start = 0;
    for i in 0..chunks {
        let len = base + usize::from(i < rem);
        out.push(items[start..start + len].to_vec());
        start += len;
    }
    out
}
