use eval_trend_model::RunRecord;
use itertools::Itertools;

/// Order runs into their canonical sequence
///
/// Runs that both carry a revision are ordered by revision, and by timestamp when the revisions
/// are equal. Runs without a revision are ordered by timestamp. When a suite mixes both kinds, the
/// two ordered chains are merged by timestamp, with ties going to whichever run came first in the
/// input.
///
/// The sort is stable and the input is not modified.
pub fn order(runs: &[RunRecord]) -> Vec<RunRecord> {
    order_refs(runs).into_iter().cloned().collect()
}

pub(crate) fn order_refs<'a, I>(runs: I) -> Vec<&'a RunRecord>
where
    I: IntoIterator<Item = &'a RunRecord>,
{
    let (mut with_revision, mut without_revision): (Vec<_>, Vec<_>) = runs
        .into_iter()
        .enumerate()
        .partition(|(_, run)| run.revision().is_some());

    if !with_revision.is_empty() && !without_revision.is_empty() {
        log::debug!(
            "Merging {} runs with a revision and {} runs without by timestamp",
            with_revision.len(),
            without_revision.len()
        );
    }

    with_revision.sort_by_key(|(_, run)| (run.revision(), run.timestamp()));
    without_revision.sort_by_key(|(_, run)| run.timestamp());

    with_revision
        .into_iter()
        .merge_by(without_revision, |(a_pos, a), (b_pos, b)| {
            (a.timestamp(), a_pos) <= (b.timestamp(), b_pos)
        })
        .map(|(_, run)| run)
        .collect()
}
