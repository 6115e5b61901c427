use crate::sequence;
use eval_trend_model::RunRecord;
use itertools::Itertools;

/// Group runs by suite id and configuration fingerprint
///
/// Groups are returned in suite id order, then fingerprint order. Runs keep their input order
/// within a group.
pub fn group_by_suite_and_config(
    runs: &[RunRecord],
) -> Vec<((String, String), Vec<RunRecord>)> {
    runs.iter()
        .cloned()
        .into_group_map_by(|run| (run.suite_id().to_string(), run.fingerprint()))
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .collect()
}

/// Pick the latest run of every suite and configuration
pub fn latest_runs_by_suite_and_config(runs: &[RunRecord]) -> Vec<(String, String, RunRecord)> {
    group_by_suite_and_config(runs)
        .into_iter()
        .filter_map(|((suite_id, fingerprint), runs)| {
            // Groups are never empty
            let latest = (*sequence::order_refs(&runs).last()?).clone();
            log::debug!("Latest run for {suite_id} ({fingerprint}): {}", latest.id());
            Some((suite_id, fingerprint, latest))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn run(id: &str, suite_id: &str, model: &str, revision: u64) -> RunRecord {
        RunRecord::new(
            id,
            suite_id,
            model,
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
            1,
            1,
        )
        .unwrap()
        .with_revision(revision)
    }

    #[test]
    fn groups_by_suite_then_configuration() {
        let runs = vec![
            run("b1", "b", "m1", 1),
            run("a1", "a", "m1", 1),
            run("a2", "a", "m2", 2),
            run("a3", "a", "m1", 3),
        ];
        let groups = group_by_suite_and_config(&runs);

        assert_eq!(3, groups.len());
        assert_eq!("a", groups[0].0 .0);
        assert_eq!("a", groups[1].0 .0);
        assert_eq!("b", groups[2].0 .0);

        let m1 = groups
            .iter()
            .find(|(_, runs)| runs[0].model() == "m1" && runs[0].suite_id() == "a")
            .unwrap();
        assert_eq!(
            vec!["a1", "a3"],
            m1.1.iter().map(|r| r.id()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn picks_latest_by_sequence() {
        let runs = vec![
            run("a3", "a", "m1", 3),
            run("a1", "a", "m1", 1),
            run("a2", "a", "m2", 2),
            run("b7", "b", "m1", 7),
            run("b2", "b", "m1", 2),
        ];
        let latest = latest_runs_by_suite_and_config(&runs);

        let mut ids = latest.iter().map(|(_, _, r)| r.id()).collect::<Vec<_>>();
        ids.sort();
        assert_eq!(vec!["a2", "a3", "b7"], ids);

        for (suite_id, fingerprint, run) in &latest {
            assert_eq!(suite_id, run.suite_id());
            assert_eq!(fingerprint, &run.fingerprint());
        }
    }
}
