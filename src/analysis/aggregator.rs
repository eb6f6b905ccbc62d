//! Summary tables over retrieved HITs and assignments.
//!
//! Every function here is a pure function of its input slice; re-running on
//! the same records in any order gives the same result.

use crate::models::{
    AnswerPayload, HitType, ReviewStatus, Submission, SubmissionStats, SubmissionStatus,
    SummaryRow, UnitTotals, WorkUnit, WorkUnitStatus, WorkerRow,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Grouping key of the HIT summary; compared on the string form of each part.
type SummaryKey<'a> = (&'a str, &'a str, &'a str, &'a str);

/// Count distinct HITs per `(type id, title, status, review status)`.
///
/// Rows are sorted ascending on the key components in that order.
pub fn summarize_work_units(units: &[WorkUnit]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<SummaryKey<'_>, (WorkUnitStatus, ReviewStatus, HashSet<&str>)> =
        BTreeMap::new();

    for unit in units {
        let key = (
            unit.type_id.as_str(),
            unit.title.as_str(),
            unit.status.as_str(),
            unit.review_status.as_str(),
        );
        groups
            .entry(key)
            .or_insert_with(|| (unit.status, unit.review_status, HashSet::new()))
            .2
            .insert(unit.id.as_str());
    }

    groups
        .into_iter()
        .map(|((type_id, title, _, _), (status, review_status, ids))| SummaryRow {
            type_id: type_id.to_string(),
            title: title.to_string(),
            status,
            review_status,
            n_units: ids.len(),
        })
        .collect()
}

/// Count distinct HITs each worker submitted against, sorted by worker id.
pub fn summarize_workers(submissions: &[Submission]) -> Vec<WorkerRow> {
    let mut groups: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();

    for sub in submissions {
        groups
            .entry(sub.worker_id.as_str())
            .or_default()
            .insert(sub.work_unit_id.as_str());
    }

    groups
        .into_iter()
        .map(|(worker_id, units)| WorkerRow {
            worker_id: worker_id.to_string(),
            n_units: units.len(),
        })
        .collect()
}

/// Sum assignment counters over the HITs of one type.
pub fn unit_totals(units: &[WorkUnit], type_id: &str) -> UnitTotals {
    units
        .iter()
        .filter(|u| u.type_id == type_id)
        .fold(UnitTotals::default(), |mut totals, unit| {
            totals.available += unit.counts.available;
            totals.pending += unit.counts.pending;
            totals.completed += unit.counts.completed;
            totals
        })
}

/// Headline counts over a retrieved assignment set.
pub fn submission_stats(submissions: &[Submission]) -> SubmissionStats {
    SubmissionStats {
        pending_review: submissions
            .iter()
            .filter(|s| s.status == SubmissionStatus::Submitted)
            .count(),
        total: submissions.len(),
        extraction_errors: submissions
            .iter()
            .filter(|s| s.extraction_error().is_some())
            .count(),
    }
}

/// Distinct top-level answer fields over the decoded submissions, sorted.
pub fn answer_fields(submissions: &[Submission]) -> Vec<String> {
    submissions
        .iter()
        .filter_map(Submission::answer)
        .flat_map(AnswerPayload::fields)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Distinct `(type id, title)` pairs, sorted.
pub fn hit_types(units: &[WorkUnit]) -> Vec<HitType> {
    units
        .iter()
        .map(|u| HitType {
            type_id: u.type_id.clone(),
            title: u.title.clone(),
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Ids of the HITs of one type, in listing order.
pub fn units_of_type(units: &[WorkUnit], type_id: &str) -> Vec<String> {
    units
        .iter()
        .filter(|u| u.type_id == type_id)
        .map(|u| u.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, ExtractionError};
    use crate::models::{AnswerOutcome, AssignmentCounts};
    use crate::records::normalize_work_unit;
    use crate::retrieval::orchestrator::tests::{envelope, raw_assignment, raw_hit, FakeService};
    use crate::retrieval::retrieve_submissions;
    use serde_json::json;

    fn unit(id: &str, type_id: &str, title: &str, status: WorkUnitStatus) -> WorkUnit {
        WorkUnit {
            id: id.to_string(),
            type_id: type_id.to_string(),
            title: title.to_string(),
            status,
            review_status: ReviewStatus::NotReviewed,
            counts: AssignmentCounts::default(),
            expiration: None,
        }
    }

    fn submission(id: &str, unit: &str, worker: &str, status: SubmissionStatus) -> Submission {
        Submission {
            id: id.to_string(),
            work_unit_id: unit.to_string(),
            type_id: "T1".to_string(),
            worker_id: worker.to_string(),
            status,
            elapsed_seconds: Some(10),
            outcome: AnswerOutcome::Answer(AnswerPayload::default()),
        }
    }

    #[test]
    fn test_summary_groups_and_sorts() {
        let units = vec![
            unit("H3", "T2", "Transcribe", WorkUnitStatus::Assignable),
            unit("H1", "T1", "Label", WorkUnitStatus::Reviewable),
            unit("H2", "T1", "Label", WorkUnitStatus::Reviewable),
            unit("H4", "T1", "Label", WorkUnitStatus::Assignable),
        ];

        let rows = summarize_work_units(&units);

        assert_eq!(rows.len(), 3);
        assert_eq!(
            (rows[0].type_id.as_str(), rows[0].status, rows[0].n_units),
            ("T1", WorkUnitStatus::Assignable, 1)
        );
        assert_eq!(
            (rows[1].type_id.as_str(), rows[1].status, rows[1].n_units),
            ("T1", WorkUnitStatus::Reviewable, 2)
        );
        assert_eq!(rows[2].type_id, "T2");
    }

    #[test]
    fn test_summary_counts_distinct_ids() {
        let units = vec![
            unit("H1", "T1", "Label", WorkUnitStatus::Reviewable),
            unit("H1", "T1", "Label", WorkUnitStatus::Reviewable),
        ];
        assert_eq!(summarize_work_units(&units)[0].n_units, 1);
    }

    #[test]
    fn test_summary_is_order_independent() {
        let mut units = vec![
            unit("H1", "T2", "B", WorkUnitStatus::Disposed),
            unit("H2", "T1", "A", WorkUnitStatus::Reviewing),
            unit("H3", "T1", "A", WorkUnitStatus::Unassignable),
            unit("H4", "T1", "C", WorkUnitStatus::Reviewing),
            unit("H5", "T2", "B", WorkUnitStatus::Disposed),
        ];
        let expected = summarize_work_units(&units);

        units.reverse();
        assert_eq!(summarize_work_units(&units), expected);
        units.rotate_left(2);
        assert_eq!(summarize_work_units(&units), expected);
        assert_eq!(summarize_work_units(&units), summarize_work_units(&units));
    }

    #[test]
    fn test_worker_count_uses_distinct_units() {
        let subs = vec![
            submission("A1", "H1", "W1", SubmissionStatus::Submitted),
            submission("A2", "H1", "W1", SubmissionStatus::Approved),
            submission("A3", "H2", "W1", SubmissionStatus::Submitted),
            submission("A4", "H2", "W2", SubmissionStatus::Rejected),
        ];

        let rows = summarize_workers(&subs);

        assert_eq!(
            rows,
            vec![
                WorkerRow {
                    worker_id: "W1".to_string(),
                    n_units: 2
                },
                WorkerRow {
                    worker_id: "W2".to_string(),
                    n_units: 1
                },
            ]
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert!(summarize_work_units(&[]).is_empty());
        assert!(summarize_workers(&[]).is_empty());
        assert!(hit_types(&[]).is_empty());
        assert_eq!(unit_totals(&[], "T1"), UnitTotals::default());
        assert_eq!(submission_stats(&[]).total, 0);
    }

    #[test]
    fn test_submission_stats() {
        let mut failed = submission("A3", "H2", "W2", SubmissionStatus::Approved);
        failed.outcome = AnswerOutcome::ExtractionError(ExtractionError {
            submission_id: "A3".to_string(),
            cause: DecodeError::NoFreeText,
        });
        let subs = vec![
            submission("A1", "H1", "W1", SubmissionStatus::Submitted),
            submission("A2", "H1", "W2", SubmissionStatus::Submitted),
            failed,
        ];

        let stats = submission_stats(&subs);
        assert_eq!(stats.pending_review, 2);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.extraction_errors, 1);
    }

    #[test]
    fn test_answer_fields_skips_failed_extractions() {
        let mut first = submission("A1", "H1", "W1", SubmissionStatus::Submitted);
        first.outcome = AnswerOutcome::Answer(AnswerPayload(
            json!({"label": "cat", "confidence": 3}).as_object().cloned().unwrap(),
        ));
        let mut second = submission("A2", "H1", "W2", SubmissionStatus::Submitted);
        second.outcome = AnswerOutcome::Answer(AnswerPayload(
            json!({"label": "dog", "note": ""}).as_object().cloned().unwrap(),
        ));
        let mut failed = submission("A3", "H2", "W2", SubmissionStatus::Submitted);
        failed.outcome = AnswerOutcome::ExtractionError(ExtractionError {
            submission_id: "A3".to_string(),
            cause: DecodeError::MissingEnvelope,
        });

        assert_eq!(
            answer_fields(&[first, second, failed]),
            vec!["confidence", "label", "note"]
        );
    }

    #[test]
    fn test_hit_types_and_units_of_type() {
        let units = vec![
            unit("H2", "T2", "B", WorkUnitStatus::Assignable),
            unit("H1", "T1", "A", WorkUnitStatus::Assignable),
            unit("H3", "T2", "B", WorkUnitStatus::Reviewable),
        ];

        let types = hit_types(&units);
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].type_id, "T1");
        assert_eq!(units_of_type(&units, "T2"), vec!["H2", "H3"]);
    }

    #[tokio::test]
    async fn test_end_to_end_two_units_one_worker() {
        let units: Vec<WorkUnit> = vec![raw_hit("H1", "T1", 1, 0, 2), raw_hit("H2", "T1", 0, 1, 1)]
            .into_iter()
            .map(|raw| normalize_work_unit(raw).unwrap())
            .collect();

        let summary = summarize_work_units(&units);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].n_units, 2);

        let totals = unit_totals(&units, "T1");
        assert_eq!(
            totals,
            UnitTotals {
                available: 1,
                pending: 1,
                completed: 3
            }
        );

        let mut service = FakeService::default();
        service.assignments.insert(
            "H1".to_string(),
            vec![
                raw_assignment("A1", "H1", "W1", Some(envelope(r#"{"x": 1}"#))),
                raw_assignment("A2", "H1", "W1", Some(envelope(r#"{"x": 2}"#))),
            ],
        );
        service.assignments.insert(
            "H2".to_string(),
            vec![raw_assignment("A3", "H2", "W1", Some(envelope(r#"{"x": 3}"#)))],
        );

        let unit_ids = units_of_type(&units, "T1");
        let subs = retrieve_submissions(&service, "T1", &unit_ids, |_| {})
            .await
            .unwrap();

        assert_eq!(subs.len(), 3);
        assert_eq!(
            summarize_workers(&subs),
            vec![WorkerRow {
                worker_id: "W1".to_string(),
                n_units: 2
            }]
        );
    }
}
