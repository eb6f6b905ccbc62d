//! Conversion of raw listing records into the internal model.

use crate::error::MalformedRecord;
use crate::models::{
    AnswerOutcome, AssignmentCounts, ReviewStatus, Submission, SubmissionStatus, WorkUnit,
    WorkUnitStatus,
};
use crate::service::{RawSubmission, RawWorkUnit};
use aws_sdk_mturk::primitives::DateTime as ServiceTime;
use chrono::{DateTime, Utc};
use tracing::warn;

const HIT: &str = "HIT";
const ASSIGNMENT: &str = "assignment";

/// A normalized assignment whose answer has not been decoded yet.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub id: String,
    pub work_unit_id: String,
    pub worker_id: String,
    pub status: SubmissionStatus,
    pub elapsed_seconds: Option<u64>,
    /// Raw answer XML, absent when the service sent none.
    pub envelope: Option<String>,
}

impl SubmissionRecord {
    /// Attach the answer outcome and the HIT type the record was retrieved for.
    pub fn into_submission(self, type_id: &str, outcome: AnswerOutcome) -> Submission {
        Submission {
            id: self.id,
            work_unit_id: self.work_unit_id,
            type_id: type_id.to_string(),
            worker_id: self.worker_id,
            status: self.status,
            elapsed_seconds: self.elapsed_seconds,
            outcome,
        }
    }
}

/// Convert a listed HIT.
pub fn normalize_work_unit(raw: RawWorkUnit) -> Result<WorkUnit, MalformedRecord> {
    let id = raw
        .hit_id
        .ok_or_else(|| MalformedRecord::new(HIT, None, "HITId"))?;
    let missing = |field| MalformedRecord::new(HIT, Some(id.as_str()), field);

    let type_id = raw.hit_type_id.ok_or_else(|| missing("HITTypeId"))?;
    let title = raw.title.ok_or_else(|| missing("Title"))?;
    let status = raw
        .hit_status
        .as_deref()
        .and_then(WorkUnitStatus::parse)
        .ok_or_else(|| missing("HITStatus"))?;
    let review_status = raw
        .review_status
        .as_deref()
        .and_then(ReviewStatus::parse)
        .ok_or_else(|| missing("HITReviewStatus"))?;
    let counts = AssignmentCounts {
        available: raw
            .assignments_available
            .ok_or_else(|| missing("NumberOfAssignmentsAvailable"))?,
        pending: raw
            .assignments_pending
            .ok_or_else(|| missing("NumberOfAssignmentsPending"))?,
        completed: raw
            .assignments_completed
            .ok_or_else(|| missing("NumberOfAssignmentsCompleted"))?,
    };
    let expiration = match raw.expiration {
        Some(ts) => Some(to_datetime(&ts).ok_or_else(|| missing("Expiration"))?),
        None => None,
    };

    Ok(WorkUnit {
        id,
        type_id,
        title,
        status,
        review_status,
        counts,
        expiration,
    })
}

/// Convert a listed assignment, computing its elapsed time.
pub fn normalize_submission(raw: RawSubmission) -> Result<SubmissionRecord, MalformedRecord> {
    let id = raw
        .assignment_id
        .ok_or_else(|| MalformedRecord::new(ASSIGNMENT, None, "AssignmentId"))?;
    let missing = |field| MalformedRecord::new(ASSIGNMENT, Some(id.as_str()), field);

    let work_unit_id = raw.hit_id.ok_or_else(|| missing("HITId"))?;
    let worker_id = raw.worker_id.ok_or_else(|| missing("WorkerId"))?;
    let status = raw
        .assignment_status
        .as_deref()
        .and_then(SubmissionStatus::parse)
        .ok_or_else(|| missing("AssignmentStatus"))?;
    let accept_time = raw
        .accept_time
        .as_ref()
        .and_then(to_datetime)
        .ok_or_else(|| missing("AcceptTime"))?;
    let submit_time = raw
        .submit_time
        .as_ref()
        .and_then(to_datetime)
        .ok_or_else(|| missing("SubmitTime"))?;

    let elapsed_seconds = elapsed_seconds(accept_time, submit_time);
    if elapsed_seconds.is_none() {
        warn!(
            "Assignment {} was accepted at {} after its submit time {}",
            id, accept_time, submit_time
        );
    }

    Ok(SubmissionRecord {
        id,
        work_unit_id,
        worker_id,
        status,
        elapsed_seconds,
        envelope: raw.answer,
    })
}

/// Whole seconds between accept and submit, truncated; `None` if inverted.
pub fn elapsed_seconds(accept: DateTime<Utc>, submit: DateTime<Utc>) -> Option<u64> {
    if submit < accept {
        return None;
    }
    u64::try_from((submit - accept).num_seconds()).ok()
}

/// `None` when the instant is outside chrono's range.
fn to_datetime(ts: &ServiceTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}
