//! Retrieval passes over the task service.
//!
//! A pass either finishes with a complete, possibly partially-errored set of
//! records or fails outright on a service error or malformed record. Answer
//! extraction failures are kept on their [`Submission`] and never end a pass.

use crate::error::{DecodeError, ExtractionError, MalformedRecord, RetrievalError};
use crate::models::{AnswerOutcome, Submission, WorkUnit};
use crate::records::{decode_answer, normalize_submission, normalize_work_unit, SubmissionRecord};
use crate::retrieval::{paginate, CursorPage, PAGE_SIZE};
use crate::service::{ListReviewableResponse, ListWorkUnitsResponse, TaskService};
use tracing::{debug, info, warn};

/// Ceiling on reviewable HIT discovery; high enough not to truncate real workloads.
pub const REVIEWABLE_CEILING: usize = 10_000;

/// List up to `max_units` HITs and normalize them.
pub async fn list_work_units<S, G>(
    service: &S,
    max_units: usize,
    progress: G,
) -> Result<Vec<WorkUnit>, RetrievalError>
where
    S: TaskService + ?Sized,
    G: FnMut(f64),
{
    let raw = paginate(
        move |size, cursor| service.list_work_units(size, cursor),
        |resp: ListWorkUnitsResponse| resp.hits,
        max_units,
        progress,
    )
    .await?;

    info!("Listed {} HITs", raw.len());

    raw.into_iter()
        .map(normalize_work_unit)
        .collect::<Result<Vec<_>, _>>()
        .map_err(RetrievalError::from)
}

/// Ids of the reviewable HITs of a type, in listing order.
pub async fn discover_reviewable<S, G>(
    service: &S,
    type_id: &str,
    ceiling: usize,
    progress: G,
) -> Result<Vec<String>, RetrievalError>
where
    S: TaskService + ?Sized,
    G: FnMut(f64),
{
    let refs = paginate(
        move |size, cursor| service.list_reviewable_work_units(type_id, size, cursor),
        |resp: ListReviewableResponse| resp.hits,
        ceiling,
        progress,
    )
    .await?;

    let ids = refs
        .into_iter()
        .map(|r| r.hit_id.ok_or_else(|| MalformedRecord::new("HIT", None, "HITId")))
        .collect::<Result<Vec<_>, _>>()?;

    info!("Found {} reviewable HITs for type {}", ids.len(), type_id);
    Ok(ids)
}

/// Fetch and decode the assignments of every listed HIT.
///
/// One listing call per HIT, capped at [`PAGE_SIZE`] assignments. Results
/// keep HIT order, then the service's order within a HIT. `progress`
/// receives `processed / total` after each HIT and 1.0 at the end.
pub async fn retrieve_submissions<S, G>(
    service: &S,
    type_id: &str,
    unit_ids: &[String],
    mut progress: G,
) -> Result<Vec<Submission>, RetrievalError>
where
    S: TaskService + ?Sized,
    G: FnMut(f64),
{
    let total = unit_ids.len();
    let mut submissions = Vec::new();
    let mut failed = 0usize;

    for (index, unit_id) in unit_ids.iter().enumerate() {
        let resp = service.list_submissions(unit_id, PAGE_SIZE).await?;
        if resp.next_cursor().is_some() {
            warn!(
                "HIT {} has more than {} assignments; only the first page was retrieved",
                unit_id, PAGE_SIZE
            );
        }

        debug!("HIT {}: {} assignments", unit_id, resp.assignments.len());

        for raw in resp.assignments {
            let record = normalize_submission(raw)?;
            let submission = attach_answer(record, type_id);
            if submission.extraction_error().is_some() {
                failed += 1;
            }
            submissions.push(submission);
        }

        progress((index + 1) as f64 / total as f64);
    }
    progress(1.0);

    info!(
        "Retrieved {} assignments from {} HITs ({} with extraction errors)",
        submissions.len(),
        total,
        failed
    );

    Ok(submissions)
}

/// Discover the reviewable HITs of a type and retrieve all their assignments.
///
/// Returns the discovered HIT ids alongside the submissions, since HITs
/// without assignments leave no trace in the latter.
pub async fn review_submissions<S, D, G>(
    service: &S,
    type_id: &str,
    ceiling: usize,
    discovery_progress: D,
    unit_progress: G,
) -> Result<(Vec<String>, Vec<Submission>), RetrievalError>
where
    S: TaskService + ?Sized,
    D: FnMut(f64),
    G: FnMut(f64),
{
    let unit_ids = discover_reviewable(service, type_id, ceiling, discovery_progress).await?;
    let submissions = retrieve_submissions(service, type_id, &unit_ids, unit_progress).await?;
    Ok((unit_ids, submissions))
}

/// Decode the record's envelope; failures are stored, not returned.
fn attach_answer(record: SubmissionRecord, type_id: &str) -> Submission {
    let decoded = match record.envelope.as_deref() {
        Some(envelope) => decode_answer(envelope),
        None => Err(DecodeError::MissingEnvelope),
    };

    let outcome = match decoded {
        Ok(payload) => AnswerOutcome::Answer(payload),
        Err(cause) => {
            warn!("Assignment {}: {}", record.id, cause);
            AnswerOutcome::ExtractionError(ExtractionError {
                submission_id: record.id.clone(),
                cause,
            })
        }
    };

    record.into_submission(type_id, outcome)
}
