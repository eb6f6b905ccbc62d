//! Data models for HITs, assignments, and the summaries derived from them.
//!
//! Every record here is an immutable value: a retrieval pass builds a fresh
//! set and nothing is updated in place.

use crate::error::ExtractionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Lifecycle state of a HIT as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkUnitStatus {
    Assignable,
    Unassignable,
    Reviewable,
    Reviewing,
    Disposed,
}

impl WorkUnitStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Assignable" => Some(Self::Assignable),
            "Unassignable" => Some(Self::Unassignable),
            "Reviewable" => Some(Self::Reviewable),
            "Reviewing" => Some(Self::Reviewing),
            "Disposed" => Some(Self::Disposed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assignable => "Assignable",
            Self::Unassignable => "Unassignable",
            Self::Reviewable => "Reviewable",
            Self::Reviewing => "Reviewing",
            Self::Disposed => "Disposed",
        }
    }
}

impl fmt::Display for WorkUnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requester-side review state of a HIT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewStatus {
    NotReviewed,
    MarkedForReview,
    ReviewedAppropriate,
    ReviewedInappropriate,
}

impl ReviewStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NotReviewed" => Some(Self::NotReviewed),
            "MarkedForReview" => Some(Self::MarkedForReview),
            "ReviewedAppropriate" => Some(Self::ReviewedAppropriate),
            "ReviewedInappropriate" => Some(Self::ReviewedInappropriate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotReviewed => "NotReviewed",
            Self::MarkedForReview => "MarkedForReview",
            Self::ReviewedAppropriate => "ReviewedAppropriate",
            Self::ReviewedInappropriate => "ReviewedInappropriate",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a single assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Submitted,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Submitted" => Some(Self::Submitted),
            "Approved" => Some(Self::Approved),
            "Rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assignment counters of a HIT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentCounts {
    pub available: u64,
    pub pending: u64,
    pub completed: u64,
}

/// A HIT: one postable task instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkUnit {
    pub id: String,
    pub type_id: String,
    pub title: String,
    pub status: WorkUnitStatus,
    pub review_status: ReviewStatus,
    pub counts: AssignmentCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
}

/// Free-form answer decoded from an assignment's FreeText field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerPayload(pub Map<String, Value>);

impl AnswerPayload {
    /// Top-level field names, in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Either the decoded answer or the reason decoding failed, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    Answer(AnswerPayload),
    ExtractionError(ExtractionError),
}

/// An assignment: one worker's attempt at a HIT.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub id: String,
    pub work_unit_id: String,
    pub type_id: String,
    pub worker_id: String,
    pub status: SubmissionStatus,
    /// Whole seconds from accept to submit; `None` when the service reports
    /// an accept time after the submit time.
    pub elapsed_seconds: Option<u64>,
    #[serde(flatten)]
    pub outcome: AnswerOutcome,
}

impl Submission {
    pub fn answer(&self) -> Option<&AnswerPayload> {
        match &self.outcome {
            AnswerOutcome::Answer(payload) => Some(payload),
            AnswerOutcome::ExtractionError(_) => None,
        }
    }

    pub fn extraction_error(&self) -> Option<&ExtractionError> {
        match &self.outcome {
            AnswerOutcome::Answer(_) => None,
            AnswerOutcome::ExtractionError(err) => Some(err),
        }
    }
}

/// One row of the HIT-type summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub type_id: String,
    pub title: String,
    pub status: WorkUnitStatus,
    pub review_status: ReviewStatus,
    pub n_units: usize,
}

/// One row of the worker summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerRow {
    pub worker_id: String,
    pub n_units: usize,
}

/// Assignment counters summed over every HIT of one type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnitTotals {
    pub available: u64,
    pub pending: u64,
    pub completed: u64,
}

/// Headline numbers over a retrieved assignment set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionStats {
    /// Assignments still in `Submitted` state.
    pub pending_review: usize,
    pub total: usize,
    pub extraction_errors: usize,
}

/// A distinct HIT type as seen in a listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HitType {
    pub type_id: String,
    pub title: String,
}

impl HitType {
    /// Short label such as `Label images - 3ZK...XQ9`.
    pub fn label(&self) -> String {
        let id = &self.type_id;
        if id.chars().count() <= 6 {
            return format!("{} - {}", self.title, id);
        }
        let head: String = id.chars().take(3).collect();
        let tail: String = id
            .chars()
            .rev()
            .take(3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("{} - {}...{}", self.title, head, tail)
    }
}

/// Metadata about a dashboard run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Environment the data came from (Sandbox or Production).
    pub environment: String,
    pub generated_at: DateTime<Utc>,
    /// Available balance, when it could be fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    /// Number of HITs listed for the summary.
    pub units_listed: usize,
    pub duration_seconds: f64,
}

/// How the HITs of a drill-down were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSource {
    /// Discovered through the reviewable-HIT listing.
    Reviewable,
    /// Taken from the HITs already listed for the summary.
    Listed,
}

impl fmt::Display for UnitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSource::Reviewable => write!(f, "reviewable HITs"),
            UnitSource::Listed => write!(f, "listed HITs"),
        }
    }
}

/// Assignment-level view of one HIT type.
#[derive(Debug, Clone, Serialize)]
pub struct DrillDown {
    pub hit_type: HitType,
    pub source: UnitSource,
    /// HITs the assignments were drawn from.
    pub units_retrieved: usize,
    pub totals: UnitTotals,
    pub workers: Vec<WorkerRow>,
    pub stats: SubmissionStats,
    /// Top-level answer fields seen across decoded assignments.
    pub answer_fields: Vec<String>,
    /// Assignments whose answer could not be decoded.
    pub extraction_errors: Vec<ExtractionError>,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub hit_summary: Vec<SummaryRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drill_down: Option<DrillDown>,
}
