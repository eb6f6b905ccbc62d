//! Boundary to the remote task service.
//!
//! [`TaskService`] names the four operations the dashboard consumes. The raw
//! records carry what the service returned with every field optional, so
//! that a missing field surfaces as a [`MalformedRecord`] during
//! normalization rather than failing a whole page.
//!
//! [`MalformedRecord`]: crate::error::MalformedRecord

pub mod client;

pub use client::{Environment, MturkClient};

use crate::error::ServiceError;
use crate::retrieval::CursorPage;
use async_trait::async_trait;
use aws_sdk_mturk::primitives::DateTime;

/// Operations the retrieval pipeline needs from the service.
///
/// Every call is awaited to completion before the next one is issued.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// One page of all HITs owned by the requester.
    async fn list_work_units(
        &self,
        page_size: u32,
        cursor: Option<String>,
    ) -> Result<ListWorkUnitsResponse, ServiceError>;

    /// One page of reviewable HIT ids for a HIT type.
    async fn list_reviewable_work_units(
        &self,
        type_id: &str,
        page_size: u32,
        cursor: Option<String>,
    ) -> Result<ListReviewableResponse, ServiceError>;

    /// The first page of assignments for a HIT.
    async fn list_submissions(
        &self,
        work_unit_id: &str,
        page_size: u32,
    ) -> Result<ListSubmissionsResponse, ServiceError>;

    /// Available prepaid balance, as the service's decimal string.
    async fn account_balance(&self) -> Result<String, ServiceError>;
}

/// A HIT exactly as listed by the service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawWorkUnit {
    pub hit_id: Option<String>,
    pub hit_type_id: Option<String>,
    pub title: Option<String>,
    pub hit_status: Option<String>,
    pub review_status: Option<String>,
    pub expiration: Option<DateTime>,
    pub assignments_pending: Option<u64>,
    pub assignments_available: Option<u64>,
    pub assignments_completed: Option<u64>,
}

/// The id-only HIT shape returned by the reviewable listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkUnitRef {
    pub hit_id: Option<String>,
}

/// An assignment exactly as listed by the service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSubmission {
    pub assignment_id: Option<String>,
    pub hit_id: Option<String>,
    pub worker_id: Option<String>,
    pub assignment_status: Option<String>,
    pub accept_time: Option<DateTime>,
    pub submit_time: Option<DateTime>,
    /// QuestionFormAnswers XML envelope.
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListWorkUnitsResponse {
    pub hits: Vec<RawWorkUnit>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListReviewableResponse {
    pub hits: Vec<WorkUnitRef>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListSubmissionsResponse {
    pub assignments: Vec<RawSubmission>,
    pub next_token: Option<String>,
}

impl CursorPage for ListWorkUnitsResponse {
    fn next_cursor(&self) -> Option<&str> {
        self.next_token.as_deref()
    }
}

impl CursorPage for ListReviewableResponse {
    fn next_cursor(&self) -> Option<&str> {
        self.next_token.as_deref()
    }
}

impl CursorPage for ListSubmissionsResponse {
    fn next_cursor(&self) -> Option<&str> {
        self.next_token.as_deref()
    }
}
