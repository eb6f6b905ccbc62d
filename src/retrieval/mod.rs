//! Retrieval of HITs and assignments from the task service.

pub mod orchestrator;
pub mod paginator;

pub use orchestrator::{list_work_units, retrieve_submissions, review_submissions};
pub use paginator::{paginate, CursorPage, PAGE_SIZE};
