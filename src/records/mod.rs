//! Record normalization and answer decoding.
//!
//! Both steps are pure: they take what the service returned and produce
//! model values or a typed error, with no I/O.

pub mod decoder;
pub mod normalizer;

pub use decoder::decode_answer;
pub use normalizer::{normalize_submission, normalize_work_unit, SubmissionRecord};
