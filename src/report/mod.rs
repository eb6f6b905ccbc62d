//! Report rendering and assignment export.

pub mod export;
pub mod generator;

pub use export::export_submissions;
pub use generator::{generate_json_report, generate_markdown_report};
