//! Aggregation of retrieved records into summary tables.

pub mod aggregator;

pub use aggregator::*;
