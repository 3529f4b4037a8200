//! Shared building blocks for the zagent workspace.
//!
//! [`types`] holds the metric data model that flows from the source readers
//! through the aggregator to the recorder and transmitter. [`command`] is the
//! narrow seam through which every external utility is invoked, so the rest of
//! the pipeline can be exercised with canned output.

pub mod command;
pub mod error;
pub mod types;
