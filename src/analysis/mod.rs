//! Analysis modules.
//!
//! Timestamp handling, per-identifier aggregation of click events, and the
//! final join against the link registry.

pub mod aggregator;
pub mod assembler;
pub mod timestamp;

pub use aggregator::aggregate_events;
pub use assembler::assemble_results;
