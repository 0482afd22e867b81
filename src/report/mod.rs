//! Output rendering.

pub mod generator;

pub use generator::{generate_json_report, generate_summary_text, write_json_report};
