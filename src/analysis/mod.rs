//! Report aggregation engine.
//!
//! Collector → (overlap, coverage differences, sentiment tally) →
//! verdict → assembler. No stage mutates another's output.

pub mod aggregator;
pub mod assembler;
pub mod collector;
pub mod engine;
pub mod verdict;

pub use collector::{AnnotationPolicy, Collector};
pub use engine::ReportEngine;
