//! Analysis modules.
//!
//! Turns raw appearance records into per-year counts.

pub mod aggregator;

pub use aggregator::*;
