//! Database access.

pub mod loader;

pub use loader::{load_dataset, ShowFilter};
