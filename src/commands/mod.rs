pub mod analyze;

// Re-export command functions for convenience
pub use analyze::{analyze, AnalyzeParams};
