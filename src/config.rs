//! Option values a submission is configured with

/// Named values and the two-layer lookup used when rendering
pub mod settings;

/// Defaults, layering and validation of the options every method understands
pub mod options;
