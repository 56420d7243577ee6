//! Render template expressions against the general settings and the configuration

/// Find the variables a template refers to
pub mod scan;

/// Substitute variables into expressions, documents and template files
pub mod render;
