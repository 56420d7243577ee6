//! Computational methods a submit script can be rendered for

/// The method trait and how its jobs are laid out
pub mod variant;

/// Select methods by name
pub mod registry;

pub mod builtin;

/// Methods described by JSON files in template directories
pub mod loader;
