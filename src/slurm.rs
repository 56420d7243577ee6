//! Render submit scripts, write them to disk and hand them to SLURM

/// Ordered `#SBATCH` header directives
pub mod directive;

/// A submission of one method: render, write, submit, delete and show
pub mod script;

/// Fan one rendered script out into many job folders
pub mod multiple;

/// Scoped working directory changes and file copies
pub mod folder;

/// Run sbatch and squeue
pub mod command;
