use crate::config::settings::Settings;
use crate::error::SubmitError;
use crate::slurm::directive::Directives;
use crate::slurm::multiple::MultipleFolders;

/// How the rendered script is laid out on disk
pub enum Layout<'a> {
    /// One submit file in the invocation directory
    Single,
    /// The same submit file in every folder of a sweep
    Multiple(&'a dyn MultipleFolders),
}

/// A computational method that can be turned into a submit script
///
/// The default is a plain job with the standard header and no command.
pub trait Method {
    /// Command block template
    fn command(&self) -> &str {
        ""
    }

    fn directives(&self) -> Directives {
        Directives::sbatch_defaults()
    }

    /// Called once before rendering, may check options or derive new general settings
    fn setup(&mut self, _general: &mut Settings, _config: &Settings) -> Result<(), SubmitError> {
        Ok(())
    }

    fn layout(&self) -> Layout<'_> {
        Layout::Single
    }
}
