//! Turn a configuration into one submission of the selected method

use log::info;

use crate::config::options::{self, OptionLayers, DEFAULT_METHOD};
use crate::config::settings::Settings;
use crate::error::SubmitError;
use crate::method::registry::Registry;
use crate::queue::Queue;
use crate::slurm::folder::base_name;
use crate::slurm::script::SubmitScript;

pub struct Submitter {
    registry: Registry,
}

impl Submitter {
    pub fn new(registry: Registry) -> Submitter {
        Submitter { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Merge all option layers with the questions of the requested method and check the result
    pub fn configure(&self, layers: &OptionLayers) -> Result<Settings, SubmitError> {
        let method = layers.method();
        let questions = self.registry.questions(&method)?;
        let config = layers.merge(questions);
        options::validate(&config)?;
        Ok(config)
    }

    /// Submit one calculation with the given configuration
    pub fn run(&self, config: Settings) -> Result<(), SubmitError> {
        let walltime = walltime(&config)?;
        let mut script = self.generate_plugin(config)?;
        info!("Submitting method {} with walltime {}", script.name(), walltime);
        script.submit_calc(walltime)
    }

    fn generate_plugin(&self, config: Settings) -> Result<SubmitScript, SubmitError> {
        let general = general_settings(&config);
        let method = config.get_str("method").unwrap_or(DEFAULT_METHOD).to_string();
        self.registry.plugin_from_config(&method, config, general)
    }
}

/// Walltime of the configured queue
pub fn walltime(config: &Settings) -> Result<&'static str, SubmitError> {
    let queue: Queue = config.get_str("queue").unwrap_or_default().parse()?;
    Ok(queue.walltime())
}

/// Seed the general settings of a submission from its configuration
///
/// Adds `output` (the input's file name plus `.out`) when it isn't configured, and `input_name`.
pub fn general_settings(config: &Settings) -> Settings {
    let mut general = config.clone();
    if let Some(input) = config.get_str("input") {
        let name = base_name(input);
        if !config.contains("output") {
            general.insert("output", format!("{name}.out"));
        }
        general.insert("input_name", name);
    }
    general
}
