//! Methods shipped with the submitter

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::config::settings::Settings;
use crate::error::SubmitError;
use crate::method::registry::Registry;
use crate::method::variant::{Layout, Method};
use crate::slurm::multiple::{folder_data, numbered_folders, FolderSet, MultipleFolders};

/// Q-Chem run on the cores of one node
static QCHEM: &str = "qchem -nt {ntasks_per_node} {input_name} {output}";

pub fn register(registry: &mut Registry) {
    registry.register("basic", Settings::new(), |_| Box::new(Basic));
    registry.register("qchem", Settings::new(), |_| Box::new(QChem));
    let questions: Settings = [
        ("count", json!(1)),
        ("prefix", json!("run")),
        ("template_files", json!([])),
    ]
    .into_iter()
    .collect();
    registry.register("sweep", questions, |_| Box::new(Sweep::default()));
}

/// Header only
pub struct Basic;

impl Method for Basic {}

pub struct QChem;

impl Method for QChem {
    fn command(&self) -> &str {
        QCHEM
    }
}

/// The Q-Chem job repeated in `count` folders named `<prefix><index>`
///
/// The input file is copied into every folder and each entry of `template_files` is rendered
/// there with the folder's `index` and `folder` added to the configuration.
#[derive(Default)]
pub struct Sweep {
    copy_files: Vec<PathBuf>,
    template_files: Vec<PathBuf>,
}

impl Method for Sweep {
    fn command(&self) -> &str {
        QCHEM
    }

    fn setup(&mut self, general: &mut Settings, _config: &Settings) -> Result<(), SubmitError> {
        count(general)?;
        let input = general
            .get_str("input")
            .ok_or_else(|| SubmitError::Configuration("sweep needs an input file".to_string()))?;
        self.copy_files = vec![PathBuf::from(input)];
        self.template_files = path_list(general.get("template_files"))?;
        Ok(())
    }

    fn layout(&self) -> Layout<'_> {
        Layout::Multiple(self)
    }
}

impl MultipleFolders for Sweep {
    fn generate_folder_names(&self, general: &Settings) -> Result<FolderSet, SubmitError> {
        let prefix = general.get_str("prefix").unwrap_or("run");
        Ok(numbered_folders(prefix, count(general)?))
    }

    fn copy_files(&self) -> &[PathBuf] {
        &self.copy_files
    }

    fn template_files(&self) -> &[PathBuf] {
        &self.template_files
    }

    fn render_data(&self, index: usize, folder: &Path, config: &Settings) -> Settings {
        folder_data(index, folder, config)
    }
}

fn count(general: &Settings) -> Result<usize, SubmitError> {
    match general.get("count").and_then(Value::as_u64) {
        Some(n) if n > 0 => Ok(n as usize),
        _ => Err(SubmitError::Configuration("'count' must be a positive integer".to_string())),
    }
}

/// A JSON list of paths; unset means none
pub fn path_list(value: Option<&Value>) -> Result<Vec<PathBuf>, SubmitError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let invalid = || SubmitError::Configuration(format!("expected a list of file names, got {value}"));
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|entry| entry.as_str().map(PathBuf::from).ok_or_else(invalid))
        .collect()
}
