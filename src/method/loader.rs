use std::path::{Path, PathBuf};
use std::{fs, io};

use log::{info, warn};
use serde::Deserialize;

use crate::config::settings::Settings;
use crate::error::SubmitError;
use crate::method::registry::Registry;
use crate::method::variant::{Layout, Method};
use crate::slurm::directive::Directives;
use crate::slurm::multiple::{folder_data, numbered_folders, FolderSet, MultipleFolders};
use crate::template::render::render_variable;

/// A method described by a JSON file in a template directory
///
/// ```json
/// {
///   "name": "orca",
///   "command": "orca {input_name} > {output}",
///   "directives": [{"name": "account", "value": "{account}"}, {"name": "exclusive"}],
///   "questions": {"account": "project_2004504"},
///   "sweep": {"copy_files": ["{input}"], "template_files": ["geom.xyz"]}
/// }
/// ```
///
/// Every `{name}` in `command`, directive values and sweep file names is a template variable.
/// A literal brace is written `\{`: shell expansion becomes `$\{TMPDIR}`, or `"$\\{TMPDIR}"`
/// inside the JSON string.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodFile {
    pub name: String,
    #[serde(default)]
    pub command: String,
    /// Added to the default header, replacing directives with the same name
    #[serde(default)]
    pub directives: Vec<DirectiveFile>,
    /// Option defaults added to the schema when this method is selected
    #[serde(default)]
    pub questions: Settings,
    pub sweep: Option<SweepFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectiveFile {
    pub name: String,
    pub value: Option<String>,
}

/// Numbered job folders, sized by the options named here
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepFile {
    #[serde(default = "default_count_option")]
    pub count: String,
    #[serde(default = "default_prefix_option")]
    pub prefix: String,
    /// Template expressions, rendered before use
    #[serde(default)]
    pub copy_files: Vec<String>,
    #[serde(default)]
    pub template_files: Vec<String>,
}

fn default_count_option() -> String {
    "count".to_string()
}

fn default_prefix_option() -> String {
    "prefix".to_string()
}

/// `~/templates/submitter`
pub fn default_search_paths() -> Vec<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join("templates").join("submitter"))
        .into_iter()
        .collect()
}

/// Register every method file found in `paths`, returns how many were loaded
///
/// Unreadable directories and broken files are skipped.
pub fn load_methods(paths: &[PathBuf], registry: &mut Registry) -> usize {
    let mut loaded = 0;
    for dir in paths {
        let files = match get_method_paths(dir) {
            Ok(files) => files,
            Err(err) => {
                info!("No methods loaded from {}: {}", dir.display(), err);
                continue;
            }
        };
        for path in files {
            match read_method(&path) {
                Ok(method) => {
                    info!("Loaded method {} from {}", method.name, path.display());
                    register(registry, method);
                    loaded += 1;
                }
                Err(err) => warn!("Skipping method file {}: {}", path.display(), err),
            }
        }
    }
    loaded
}

/// JSON files directly inside `dir`, sorted so later files win consistently
fn get_method_paths(dir: &Path) -> Result<Vec<PathBuf>, io::Error> {
    let mut paths = fs::read_dir(dir)?
        .map(|res| res.map(|e| e.path()))
        .collect::<Result<Vec<PathBuf>, io::Error>>()?;
    paths.retain(|path| path.extension().is_some_and(|ext| ext == "json"));
    paths.sort();
    Ok(paths)
}

pub fn read_method(path: &Path) -> Result<MethodFile, SubmitError> {
    let content = fs::read_to_string(path).map_err(|err| SubmitError::fs(path, err))?;
    serde_json::from_str::<MethodFile>(&content)
        .map_err(|err| SubmitError::Configuration(format!("{}: {}", path.display(), err)))
}

pub fn register(registry: &mut Registry, method: MethodFile) {
    let name = method.name.clone();
    let questions = method.questions.clone();
    registry.register(&name, questions, move |_| Box::new(TemplateMethod::new(method.clone())));
}

/// Method built from a [`MethodFile`]
pub struct TemplateMethod {
    file: MethodFile,
    copy_files: Vec<PathBuf>,
    template_files: Vec<PathBuf>,
}

impl TemplateMethod {
    pub fn new(file: MethodFile) -> TemplateMethod {
        TemplateMethod { file, copy_files: Vec::new(), template_files: Vec::new() }
    }
}

impl Method for TemplateMethod {
    fn command(&self) -> &str {
        &self.file.command
    }

    fn directives(&self) -> Directives {
        let mut directives = Directives::sbatch_defaults();
        for directive in &self.file.directives {
            directives.set(&directive.name, directive.value.clone());
        }
        directives
    }

    fn setup(&mut self, general: &mut Settings, config: &Settings) -> Result<(), SubmitError> {
        let Some(sweep) = &self.file.sweep else {
            return Ok(());
        };
        let render_all = |files: &[String]| {
            files
                .iter()
                .map(|file| render_variable(file, general, config).map(|path| PathBuf::from(path.trim())))
                .collect::<Result<Vec<PathBuf>, SubmitError>>()
        };
        self.copy_files = render_all(&sweep.copy_files)?;
        self.template_files = render_all(&sweep.template_files)?;
        Ok(())
    }

    fn layout(&self) -> Layout<'_> {
        match self.file.sweep {
            Some(_) => Layout::Multiple(self),
            None => Layout::Single,
        }
    }
}

impl MultipleFolders for TemplateMethod {
    fn generate_folder_names(&self, general: &Settings) -> Result<FolderSet, SubmitError> {
        let sweep = self
            .file
            .sweep
            .as_ref()
            .ok_or_else(|| SubmitError::Configuration(format!("method '{}' has no sweep", self.file.name)))?;
        let count = general
            .get(&sweep.count)
            .and_then(|value| value.as_u64())
            .ok_or_else(|| SubmitError::Configuration(format!("'{}' must be a positive integer", sweep.count)))?;
        let prefix = general.get_str(&sweep.prefix).unwrap_or("run");
        Ok(numbered_folders(prefix, count as usize))
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
