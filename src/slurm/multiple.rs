use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::settings::Settings;
use crate::error::SubmitError;
use crate::slurm::command;
use crate::slurm::folder::{copy_file, Folder};
use crate::template::render::render_file;

/// One job of a sweep: its position and the directory it runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFolder {
    pub index: usize,
    pub path: PathBuf,
}

/// Every job folder of one submission, in processing order
pub type FolderSet = Vec<JobFolder>;

/// Methods that fan one rendered script out into many job folders
pub trait MultipleFolders {
    /// Folders to create for this submission
    fn generate_folder_names(&self, general: &Settings) -> Result<FolderSet, SubmitError>;

    /// Files copied unchanged into every folder
    fn copy_files(&self) -> &[PathBuf] {
        &[]
    }

    /// Files rendered with `render_data` into every folder
    fn template_files(&self) -> &[PathBuf] {
        &[]
    }

    fn render_data(&self, _index: usize, _folder: &Path, config: &Settings) -> Settings {
        config.clone()
    }
}

/// `prefix0`, `prefix1`, ... `prefix{count - 1}`
pub fn numbered_folders(prefix: &str, count: usize) -> FolderSet {
    (0..count)
        .map(|index| JobFolder { index, path: PathBuf::from(format!("{prefix}{index}")) })
        .collect()
}

/// Configuration extended with the `index` and `folder` of one job
pub fn folder_data(index: usize, folder: &Path, config: &Settings) -> Settings {
    let mut data = config.clone();
    data.insert("index", index);
    data.insert("folder", folder.display().to_string());
    data
}

/// Populate every folder and write `text` into each as `submit_name`
///
/// A folder that can't be written is logged and left out of the returned set, the others are
/// still written.
pub fn write(
    method: &str,
    sweep: &dyn MultipleFolders,
    text: &str,
    submit_name: &str,
    general: &Settings,
    config: &Settings,
) -> Result<FolderSet, SubmitError> {
    let folders = sweep.generate_folder_names(general)?;
    info!("Writing {} job folders", folders.len());

    let mut written = FolderSet::new();
    for folder in folders {
        match write_folder(sweep, &folder, text, submit_name, config) {
            Ok(()) => written.push(folder),
            Err(err) => warn!("Skipping job folder {}: {}", folder.path.display(), err),
        }
    }

    match written.is_empty() {
        true => Err(SubmitError::NoFolders(method.to_string())),
        false => Ok(written),
    }
}

fn write_folder(
    sweep: &dyn MultipleFolders,
    folder: &JobFolder,
    text: &str,
    submit_name: &str,
    config: &Settings,
) -> Result<(), SubmitError> {
    let path = &folder.path;
    fs::create_dir_all(path).map_err(|err| SubmitError::fs(path, err))?;

    for file in sweep.copy_files() {
        copy_file(file, path)?;
    }

    let data = sweep.render_data(folder.index, path, config);
    for file in sweep.template_files() {
        let name = file.file_name().ok_or_else(|| SubmitError::fs(file, std::io::Error::other("not a file")))?;
        render_file(file, &path.join(name), &data)?;
    }

    let script = path.join(submit_name);
    info!("Writing submit script {}", script.display());
    fs::write(&script, text).map_err(|err| SubmitError::fs(&script, err))
}

/// Submit from inside every folder; a failed job is logged and the rest still go out
///
/// Returns the folders whose job was submitted.
pub fn submit(folders: &FolderSet, submit_name: &str, submit_command: &str) -> FolderSet {
    let mut submitted = FolderSet::new();
    for folder in folders {
        match submit_folder(&folder.path, submit_name, submit_command) {
            Ok(()) => submitted.push(folder.clone()),
            Err(err) => warn!("Job {} in {} was not submitted: {}", folder.index, folder.path.display(), err),
        }
    }
    submitted
}

fn submit_folder(path: &Path, submit_name: &str, submit_command: &str) -> Result<(), SubmitError> {
    let _folder = Folder::enter(path)?;
    command::submit(submit_command, Path::new(submit_name))
}

/// Remove the submit script from every folder
pub fn delete(folders: &FolderSet, submit_name: &str) {
    for folder in folders {
        let script = folder.path.join(submit_name);
        info!("Deleting {}", script.display());
        if let Err(err) = fs::remove_file(&script) {
            warn!("Can't delete {}: {}", script.display(), err);
        }
    }
}
