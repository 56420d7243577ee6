use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::SubmitError;

/// Working directory change that is undone when the guard goes out of scope
///
/// sbatch submits relative to the current directory, so each job of a sweep is submitted from
/// inside its own folder.
#[derive(Debug)]
pub struct Folder {
    previous: PathBuf,
}

impl Folder {
    pub fn enter(path: &Path) -> Result<Folder, SubmitError> {
        let previous = env::current_dir().map_err(|err| SubmitError::fs(".", err))?;
        env::set_current_dir(path).map_err(|err| SubmitError::fs(path, err))?;
        Ok(Folder { previous })
    }
}

impl Drop for Folder {
    fn drop(&mut self) {
        if let Err(err) = env::set_current_dir(&self.previous) {
            warn!("Can't return to {}: {}", self.previous.display(), err);
        }
    }
}

/// Copy `origin` into the directory `destination`, keeping its file name
pub fn copy_file(origin: &Path, destination: &Path) -> Result<PathBuf, SubmitError> {
    let name = origin
        .file_name()
        .ok_or_else(|| SubmitError::fs(origin, std::io::Error::other("not a file")))?;
    let target = destination.join(name);
    info!("Copying {} to {}", origin.display(), target.display());
    fs::copy(origin, &target).map_err(|err| SubmitError::fs(origin, err))?;
    Ok(target)
}

/// Last component of a path as written by the user, or the path itself
pub fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
