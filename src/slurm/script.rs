use std::env;
use std::fs;
use std::path::PathBuf;

use log::{info, warn};

use crate::config::settings::Settings;
use crate::error::SubmitError;
use crate::method::variant::{Layout, Method};
use crate::slurm::command;
use crate::slurm::folder::base_name;
use crate::slurm::multiple::{self, FolderSet};
use crate::template::render::{render_document, render_variable, DOCUMENT};

/// General settings kept when the final document is assembled
pub static KEYS: [&str; 6] = ["queue", "input", "output", "nodes", "ntasks_per_node", "mem_per_cpu"];

/// What `write` put on disk, handed on to `submit` and `delete`
#[derive(Debug, Clone, PartialEq)]
pub enum Staged {
    Single(PathBuf),
    Folders(FolderSet),
}

/// One submission of one method
///
/// Owns the general settings for the duration of the submission. Lifecycle, in order:
/// setup, render, write, then (unless `write_only`) submit, delete and show.
pub struct SubmitScript {
    name: String,
    method: Box<dyn Method>,
    config: Settings,
    general: Settings,
}

impl SubmitScript {
    pub fn new(name: &str, method: Box<dyn Method>, config: Settings, general: Settings) -> SubmitScript {
        SubmitScript { name: name.to_string(), method, config, general }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the whole lifecycle with the walltime of the selected queue
    pub fn submit_calc(&mut self, walltime: &str) -> Result<(), SubmitError> {
        self.setup()?;
        let text = self.render(walltime)?;
        let staged = self.write(&text)?;

        if self.general.get_bool("write_only") == Some(true) {
            info!("Only files written");
            return Ok(());
        }

        let submitted = self.submit(&staged)?;
        if self.general.get_bool("delete") == Some(true) {
            self.delete(&submitted)?;
        }
        self.show();
        Ok(())
    }

    pub fn setup(&mut self) -> Result<(), SubmitError> {
        self.method.setup(&mut self.general, &self.config)
    }

    /// Render the complete submit script
    pub fn render(&mut self, walltime: &str) -> Result<String, SubmitError> {
        self.general.insert("time", walltime);

        let mut fields = self.general.narrow(&KEYS);
        if let Some(input) = self.general.get_str("input") {
            fields.insert("input", base_name(input));
        }
        fields.insert("command", self.command()?);
        fields.insert("header", self.header()?);
        render_document(DOCUMENT, &fields)
    }

    pub fn command(&self) -> Result<String, SubmitError> {
        render_variable(self.method.command(), &self.general, &self.config)
    }

    pub fn header(&self) -> Result<String, SubmitError> {
        self.method.directives().render(&self.general, &self.config)
    }

    pub fn write(&self, text: &str) -> Result<Staged, SubmitError> {
        match self.method.layout() {
            Layout::Single => {
                let path = self.submit_file()?;
                info!("Writing submit script {}", path.display());
                fs::write(&path, text).map_err(|err| SubmitError::fs(&path, err))?;
                Ok(Staged::Single(path))
            }
            Layout::Multiple(sweep) => {
                let submit_name = self.submit_name()?;
                let folders = multiple::write(&self.name, sweep, text, &submit_name, &self.general, &self.config)?;
                Ok(Staged::Folders(folders))
            }
        }
    }

    /// Submit what `write` staged and return the part that went out
    ///
    /// A sweep fails only when none of its jobs could be submitted.
    pub fn submit(&self, staged: &Staged) -> Result<Staged, SubmitError> {
        let submit_command = self.general.get_str("submit_command").unwrap_or("sbatch");
        match staged {
            Staged::Single(path) => {
                command::submit(submit_command, path)?;
                Ok(staged.clone())
            }
            Staged::Folders(folders) => {
                let submitted = multiple::submit(folders, &self.submit_name()?, submit_command);
                if submitted.is_empty() {
                    return Err(SubmitError::ExternalCommand {
                        command: submit_command.to_string(),
                        reason: format!("none of the {} jobs were submitted", folders.len()),
                    });
                }
                if submitted.len() < folders.len() {
                    warn!("{} of {} jobs were not submitted", folders.len() - submitted.len(), folders.len());
                }
                Ok(Staged::Folders(submitted))
            }
        }
    }

    pub fn delete(&self, staged: &Staged) -> Result<(), SubmitError> {
        match staged {
            Staged::Single(path) => {
                info!("Deleting {}", path.display());
                fs::remove_file(path).map_err(|err| SubmitError::fs(path, err))
            }
            Staged::Folders(folders) => {
                multiple::delete(folders, &self.submit_name()?);
                Ok(())
            }
        }
    }

    /// Show the queue of the current user, never fails the submission
    pub fn show(&self) {
        let Ok(user) = env::var("USER") else {
            info!("USER not set, not showing the queue");
            return;
        };
        let status_command = self.general.get_str("status_command").unwrap_or("squeue");
        if let Err(err) = command::show(status_command, &user) {
            warn!("Can't show the queue: {}", err);
        }
    }

    fn submit_file(&self) -> Result<PathBuf, SubmitError> {
        self.general
            .get_str("submit_file")
            .map(PathBuf::from)
            .ok_or_else(|| SubmitError::Configuration("'submit_file' is not set".to_string()))
    }

    /// File name of the submit script inside a job folder
    fn submit_name(&self) -> Result<String, SubmitError> {
        let path = self.submit_file()?;
        Ok(base_name(&path.to_string_lossy()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;
    use serial_test::serial;
    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::slurm::directive::Directives;
    use crate::slurm::multiple::{numbered_folders, MultipleFolders};

    struct Plain;

    impl Method for Plain {
        fn command(&self) -> &str {
            "srun hostname {input_name}"
        }
    }

    struct Broken;

    impl Method for Broken {
        fn directives(&self) -> Directives {
            Directives::sbatch_defaults().value("account", "{account}")
        }
    }

    struct Pair {
        root: PathBuf,
    }

    impl Method for Pair {
        fn layout(&self) -> Layout<'_> {
            Layout::Multiple(self)
        }
    }

    impl MultipleFolders for Pair {
        fn generate_folder_names(&self, _general: &Settings) -> Result<FolderSet, SubmitError> {
            Ok(numbered_folders(self.root.join("run").to_str().unwrap(), 2))
        }
    }

    fn settings(dir: &TempDir) -> Settings {
        let submit_file = dir.path().join("submit_file_sbatch.sh");
        [
            ("input", json!("inputs/job.inp")),
            ("input_name", json!("job.inp")),
            ("output", json!("job.inp.out")),
            ("queue", json!("short")),
            ("nodes", json!(1)),
            ("ntasks_per_node", json!(4)),
            ("mem_per_cpu", json!(2.0)),
            ("delete", json!(true)),
            ("write_only", json!(false)),
            ("submit_file", json!(submit_file.to_str().unwrap())),
            ("submit_command", json!("true")),
            ("status_command", json!("true")),
        ]
        .into_iter()
        .collect()
    }

    fn script(method: Box<dyn Method>, general: Settings) -> SubmitScript {
        SubmitScript::new("test", method, general.clone(), general)
    }

    #[test]
    fn render_injects_time_and_builds_the_document() {
        let dir = tempdir().unwrap();
        let mut script = script(Box::new(Plain), settings(&dir));

        let text = script.render("00:30:00").unwrap();
        assert_eq!(script.general.get_str("time"), Some("00:30:00"));
        assert_eq!(
            text,
            "#!/bin/bash\n\
             #SBATCH --no-requeue\n\
             #SBATCH --partition=short\n\
             #SBATCH --job-name=job.inp\n\
             #SBATCH --output=job.inp.out\n\
             #SBATCH --nodes=1\n\
             #SBATCH --ntasks-per-node=4\n\
             #SBATCH --time=00:30:00\n\
             #SBATCH --mem-per-cpu=2.0\n\
             \n\
             srun hostname job.inp\n\n\n"
        );
        assert_eq!(script.render("00:30:00").unwrap(), text);
    }

    #[test]
    fn missing_variable_stops_before_anything_is_written() {
        let dir = tempdir().unwrap();
        let general = settings(&dir);
        let submit_file = PathBuf::from(general.get_str("submit_file").unwrap());
        let mut script = script(Box::new(Broken), general);

        let err = script.submit_calc("00:30:00").unwrap_err();
        assert!(matches!(err, SubmitError::MissingVariable(ref name) if name == "account"));
        assert!(!submit_file.exists());
    }

    #[test]
    fn write_only_leaves_the_script_in_place() {
        let dir = tempdir().unwrap();
        let mut general = settings(&dir);
        general.insert("write_only", true);
        // would fail if it were run
        general.insert("submit_command", "no-such-sbatch-binary");
        let submit_file = PathBuf::from(general.get_str("submit_file").unwrap());

        script(Box::new(Plain), general).submit_calc("00:30:00").unwrap();
        assert!(submit_file.exists());
    }

    #[test]
    fn submitted_script_is_deleted() {
        let dir = tempdir().unwrap();
        let general = settings(&dir);
        let submit_file = PathBuf::from(general.get_str("submit_file").unwrap());

        script(Box::new(Plain), general).submit_calc("00:30:00").unwrap();
        assert!(!submit_file.exists());
    }

    #[test]
    fn delete_false_keeps_the_script() {
        let dir = tempdir().unwrap();
        let mut general = settings(&dir);
        general.insert("delete", false);
        let submit_file = PathBuf::from(general.get_str("submit_file").unwrap());

        script(Box::new(Plain), general).submit_calc("00:30:00").unwrap();
        assert!(submit_file.exists());
    }

    #[test]
    fn failed_submission_keeps_the_script() {
        let dir = tempdir().unwrap();
        let mut general = settings(&dir);
        general.insert("submit_command", "false");
        let submit_file = PathBuf::from(general.get_str("submit_file").unwrap());

        let err = script(Box::new(Plain), general).submit_calc("00:30:00").unwrap_err();
        assert!(matches!(err, SubmitError::ExternalCommand { .. }));
        assert!(submit_file.exists());
    }

    #[test]
    #[serial]
    fn sweep_scripts_are_deleted_from_every_folder() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let mut script = script(Box::new(Pair { root: root.clone() }), settings(&dir));

        script.submit_calc("00:30:00").unwrap();
        for run in ["run0", "run1"] {
            let folder = root.join(run);
            assert!(folder.is_dir());
            assert!(!folder.join("submit_file_sbatch.sh").exists());
        }
    }

    #[test]
    #[serial]
    fn failed_sweep_keeps_every_script() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let mut general = settings(&dir);
        general.insert("submit_command", "false");
        let mut script = script(Box::new(Pair { root: root.clone() }), general);

        let err = script.submit_calc("00:30:00").unwrap_err();
        assert!(matches!(err, SubmitError::ExternalCommand { .. }));
        for run in ["run0", "run1"] {
            assert!(root.join(run).join("submit_file_sbatch.sh").exists());
        }
    }

    #[test]
    #[serial]
    fn only_submitted_folders_are_cleaned_up() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let script = script(Box::new(Pair { root: root.clone() }), settings(&dir));
        let Staged::Folders(folders) = script.write("#!/bin/bash\n").unwrap() else { panic!("expected job folders") };
        // run1 can't be entered any more
        fs::remove_dir_all(&folders[1].path).unwrap();

        let submitted = script.submit(&Staged::Folders(folders.clone())).unwrap();
        assert_eq!(submitted, Staged::Folders(vec![folders[0].clone()]));
        script.delete(&submitted).unwrap();
        assert!(!folders[0].path.join("submit_file_sbatch.sh").exists());
    }

    #[test]
    #[serial]
    fn status_display_failures_do_not_fail_the_submission() {
        let dir = tempdir().unwrap();
        env::set_var("USER", "tester");
        for status_command in ["false", "no-such-squeue-binary"] {
            let mut general = settings(&dir);
            general.insert("status_command", status_command);
            script(Box::new(Plain), general).submit_calc("00:30:00").unwrap();
        }
    }

    #[test]
    fn sweep_write_shares_one_script_body() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let mut script = script(Box::new(Pair { root: root.clone() }), settings(&dir));

        let text = script.render("00:30:00").unwrap();
        let staged = script.write(&text).unwrap();
        let Staged::Folders(folders) = staged else { panic!("expected job folders") };
        assert_eq!(folders.len(), 2);
        for folder in &folders {
            let written = fs::read_to_string(folder.path.join("submit_file_sbatch.sh")).unwrap();
            assert_eq!(written, text);
        }
        assert!(!Path::new(script.general.get_str("submit_file").unwrap()).exists());
    }
}
