use std::path::Path;
use std::process::Command;

use log::info;

use crate::error::SubmitError;

/// Run the submit command (`sbatch` unless configured otherwise) against a job script
///
/// The scheduler's answer (e.g. "Submitted batch job 42") is logged. A non-zero exit status is
/// reported as an error carrying stderr.
pub fn submit(submit_command: &str, script: &Path) -> Result<(), SubmitError> {
    let mut cmd = build(submit_command)?;
    cmd.arg(script);
    info!("Running submit process {:?}", &cmd);

    let output = cmd.output().map_err(|err| failure(submit_command, err.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(failure(submit_command, format!("{}: {}", output.status, stderr.trim())));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    info!("{}", stdout.trim());
    Ok(())
}

/// Display the queue of `user`, output goes straight to the terminal
pub fn show(status_command: &str, user: &str) -> Result<(), SubmitError> {
    let mut cmd = build(status_command)?;
    cmd.args(["-u", user]);
    info!("Running status process {:?}", &cmd);

    let status = cmd.status().map_err(|err| failure(status_command, err.to_string()))?;
    match status.success() {
        true => Ok(()),
        false => Err(failure(status_command, status.to_string())),
    }
}

/// Split a configured command line like `sbatch --parsable` into program and arguments
fn build(command_line: &str) -> Result<Command, SubmitError> {
    let mut words = command_line.split_whitespace();
    let program = words.next().ok_or_else(|| failure(command_line, "empty command".to_string()))?;
    let mut cmd = Command::new(program);
    cmd.args(words);
    Ok(cmd)
}

fn failure(command: &str, reason: String) -> SubmitError {
    SubmitError::ExternalCommand { command: command.to_string(), reason }
}
