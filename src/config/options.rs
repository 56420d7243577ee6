use std::fs;
use std::path::Path;

use log::info;
use serde_json::{json, Value};

use crate::config::settings::Settings;
use crate::error::SubmitError;

/// Method used when none is requested
pub static DEFAULT_METHOD: &str = "basic";

/// Options understood by every method, with their defaults
///
/// `input` and `ntasks_per_node` have no default and must be supplied. `output` stays unset
/// until the submitter derives it from `input`.
pub fn defaults() -> Settings {
    [
        ("output", Value::Null),
        ("queue", json!("medium")),
        ("nodes", json!(1)),
        ("mem_per_cpu", json!(2.0)),
        ("delete", json!(true)),
        ("write_only", json!(false)),
        ("submit_file", json!("submit_file_sbatch.sh")),
        ("method", json!(DEFAULT_METHOD)),
        ("submit_command", json!("sbatch")),
        ("status_command", json!("squeue")),
    ]
    .into_iter()
    .collect()
}

/// Option values gathered from the outside, lowest precedence first
///
/// Method questions sit between the built-in defaults and these layers, so they can only be
/// merged once the method is known.
#[derive(Debug, Default)]
pub struct OptionLayers {
    /// `--config` JSON file
    pub file: Settings,
    /// `--set KEY=VALUE` assignments
    pub assignments: Settings,
    /// Named command line flags
    pub flags: Settings,
}

impl OptionLayers {
    /// Name of the requested method
    pub fn method(&self) -> String {
        [&self.flags, &self.assignments, &self.file]
            .iter()
            .find_map(|layer| layer.get_str("method"))
            .unwrap_or(DEFAULT_METHOD)
            .to_string()
    }

    /// Merge every layer over the defaults and the questions of the selected method
    ///
    /// `mem_per_cpu` is always a float afterwards, so `2` from a file renders as `2.0` like the flag.
    pub fn merge(&self, questions: &Settings) -> Settings {
        let mut config = defaults();
        for layer in [questions, &self.file, &self.assignments, &self.flags] {
            let set: Settings = layer
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            config.extend(set);
        }
        if let Some(mem_per_cpu) = config.get("mem_per_cpu").and_then(Value::as_f64) {
            config.insert("mem_per_cpu", mem_per_cpu);
        }
        config
    }
}

/// Read a JSON object of option values
pub fn read_config_file(path: &Path) -> Result<Settings, SubmitError> {
    info!("Reading options from {}", path.display());
    let content = fs::read_to_string(path).map_err(|err| SubmitError::fs(path, err))?;
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(values)) => Ok(Settings::from(values)),
        Ok(_) => Err(SubmitError::Configuration(format!("{} is not a JSON object", path.display()))),
        Err(err) => Err(SubmitError::Configuration(format!("{}: {}", path.display(), err))),
    }
}

/// Parse `KEY=VALUE`; the value is read as JSON when possible and kept as a string otherwise
pub fn parse_assignment(assignment: &str) -> Result<(String, Value), String> {
    let (key, raw) = assignment
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{assignment}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{assignment}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Check the options every method relies on
pub fn validate(config: &Settings) -> Result<(), SubmitError> {
    let input = config
        .get_str("input")
        .ok_or_else(|| missing("input"))?;
    if !Path::new(input).is_file() {
        return Err(SubmitError::Configuration(format!("input file '{input}' does not exist")));
    }

    match config.get("ntasks_per_node") {
        None => return Err(missing("ntasks_per_node")),
        Some(value) => expect_integer("ntasks_per_node", value)?,
    }
    expect_integer("nodes", config.get("nodes").ok_or_else(|| missing("nodes"))?)?;

    if !config.get("mem_per_cpu").is_some_and(Value::is_number) {
        return Err(SubmitError::Configuration("'mem_per_cpu' must be a number".to_string()));
    }
    for flag in ["delete", "write_only"] {
        if config.get_bool(flag).is_none() {
            return Err(SubmitError::Configuration(format!("'{flag}' must be true or false")));
        }
    }
    for name in ["queue", "submit_file", "method", "submit_command", "status_command"] {
        if config.get_str(name).is_none() {
            return Err(SubmitError::Configuration(format!("'{name}' must be a string")));
        }
    }
    if let Some(output) = config.get("output") {
        if !output.is_string() {
            return Err(SubmitError::Configuration("'output' must be a string".to_string()));
        }
    }
    Ok(())
}

fn missing(name: &str) -> SubmitError {
    SubmitError::Configuration(format!("missing required option '{name}'"))
}

fn expect_integer(name: &str, value: &Value) -> Result<(), SubmitError> {
    match value.as_u64() {
        Some(n) if n > 0 => Ok(()),
        _ => Err(SubmitError::Configuration(format!("'{name}' must be a positive integer, got {value}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn layers() -> OptionLayers {
        OptionLayers {
            file: [("nodes", json!(2)), ("method", json!("qchem"))].into_iter().collect(),
            assignments: [("nodes", json!(3)), ("count", json!(4))].into_iter().collect(),
            flags: [("nodes", json!(4)), ("output", Value::Null)].into_iter().collect(),
        }
    }

    #[test]
    fn later_layers_take_precedence() {
        let questions: Settings = [("count", json!(1)), ("prefix", json!("run"))].into_iter().collect();
        let config = layers().merge(&questions);

        assert_eq!(config.get("nodes"), Some(&json!(4)));
        assert_eq!(config.get("count"), Some(&json!(4)));
        assert_eq!(config.get_str("prefix"), Some("run"));
        assert_eq!(config.get_str("queue"), Some("medium"));
        assert!(!config.contains("output"));
    }

    #[test]
    fn integer_memory_becomes_a_float() {
        let layers = OptionLayers {
            file: [("mem_per_cpu", json!(2))].into_iter().collect(),
            ..OptionLayers::default()
        };
        let config = layers.merge(&Settings::new());
        assert_eq!(config.get("mem_per_cpu"), Some(&json!(2.0)));
        assert_eq!(config.get("mem_per_cpu").unwrap().to_string(), "2.0");

        let layers = OptionLayers {
            assignments: [("mem_per_cpu", json!("lots"))].into_iter().collect(),
            ..OptionLayers::default()
        };
        assert_eq!(layers.merge(&Settings::new()).get_str("mem_per_cpu"), Some("lots"));
    }

    #[test]
    fn method_comes_from_the_highest_layer_that_sets_it() {
        assert_eq!(layers().method(), "qchem");
        assert_eq!(OptionLayers::default().method(), DEFAULT_METHOD);
    }

    #[test]
    fn assignments_parse_json_or_fall_back_to_strings() {
        assert_eq!(parse_assignment("count=3").unwrap(), ("count".to_string(), json!(3)));
        assert_eq!(parse_assignment("flag=true").unwrap(), ("flag".to_string(), json!(true)));
        assert_eq!(parse_assignment("name=job.inp").unwrap(), ("name".to_string(), json!("job.inp")));
        assert_eq!(parse_assignment("files=[\"a\",\"b\"]").unwrap().1, json!(["a", "b"]));
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn config_file_must_be_an_object() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"queue": "short", "nodes": 2}}"#).unwrap();
        let settings = read_config_file(file.path()).unwrap();
        assert_eq!(settings.get_str("queue"), Some("short"));

        let mut list = NamedTempFile::new().unwrap();
        write!(list, "[1, 2]").unwrap();
        assert!(matches!(read_config_file(list.path()), Err(SubmitError::Configuration(_))));
    }

    #[test]
    fn validation_requires_input_and_cores() {
        let input = NamedTempFile::new().unwrap();
        let input_path = input.path().to_str().unwrap().to_string();

        let mut config = defaults();
        assert!(matches!(validate(&config), Err(SubmitError::Configuration(_))));

        config.insert("input", input_path);
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("ntasks_per_node"));

        config.insert("ntasks_per_node", 4);
        validate(&config).unwrap();

        config.insert("mem_per_cpu", "lots");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn validation_rejects_missing_input_file() {
        let mut config = defaults();
        config.insert("input", "does/not/exist.inp");
        config.insert("ntasks_per_node", 4);
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
