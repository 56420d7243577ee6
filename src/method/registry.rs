use std::collections::BTreeMap;

use log::info;

use crate::config::settings::Settings;
use crate::error::SubmitError;
use crate::method::variant::Method;
use crate::slurm::script::SubmitScript;

/// Builds a method from the merged configuration
pub type Factory = Box<dyn Fn(&Settings) -> Box<dyn Method>>;

struct Entry {
    questions: Settings,
    factory: Factory,
}

/// Methods selectable by name with `--method`
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Register a method together with the defaults of its own options
    ///
    /// A method registered under an existing name replaces the earlier one.
    pub fn register<F>(&mut self, name: &str, questions: Settings, factory: F)
    where
        F: Fn(&Settings) -> Box<dyn Method> + 'static,
    {
        let entry = Entry { questions, factory: Box::new(factory) };
        if self.entries.insert(name.to_string(), entry).is_some() {
            info!("Method {} replaced", name);
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Option defaults a method adds to the schema
    pub fn questions(&self, name: &str) -> Result<&Settings, SubmitError> {
        self.entry(name).map(|entry| &entry.questions)
    }

    /// Construct the method `name` as a submit script over `config` and `general`
    pub fn plugin_from_config(
        &self,
        name: &str,
        config: Settings,
        general: Settings,
    ) -> Result<SubmitScript, SubmitError> {
        let entry = self.entry(name)?;
        let method = (entry.factory)(&config);
        Ok(SubmitScript::new(name, method, config, general))
    }

    fn entry(&self, name: &str) -> Result<&Entry, SubmitError> {
        self.entries.get(name).ok_or_else(|| SubmitError::UnknownVariant {
            name: name.to_string(),
            available: self.names().join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Echo;

    impl Method for Echo {
        fn command(&self) -> &str {
            "echo {input}"
        }
    }

    #[test]
    fn registered_methods_are_found_by_name() {
        let mut registry = Registry::new();
        let questions: Settings = [("greeting", json!("hi"))].into_iter().collect();
        registry.register("echo", questions, |_| Box::new(Echo));

        assert_eq!(registry.names(), vec!["echo"]);
        assert_eq!(registry.questions("echo").unwrap().get_str("greeting"), Some("hi"));

        let general: Settings = [("input", json!("job.inp"))].into_iter().collect();
        let script = registry.plugin_from_config("echo", Settings::new(), general).unwrap();
        assert_eq!(script.name(), "echo");
        assert_eq!(script.command().unwrap(), "echo job.inp");
    }

    #[test]
    fn unknown_method_lists_the_alternatives() {
        let mut registry = Registry::new();
        registry.register("echo", Settings::new(), |_| Box::new(Echo));

        let err = registry.plugin_from_config("orca", Settings::new(), Settings::new()).err().unwrap();
        assert!(matches!(err, SubmitError::UnknownVariant { ref name, .. } if name == "orca"));
        assert_eq!(err.to_string(), "unknown method 'orca'. Available: echo");
        assert!(registry.questions("orca").is_err());
    }
}
