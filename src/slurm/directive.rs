use crate::config::settings::Settings;
use crate::error::SubmitError;
use crate::template::render::render_variable;

/// One `#SBATCH` line of the header
///
/// A directive without a value is a bare flag (`#SBATCH --no-requeue`), otherwise the value is
/// a template expression rendered when the header is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub value: Option<String>,
}

impl Directive {
    fn render(&self, general: &Settings, config: &Settings) -> Result<String, SubmitError> {
        match &self.value {
            None => Ok(format!("#SBATCH --{}", self.name)),
            Some(expression) => {
                let value = render_variable(expression, general, config)?;
                Ok(format!("#SBATCH --{}={}", self.name, value.trim()))
            }
        }
    }
}

/// Header directives in the order they are written
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Directives {
    entries: Vec<Directive>,
}

impl Directives {
    /// Resources every job asks for
    pub fn sbatch_defaults() -> Directives {
        Directives::default()
            .flag("no-requeue")
            .value("partition", "{queue}")
            .value("job-name", "{input_name}")
            .value("output", "{output}")
            .value("nodes", "{nodes}")
            .value("ntasks-per-node", "{ntasks_per_node}")
            .value("time", "{time}")
            .value("mem-per-cpu", "{mem_per_cpu}")
    }

    pub fn flag(mut self, name: &str) -> Directives {
        self.set(name, None);
        self
    }

    pub fn value(mut self, name: &str, expression: &str) -> Directives {
        self.set(name, Some(expression.to_string()));
        self
    }

    /// Replace the directive called `name` in place, or append it
    pub fn set(&mut self, name: &str, value: Option<String>) {
        match self.entries.iter_mut().find(|d| d.name == name) {
            Some(directive) => directive.value = value,
            None => self.entries.push(Directive { name: name.to_string(), value }),
        }
    }

    /// Render every directive, one line each
    pub fn render(&self, general: &Settings, config: &Settings) -> Result<String, SubmitError> {
        let lines = self
            .entries
            .iter()
            .map(|directive| directive.render(general, config))
            .collect::<Result<Vec<String>, SubmitError>>()?;
        Ok(lines.join("\n"))
    }
}
