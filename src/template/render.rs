use std::fs;
use std::path::Path;

use log::info;
use serde::Serialize;
use serde_json::{Map, Value};
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::config::settings::{resolve, Settings};
use crate::error::SubmitError;
use crate::template::scan;

/// Shape of every submit script: shebang, header block, blank line, command block
pub static DOCUMENT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/submit.txt"));

/// Render a single expression, e.g. the value of a directive or a method command
///
/// Every variable the expression uses is looked up in `general` first and `config` second.
/// Nothing is rendered if any of them is missing from both.
/// A brace written `\{` is kept literally.
pub fn render_variable(expression: &str, general: &Settings, config: &Settings) -> Result<String, SubmitError> {
    let mut context = Map::new();
    for name in scan::variables(expression) {
        let value = resolve(&name, general, config)?;
        context.insert(name, value.clone());
    }
    render(expression, &Value::Object(context))
}

/// Substitute the named fields into a document template
pub fn render_document(template: &str, fields: &Settings) -> Result<String, SubmitError> {
    render(template, fields)
}

/// Read a template file, render it with `data` and write the result to `out_path`
pub fn render_file(original: &Path, out_path: &Path, data: &Settings) -> Result<(), SubmitError> {
    let template = fs::read_to_string(original).map_err(|err| SubmitError::fs(original, err))?;
    let content = render(&template, data)?;
    info!("Writing rendered {} to {}", original.display(), out_path.display());
    fs::write(out_path, content).map_err(|err| SubmitError::fs(out_path, err))
}

fn render<C: Serialize>(template: &str, context: &C) -> Result<String, SubmitError> {
    let mut tt = TinyTemplate::new();
    // scripts are not HTML
    tt.set_default_formatter(&format_unescaped);
    tt.add_template("template", template)?;
    Ok(tt.render("template", context)?)
}
