use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde_json::Value;

use crate::config::options::{parse_assignment, read_config_file, OptionLayers};
use crate::config::settings::Settings;
use crate::method::registry::Registry;
use crate::method::{builtin, loader};
use crate::queue::Queue;
use crate::submitter::Submitter;

mod config;
mod error;
mod method;
mod queue;
mod slurm;
mod submitter;
mod template;

/// Render a SLURM submit script for a computational method and submit it with sbatch
#[derive(Parser, Debug)]
#[command(name = "submit", version)]
struct Cli {
    /// Input file of the calculation
    input: Option<PathBuf>,

    /// Name of the output file [default: <input file name>.out]
    #[arg(short, long)]
    output: Option<String>,

    /// Queue, selects the walltime [default: medium]
    #[arg(short, long, value_enum)]
    queue: Option<Queue>,

    /// Number of cores per node
    #[arg(short = 'n', long)]
    ntasks_per_node: Option<u32>,

    /// Number of nodes [default: 1]
    #[arg(long)]
    nodes: Option<u32>,

    /// Memory per cpu in GB [default: 2.0]
    #[arg(long)]
    mem_per_cpu: Option<f64>,

    /// Delete the submit file after submission [default: true]
    #[arg(long)]
    delete: Option<bool>,

    /// Only write the submission script
    #[arg(short, long)]
    write_only: bool,

    /// Submit file name [default: submit_file_sbatch.sh]
    #[arg(long)]
    submit_file: Option<PathBuf>,

    /// Method the script is rendered for [default: basic]
    #[arg(short, long)]
    method: Option<String>,

    /// JSON file with option values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set any option, including method specific ones, e.g. --set count=4
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, Value)>,

    /// Extra directory to load method files (*.json) from
    #[arg(long = "templates", value_name = "DIR")]
    templates: Vec<PathBuf>,

    /// Print the available methods and exit
    #[arg(long)]
    list_methods: bool,
}

impl Cli {
    fn layers(&self) -> Result<OptionLayers> {
        let file = match &self.config {
            Some(path) => read_config_file(path)?,
            None => Settings::new(),
        };
        let assignments: Settings = self.set.iter().cloned().collect();

        let mut flags = Settings::new();
        if let Some(input) = &self.input {
            flags.insert("input", input.display().to_string());
        }
        if let Some(output) = &self.output {
            flags.insert("output", output.as_str());
        }
        if let Some(queue) = self.queue {
            flags.insert("queue", queue.to_string());
        }
        if let Some(ntasks_per_node) = self.ntasks_per_node {
            flags.insert("ntasks_per_node", ntasks_per_node);
        }
        if let Some(nodes) = self.nodes {
            flags.insert("nodes", nodes);
        }
        if let Some(mem_per_cpu) = self.mem_per_cpu {
            flags.insert("mem_per_cpu", mem_per_cpu);
        }
        if let Some(delete) = self.delete {
            flags.insert("delete", delete);
        }
        if self.write_only {
            flags.insert("write_only", true);
        }
        if let Some(submit_file) = &self.submit_file {
            flags.insert("submit_file", submit_file.display().to_string());
        }
        if let Some(method) = &self.method {
            flags.insert("method", method.as_str());
        }

        Ok(OptionLayers { file, assignments, flags })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut registry = Registry::new();
    builtin::register(&mut registry);
    let mut search_paths = loader::default_search_paths();
    search_paths.extend(cli.templates.iter().cloned());
    let loaded = loader::load_methods(&search_paths, &mut registry);
    info!("{} method files loaded", loaded);

    let submitter = Submitter::new(registry);
    if cli.list_methods {
        for name in submitter.registry().names() {
            println!("{name}");
        }
        return Ok(());
    }

    let layers = cli.layers().context("Can't read options")?;
    let config = submitter.configure(&layers).context("Invalid configuration")?;
    submitter.run(config).context("Submission failed")
}
