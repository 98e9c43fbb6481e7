//! Template Powerpack CLI
//!
//! Usage:
//!   powerpack [OPTIONS] [TEMPLATE]
//!
//! Options:
//!   -c, --context <FILE>  JSON object used as the render context
//!   -C, --config <FILE>   Render configuration (TOML format)
//!   -r, --dump-registries Print the registries as JSON after the output
//!   -d, --debug           Verbose logging
//!   -h, --help            Print help

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use template_powerpack::{
    context_from_json, Context, Environment, RegistryEntry, RegistryStore, RenderConfig,
};

#[derive(Parser, Debug)]
#[command(name = "powerpack")]
#[command(about = "Render templates with context contracts and content registries")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// JSON file holding the render context
    #[arg(short, long)]
    context: Option<PathBuf>,

    /// Configuration file (TOML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Print the collected registries as JSON after rendering
    #[arg(short = 'r', long)]
    dump_registries: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("template_powerpack=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("template_powerpack=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("powerpack starting with args: {:?}", cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => RenderConfig::from_file(path)
            .map_err(|e| format!("Error loading config '{}': {}", path.display(), e))?,
        None => RenderConfig::default(),
    };

    let context = match &cli.context {
        Some(path) => load_context(path)?,
        None => Context::new(),
    };

    let (name, source) = match &cli.input {
        Some(path) => {
            let source = fs::read_to_string(path)
                .map_err(|e| format!("Error reading file '{}': {}", path.display(), e))?;
            (path.display().to_string(), source)
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("Error reading from stdin: {}", e))?;
            ("<stdin>".to_string(), buffer)
        }
    };

    let env = Environment::new(config);
    let template = env.compile(&name, &source).map_err(|errors| {
        errors
            .iter()
            .map(|e| e.format(&source, &name))
            .collect::<Vec<_>>()
            .join("\n")
    })?;

    let mut store = RegistryStore::new();
    let output = env
        .render(&template, &context, &mut store)
        .map_err(|e| format!("Error: {}", e))?;
    print!("{}", output);

    if cli.dump_registries {
        if !output.is_empty() && !output.ends_with('\n') {
            println!();
        }
        println!("{}", dump_registries(&store)?);
    }
    Ok(())
}

fn load_context(path: &Path) -> Result<Context, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Error reading context '{}': {}", path.display(), e))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("Error parsing context '{}': {}", path.display(), e))?;
    if !json.is_object() {
        return Err(format!(
            "Error parsing context '{}': expected a JSON object",
            path.display()
        ));
    }
    Ok(context_from_json(json))
}

fn dump_registries(store: &RegistryStore) -> Result<String, String> {
    let registries: BTreeMap<&str, &[RegistryEntry]> = store
        .names()
        .into_iter()
        .map(|name| (name, store.entries(name)))
        .collect();
    serde_json::to_string_pretty(&registries).map_err(|e| format!("Error dumping registries: {}", e))
}
