#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

mod files;

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use odata2ts_common::RunOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::files::FileChange;

#[derive(Parser, Debug)]
#[command(
    name = "odata2ts",
    version,
    about = "Generate typed TypeScript clients from OData metadata"
)]
struct Cli {
    /// EDMX metadata documents of one service
    #[arg(long = "source", value_name = "EDMX", required = true, num_args = 1..)]
    sources: Vec<PathBuf>,

    /// Directory the generated files are written to
    #[arg(long, value_name = "DIR")]
    output: PathBuf,

    /// Run configuration (.toml, .json, .yaml or .yml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overrides the service name derived from the metadata
    #[arg(long = "service-name", value_name = "NAME")]
    service_name: Option<String>,

    /// Compare against the output directory instead of writing
    #[arg(long)]
    check: bool,
}

fn main() {
    init_tracing();
    let code = match Cli::try_parse() {
        Ok(cli) => run(&cli),
        Err(err) => {
            let code = err.exit_code();
            let _ = err.print();
            code
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> i32 {
    match run_inner(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn run_inner(cli: &Cli) -> Result<(), String> {
    let mut options = match &cli.config {
        Some(path) => RunOptions::load(path).map_err(|err| err.to_string())?,
        None => RunOptions::default(),
    };
    if let Some(name) = &cli.service_name {
        options.service_name = Some(name.clone());
    }

    let sources = cli
        .sources
        .iter()
        .map(|path| {
            fs::read_to_string(path)
                .map_err(|err| format!("Failed to read {}: {err}", path.display()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let sources: Vec<&str> = sources.iter().map(String::as_str).collect();

    let output = odata2ts_core::generate(&sources, &options).map_err(|err| err.to_string())?;
    let changes = output
        .files
        .iter()
        .map(|file| FileChange::read(&cli.output, file))
        .collect::<Result<Vec<_>, _>>()?;

    if cli.check {
        let drift: Vec<_> = changes.iter().filter_map(FileChange::diff).collect();
        if drift.is_empty() {
            info!(files = changes.len(), "generated files are up to date");
            return Ok(());
        }
        for diff in &drift {
            println!("{diff}");
        }
        return Err(format!(
            "{} generated file(s) differ from {}",
            drift.len(),
            cli.output.display()
        ));
    }

    fs::create_dir_all(&cli.output)
        .map_err(|err| format!("Failed to create {}: {err}", cli.output.display()))?;
    for change in &changes {
        change.write(&cli.output)?;
    }
    info!(
        files = changes.len(),
        output = %cli.output.display(),
        service = %output.model.service_name(),
        "generated files written"
    );
    Ok(())
}

fn init_tracing() {
    // ODATA2TS_LOG takes a plain level ("debug") or a full filter spec
    let filter = match std::env::var("ODATA2TS_LOG") {
        Ok(level) if is_plain_level(&level) => {
            format!("odata2ts={level},odata2ts_core={level},odata2ts_common={level}")
        }
        Ok(spec) => spec,
        Err(_) => "odata2ts=info,odata2ts_core=info".to_string(),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
