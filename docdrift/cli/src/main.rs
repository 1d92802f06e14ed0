//! Docdrift CLI - checks upstream API documentation for drift and regenerates
//! the data model from it.

mod config;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use docdrift_definitions::{conversions, recorded_pages};
use docdrift_lib::emit::RustEmitter;
use docdrift_lib::errors::RunError;
use docdrift_lib::fetch::{Fetcher, HttpFetcher};
use docdrift_lib::pipeline::{Conversion, Pipeline};
use docdrift_lib::schema::SymbolGraph;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use config::SyncConfig;

#[derive(Parser)]
#[command(name = "docdrift")]
#[command(author, version, about = "Checks API documentation for drift and regenerates the data model", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    log_verbosity: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every documentation page and regenerate the data model
    Sync {
        /// Config file [default: docdrift.toml if present]
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Documents to process (repeatable); overrides the config file
        #[arg(short, long = "document", value_name = "NAME")]
        documents: Vec<String>,

        /// Output directory for generated modules
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Base URL for relative document URLs
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Serve the recorded fixture pages instead of fetching
        #[arg(long)]
        offline: bool,

        /// Print generated code without writing files
        #[arg(long)]
        dry_run: bool,

        /// Failure report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Terminal)]
        report: ReportFormat,
    },

    /// List the known documents
    List,
}

fn init_tracing(verbose: u8, json: bool) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,docdrift_lib=info,docdrift=info".to_string(),
            2 => "info,docdrift_lib=debug,docdrift=debug".to_string(),
            _ => "debug,docdrift_lib=trace,docdrift=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_file(verbose >= 3)
                    .with_line_number(verbose >= 3)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

async fn run_pipeline<F: Fetcher>(
    fetcher: F,
    config: &SyncConfig,
    conversions: &[Box<dyn Conversion>],
    emitter: &mut RustEmitter,
) -> Result<SymbolGraph, RunError> {
    Pipeline::new(fetcher)
        .with_payload_attribute(config.payload_attribute.as_str())
        .run(conversions, emitter)
        .await
}

fn report_failure(error: &RunError, format: ReportFormat) {
    match format {
        ReportFormat::Terminal => eprint!("{}", report::format_terminal(error)),
        ReportFormat::Json => println!("{:#}", report::format_json(error)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_verbosity, cli.json);

    match cli.command {
        Commands::List => {
            for conversion in conversions() {
                println!("{:<16} {}", conversion.name(), conversion.url());
            }
            ExitCode::SUCCESS
        }

        Commands::Sync {
            config,
            documents,
            output,
            base_url,
            offline,
            dry_run,
            report,
        } => {
            let mut settings = match SyncConfig::load(config.as_deref()) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::from(2);
                }
            };
            settings.apply_env(|key| std::env::var(key).ok());
            if !documents.is_empty() {
                settings.documents = documents;
            }
            if let Some(output) = output {
                settings.output_dir = output;
            }
            if let Some(base_url) = base_url {
                settings.base_url = base_url;
            }

            let selected = match settings.select(conversions()) {
                Ok(selected) => selected,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::from(2);
                }
            };
            tracing::info!(documents = selected.len(), offline, dry_run, "docdrift sync starting");

            let mut emitter = if dry_run {
                RustEmitter::in_memory()
            } else {
                RustEmitter::new(&settings.output_dir)
            };

            let result = if offline {
                let fetcher = recorded_pages(&settings.payload_attribute);
                run_pipeline(fetcher, &settings, &selected, &mut emitter).await
            } else {
                let fetcher = match HttpFetcher::new(&settings.fetch_options()) {
                    Ok(fetcher) => fetcher,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return ExitCode::from(2);
                    }
                };
                run_pipeline(fetcher, &settings, &selected, &mut emitter).await
            };

            match result {
                Ok(graph) => {
                    if dry_run {
                        for file in emitter.files() {
                            println!("// ===== {} =====", file.path.display());
                            println!("{}", file.contents);
                        }
                    } else {
                        eprintln!(
                            "Generated {} module(s) in {}",
                            emitter.files().len(),
                            settings.output_dir.display()
                        );
                    }
                    tracing::info!(
                        documents = graph.documents.len(),
                        global = graph.global.len(),
                        "docdrift sync complete"
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    report_failure(&e, report);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
