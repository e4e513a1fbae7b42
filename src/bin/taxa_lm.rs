use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use taxa_lineage_manager::app::{App, SyncReport};
use taxa_lineage_manager::config::Config;
use taxa_lineage_manager::error::TaxaError;
use taxa_lineage_manager::eutils::EutilsHttpClient;

#[derive(Parser)]
#[command(name = "taxa-lm")]
#[command(about = "Fetch and cache NCBI taxonomic lineages for organism-named dataset directories")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Re-resolve one cache entry using a corrected organism name")]
    Fix(FixArgs),
}

#[derive(Args)]
struct FixArgs {
    original: String,
    corrected: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<TaxaError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &TaxaError) -> u8 {
    match error {
        TaxaError::MissingEnv(_) => 2,
        TaxaError::Http(_)
        | TaxaError::Status { .. }
        | TaxaError::NotFound(_)
        | TaxaError::Ambiguous { .. }
        | TaxaError::MalformedId(_)
        | TaxaError::Parse(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().into_diagnostic()?;
    let client = EutilsHttpClient::new(&config).into_diagnostic()?;
    let app = App::new(config, client);

    match cli.command {
        Some(Command::Fix(args)) => {
            let taxon_info = app.fix(&args.original, &args.corrected).into_diagnostic()?;
            println!(
                "updated \"{}\" -> {} (taxid {})",
                args.original, taxon_info.sci_name, taxon_info.taxon_id
            );
            Ok(())
        }
        None => {
            let report = app.sync().into_diagnostic()?;
            print_sync_summary(&report);
            Ok(())
        }
    }
}

fn print_sync_summary(report: &SyncReport) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    println!("{cyan}taxa-lm summary{reset}");
    println!("{green}directories found: {}{reset}", report.total);
    println!(
        "{green}already cached: {}{reset}",
        report.already_cached
    );
    println!("{green}newly resolved: {}{reset}", report.resolved);
    println!("{yellow}failed: {}{reset}", report.failed.len());
    for name in &report.failed {
        println!("{red}  {name}{reset}");
    }
}
