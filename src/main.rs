mod age;
mod aggregate;
mod cli;
mod criteria;
mod error;
mod fmt;
mod importer;
mod models;
mod normalizer;
mod reports;
mod settings;

use clap::Parser;

use cli::{Cli, Commands, ConfigCommands};

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Report {
            file,
            sheet,
            variant,
            as_of,
            format,
            output,
        } => cli::report::run(
            config,
            cli::report::ReportArgs {
                file: &file,
                sheet: sheet.as_deref(),
                variant,
                as_of: as_of.as_deref(),
                format,
                output: output.as_deref(),
            },
        ),
        Commands::Inspect {
            file,
            sheet,
            variant,
            rows,
        } => cli::inspect::run(config, &file, sheet.as_deref(), variant, rows),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(config),
            ConfigCommands::Init { force } => cli::config::init(config, force),
        },
        Commands::Completions { shell } => cli::completions::run(shell),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
