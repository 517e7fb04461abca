use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use commands::convert::ConvertArgs;
use std::path::PathBuf;
use watchmove_config::{Config, PathManager};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchmove")]
#[command(about = "Turn a TV Time movie history export into a Trakt import file")]
#[command(
    long_about = "Reads tracking-prod-records.csv from a TV Time data export, looks up the IMDb id of every watched movie and writes import_data_for_trakt.json for Trakt's importer. Run without arguments to use those file names in the current directory."
)]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Console report format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Config file [default: ./watchmove.toml, then the platform config dir]
    #[arg(long = "config", global = true, value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Write logs to this file (rotated daily) instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    convert: ConvertArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration as TOML (masks the Trakt client id)
    Show {
        /// Show the Trakt client id unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
}

fn load_config(cli: &Cli) -> color_eyre::Result<(Config, Option<PathBuf>)> {
    let working_dir = std::env::current_dir().wrap_err("Could not determine the working directory")?;
    let (mut config, source) = Config::discover(cli.config_file.as_deref(), &PathManager::default(), &working_dir)
        .map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;
    config.apply_env();
    cli.convert.apply_to(&mut config);
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration: {}", e))?;
    Ok((config, source))
}

async fn run(cli: Cli, output: &output::Output) -> color_eyre::Result<()> {
    let (config, source) = load_config(&cli)?;
    if let Some(path) = &source {
        tracing::debug!("Loaded configuration from {}", path.display());
    }

    match cli.command {
        Some(Commands::Config { cmd: ConfigCommands::Show { full } }) => {
            commands::config::show_config(&config, source.as_deref(), full, output)
        }
        None => commands::convert::run_convert(config, output).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    if let Err(e) = run(cli, &output).await {
        output.error(format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
