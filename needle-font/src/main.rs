use std::path::PathBuf;

use clap::{Parser, Subcommand};
use needle_font::config::{Overrides, load_config};
use needle_font::diagnostics::{StageTracker, install_dump_handler};
use needle_font::exit_code;
use needle_font::run::{RunOptions, RunOutcome, run};
use shared::{NeedleFontConfig, Preset};

#[derive(Parser)]
#[command(name = "needle-font")]
#[command(about = "Generates clock needle fonts driven by countdown-timer ligatures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the second-hand template's lookup in place
    SecondHand,
    /// Minute-resolution needles over an hour-qualified window
    MinuteHand,
    /// Per-second sweep needles with an echo trail
    Sweep,
    /// Run from a TOML configuration file
    Generate {
        #[arg(long, short)]
        config: PathBuf,
    },
}

fn resolve_config(cli: &Cli) -> anyhow::Result<NeedleFontConfig> {
    let mut config = match &cli.command {
        Commands::SecondHand => NeedleFontConfig::preset(Preset::SecondHand),
        Commands::MinuteHand => NeedleFontConfig::preset(Preset::MinuteHand),
        Commands::Sweep => NeedleFontConfig::preset(Preset::Sweep),
        Commands::Generate { config } => load_config(config)?,
    };
    cli.overrides.apply(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(exit_code(&e));
        }
    };

    if cli.overrides.print_config {
        match config.to_toml_string() {
            Ok(toml) => {
                print!("{toml}");
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("Error: {:#}", e);
                std::process::exit(2);
            }
        }
    }

    let tracker = StageTracker::new();
    if let Err(e) = install_dump_handler(&tracker) {
        log::warn!("Diagnostic signal handler unavailable: {e}");
    }

    let options = RunOptions {
        dry_run: cli.overrides.dry_run,
        ..RunOptions::new(config)
    };

    match run(options, &tracker).await {
        Ok(RunOutcome::Written(path)) => {
            log::info!("Done: {}", path.display());
        }
        Ok(RunOutcome::DryRun(summary)) => {
            println!("{summary}");
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(exit_code(&e));
        }
    }
}
