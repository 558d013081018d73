use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rubberduck_lib::{
    classifier::SoundCategory,
    commands::{self, AppPaths},
    listener::ListenerOptions,
    utils::logging,
};

#[derive(Parser)]
#[command(version, about = "Plays encouraging sounds while you code")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, env = "RUBBERDUCK_SETTINGS", global = true)]
    settings: Option<PathBuf>,

    /// Directory holding one sub-directory of sound files per category
    #[arg(long, env = "RUBBERDUCK_SOUNDS", global = true)]
    sounds: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read editor notifications from stdin, one JSON object per line
    Listen {
        /// Re-check the edited document's last known diagnostics on every edit
        #[arg(long)]
        recheck_on_edit: bool,
    },
    Enable,
    Disable,
    SetVolume {
        #[arg(allow_negative_numbers = true)]
        volume: f32,
    },
    /// Play one sound from a category
    Play {
        category: SoundCategory,
    },
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let paths = AppPaths::resolve(cli.settings, cli.sounds)?;

    match cli.command {
        Commands::Listen { recheck_on_edit } => {
            let options = ListenerOptions {
                recheck_on_edit,
                ..ListenerOptions::default()
            };
            commands::listen(&paths, options).await?;
        }
        Commands::Enable => {
            commands::set_enabled(&paths, true)?;
        }
        Commands::Disable => {
            commands::set_enabled(&paths, false)?;
        }
        Commands::SetVolume { volume } => {
            commands::set_volume(&paths, volume)?;
        }
        Commands::Play { category } => {
            let path = commands::play(&paths, category)?;
            println!("played {}", path.display());
        }
        Commands::Status => {
            print!("{}", commands::status(&paths)?);
        }
    }

    Ok(())
}
