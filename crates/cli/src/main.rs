mod cmd;
mod logging;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "scorevault",
    version,
    about = "Keep MuseScore exports in sync with a note vault"
)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate configuration and print resolved paths and settings
    Doctor,

    /// Watch the vault and export MuseScore files as they change
    Watch(WatchArgs),

    /// Export every MuseScore file whose exports are missing or stale
    Sync,

    /// Export a single MuseScore file
    Export(ExportArgs),

    /// Show the export state of every MuseScore file in the vault
    Status,

    /// Show how a link to a MuseScore file would be embedded
    Resolve(ResolveArgs),

    /// Show or change persisted settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Bring all exports up to date before watching
    #[arg(long)]
    pub sync: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Vault path of the MuseScore file (e.g. "Scores/Song.mscz")
    pub path: String,

    /// Only export this format (pdf or mxl)
    #[arg(long)]
    pub format: Option<String>,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Link text as written in a note (e.g. "Song.mscz#Chorus|alias")
    pub link: String,

    /// Treat an optional renderer as installed (repeatable)
    #[arg(long = "capability")]
    pub capabilities: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
enum SettingsCommands {
    /// Print all settings
    Show,

    /// Change a setting (folder-path, executable-path, embed-as, embed-subpath-as)
    Set { key: String, value: String },
}

fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Doctor => cmd::doctor::run(config, profile),
        Commands::Watch(args) => cmd::watch::run(config, profile, args.sync),
        Commands::Sync => cmd::sync::run(config, profile),
        Commands::Export(args) => {
            cmd::export::run(config, profile, &args.path, args.format.as_deref())
        }
        Commands::Status => cmd::status::run(config, profile),
        Commands::Resolve(args) => {
            cmd::resolve::run(config, profile, &args.link, &args.capabilities, args.json)
        }
        Commands::Settings { command } => match command {
            SettingsCommands::Show => cmd::settings::show(config, profile),
            SettingsCommands::Set { key, value } => {
                cmd::settings::set(config, profile, &key, &value)
            }
        },
    }
}
