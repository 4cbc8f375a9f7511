mod verbose;

use std::path::Path;

use clap::{FromArgMatches as _, IntoApp as _, Parser, Subcommand};
use tracing_error::ErrorLayer;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};
use twelf::Layer;

use family_night_common::Conf;

static JSON_CONFIG: &str = "family-night.json";
static TOML_CONFIG: &str = "family-night.toml";

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    #[clap(flatten)]
    verbose: verbose::Verbosity,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parental guide for a title identifier (e.g. tt0111161)
    Lookup {
        id: String,

        /// Print the normalized advisory as JSON
        #[clap(long)]
        json: bool,
    },
    /// Start the add-on web server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), family_night_common::Report> {
    family_night_common::install()?;

    let matches = Cli::command().args(&Conf::clap_args()).get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let mut layers = Vec::with_capacity(4);
    if Path::new(JSON_CONFIG).exists() {
        layers.push(Layer::Json(JSON_CONFIG.into()));
    }
    if Path::new(TOML_CONFIG).exists() {
        layers.push(Layer::Toml(TOML_CONFIG.into()));
    }
    layers.push(Layer::Env(Some("FAMILY_NIGHT_".to_string())));
    layers.push(Layer::Clap(matches));

    let conf = Conf::with_layers(&layers)?;

    let subscriber = Registry::default()
        .with(ErrorLayer::default())
        .with(tracing_subscriber::fmt::Layer::default())
        .with(EnvFilter::from_default_env().add_directive(cli.verbose.log_level_filter().into()));

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Lookup { id, json } => family_night_scrape::run(&conf, &id, json).await?,
        Commands::Serve => family_night_command_serve::run(&conf).await?,
    }

    Ok(())
}
