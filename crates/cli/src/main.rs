// vmap - venue map data pipeline
// Loads the venue CSV, restores, enriches and geocodes it, writes venue-data.js

mod commands;
mod exit_codes;
mod geocode;
mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_CONFIG, EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};
use geocode::CredentialFlags;

#[derive(Parser)]
#[command(name = "vmap")]
#[command(about = "Venue map data pipeline: restore, enrich, geocode, publish")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Only log errors; skip the human summary
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Backend credentials. Each falls back to the environment variable named
/// by `credential_env` in pipeline.toml.
#[derive(clap::Args, Debug, Clone, Default)]
struct KeyArgs {
    /// Google Maps API key [fallback: $GOOGLE_MAPS_API_KEY]
    #[arg(long)]
    google_key: Option<String>,

    /// Mapbox access token [fallback: $MAPBOX_ACCESS_TOKEN]
    #[arg(long)]
    mapbox_token: Option<String>,

    /// Bing Maps API key [fallback: $BING_MAPS_API_KEY]
    #[arg(long)]
    bing_key: Option<String>,
}

impl From<KeyArgs> for CredentialFlags {
    fn from(k: KeyArgs) -> Self {
        CredentialFlags {
            google_key: k.google_key,
            mapbox_token: k.mapbox_token,
            bing_key: k.bing_key,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: restore, clean, enrich, geocode, write CSV and venue-data.js
    #[command(after_help = "\
Examples:
  vmap run venues.csv
  vmap run venues.csv --supplement venues-original.csv --js-out site/venue-data.js
  vmap run venues.csv --no-geocode --csv-out enriched.csv
  GOOGLE_MAPS_API_KEY=... vmap run venues.csv --json")]
    Run {
        /// Venue CSV
        input: PathBuf,

        /// Older or fuller CSV to restore missing venues from
        #[arg(long)]
        supplement: Option<PathBuf>,

        /// Where to write the updated CSV (default: overwrite input)
        #[arg(long)]
        csv_out: Option<PathBuf>,

        /// Where to write the map data file
        #[arg(long, default_value = "venue-data.js")]
        js_out: PathBuf,

        /// Pipeline config (default: <config dir>/venuemap/pipeline.toml)
        #[arg(long, env = "VMAP_CONFIG")]
        config: Option<PathBuf>,

        /// Skip geocoding; restore and enrich only
        #[arg(long)]
        no_geocode: bool,

        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        keys: KeyArgs,
    },

    /// Rewrite venue-data.js from a CSV, nothing else
    Regenerate {
        input: PathBuf,

        #[arg(long, short, default_value = "venue-data.js")]
        out: PathBuf,
    },

    /// Append venues present in the supplement but missing from base
    Restore {
        base: PathBuf,
        supplement: PathBuf,

        /// Output CSV (default: overwrite base)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// List venues of ORIGINAL absent from CURRENT (CSV or venue-data.js)
    #[command(after_help = "\
Exit status is 1 when any venue is missing, like diff(1).

Examples:
  vmap missing venues-original.csv venues.csv
  vmap missing venues.csv venue-data.js --json")]
    Missing {
        original: PathBuf,
        current: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Clear coordinates that fall outside the bounding box
    Clean {
        input: PathBuf,

        #[arg(long, short)]
        out: Option<PathBuf>,

        #[arg(long, env = "VMAP_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Normalize phone numbers to UK national format
    Phones {
        input: PathBuf,

        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Tag county (from postcode) and region, print the county histogram
    Counties {
        input: PathBuf,

        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Geocode one address through the configured backend chain
    Lookup {
        address: String,

        #[arg(long, env = "VMAP_CONFIG")]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,

        #[command(flatten)]
        keys: KeyArgs,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("VMAP_GIT_HASH"), ")",
        "\ntarget:  ", env!("VMAP_TARGET"),
    )
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "error" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);
    let quiet = cli.quiet;

    let result = match cli.command {
        Commands::Run {
            input,
            supplement,
            csv_out,
            js_out,
            config,
            no_geocode,
            json,
            keys,
        } => commands::cmd_run(commands::RunArgs {
            input,
            supplement,
            csv_out,
            js_out,
            config,
            geocode: !no_geocode,
            json,
            quiet,
            credentials: keys.into(),
        }),
        Commands::Regenerate { input, out } => commands::cmd_regenerate(input, out, quiet),
        Commands::Restore { base, supplement, out } => {
            commands::cmd_restore(base, supplement, out, quiet)
        }
        Commands::Missing { original, current, json } => {
            commands::cmd_missing(original, current, json, quiet)
        }
        Commands::Clean { input, out, config } => commands::cmd_clean(input, out, config, quiet),
        Commands::Phones { input, out } => commands::cmd_phones(input, out, quiet),
        Commands::Counties { input, out } => commands::cmd_counties(input, out, quiet),
        Commands::Lookup { address, config, json, keys } => {
            commands::cmd_lookup(address, config, json, keys.into())
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    pub fn config(err: venuemap_config::ConfigError) -> Self {
        Self {
            code: EXIT_CONFIG,
            message: err.to_string(),
            hint: Some("see `[bounds]`, `[retry]` and `[[backends]]` in pipeline.toml".to_string()),
        }
    }

    /// Exit with `code` and print nothing.
    pub fn silent(code: u8) -> Self {
        Self { code, message: String::new(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
