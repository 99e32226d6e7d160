// Local crates
use crate::{
    events::feed::{ConsoleFeed, HttpFeed},
    helpers::load_config::Config,
    instrumentation::tracing::init_tracing,
    runtime::runtime::{TailRequest, run_tail},
};

// External crates
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "edgetail",
    long_about = "edgetail follows edge function console logs and HTTP access logs from the events API, printing each event once as it arrives.",
    about = "Tail edge function and HTTP events",
    version,
    term_width = 100,
    after_help = "\
    EXAMPLES:
        edgetail functions --function-id 1234 --tail
        edgetail http --host www.example.com --limit 20 --pretty
        edgetail validate --config ./edgetail.toml"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show console logs written by edge functions
    Functions {
        /// Only show events of this function
        #[arg(long = "function-id", value_name = "ID")]
        function_id: Option<String>,

        #[command(flatten)]
        args: TailArgs,
    },

    /// Show HTTP access events served at the edge
    Http {
        /// Only show events for this host
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        #[command(flatten)]
        args: TailArgs,
    },

    /// Validate the configuration file and print the effective settings
    Validate {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Display version information
    Version,
}

/// Where configuration and credentials come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Configuration file (default: ~/.config/edgetail/edgetail.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// API token, overrides the configured one
    #[arg(long, env = "EDGETAIL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Flags shared by every tailing command.
#[derive(Args, Debug, Clone, Default)]
pub struct TailArgs {
    /// Keep polling for new events until interrupted
    #[arg(short, long)]
    pub tail: bool,

    /// Print every field of each event on its own line
    #[arg(short, long)]
    pub pretty: bool,

    /// Maximum number of events per poll; zero or less uses the default
    #[arg(short, long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Start this many minutes in the past
    #[arg(long, value_name = "MINUTES")]
    pub since_minutes: Option<u64>,

    /// Seconds to wait between polls when tailing
    #[arg(long, value_name = "SECONDS")]
    pub interval_secs: Option<u64>,

    /// Never color the output
    #[arg(long)]
    pub no_color: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

impl TailArgs {
    fn request(&self, entity_filter: Option<String>) -> TailRequest {
        TailRequest {
            entity_filter,
            limit: self.limit,
            tail: self.tail,
            verbose: self.pretty,
            no_color: self.no_color,
            lookback_minutes: self.since_minutes,
            interval_secs: self.interval_secs,
        }
    }
}

/// Entry function for CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Functions { function_id, args } => {
            let cfg = load(&args.source)?;
            let _guard = init_tracing(&cfg.logging);
            run_tail::<ConsoleFeed>(cfg, args.request(function_id)).await?
        }
        Commands::Http { host, args } => {
            let cfg = load(&args.source)?;
            let _guard = init_tracing(&cfg.logging);
            run_tail::<HttpFeed>(cfg, args.request(host)).await?
        }
        Commands::Validate { source } => validate_config(&source)?,
        Commands::Version => show_version(),
    }

    Ok(())
}

//
// ------------------------ Command Implementations ------------------------------
//

/// Load configuration and apply the command line token on top of it.
fn load(source: &SourceArgs) -> Result<Config> {
    let mut cfg = Config::load(source.config.as_deref())?;
    if let Some(token) = source.token.as_ref().filter(|t| !t.trim().is_empty()) {
        cfg.general.token = Some(token.clone());
    }
    Ok(cfg)
}

/// Validate configuration file
fn validate_config(source: &SourceArgs) -> Result<()> {
    let cfg = load(source)?;
    let rendered =
        toml::to_string_pretty(&cfg.redacted()).context("Failed to render configuration")?;

    println!("Configuration valid:\n\n{rendered}");
    if cfg.token().is_none() {
        println!("warning: no API token configured, tailing commands will fail");
    }
    Ok(())
}

/// Show version information
fn show_version() {
    println!("edgetail {}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn functions_flags_map_to_request() {
        let cli = Cli::try_parse_from([
            "edgetail",
            "functions",
            "--function-id",
            "fn-1",
            "--tail",
            "--pretty",
            "--limit",
            "-3",
            "--since-minutes",
            "30",
        ])
        .unwrap();

        let Commands::Functions { function_id, args } = cli.command else {
            panic!("expected functions command");
        };
        let request = args.request(function_id);

        assert_eq!(request.entity_filter.as_deref(), Some("fn-1"));
        assert!(request.tail);
        assert!(request.verbose);
        assert_eq!(request.limit, Some(-3));
        assert_eq!(request.lookback_minutes, Some(30));
    }

    #[test]
    fn http_defaults_to_one_shot_compact() {
        let cli = Cli::try_parse_from(["edgetail", "http", "--host", "www.example.com"]).unwrap();

        let Commands::Http { host, args } = cli.command else {
            panic!("expected http command");
        };
        let request = args.request(host);

        assert_eq!(request.entity_filter.as_deref(), Some("www.example.com"));
        assert!(!request.tail);
        assert!(!request.verbose);
        assert_eq!(request.limit, None);
    }
}
