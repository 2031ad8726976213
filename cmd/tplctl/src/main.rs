use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod client;
mod commands;
mod config;
mod types;
mod utils;

use client::ApiClient;
use commands::*;
use config::{Config, Settings};

const LOG_ENV_VAR: &str = "TPLCTL_LOG";

#[derive(Parser)]
#[command(
    name = "tplctl",
    version,
    about = "Manage project templates",
    long_about = "Command-line interface for managing project templates\n\n\
                  Examples:\n  \
                  tplctl login --username dev\n  \
                  tplctl template show --name api\n  \
                  tplctl template update --id tmpl-1 --summary \"REST API\" --tag go\n\n\
                  For more help: tplctl help",
    after_help = "Use 'tplctl <command> --help' for more information about a command."
)]
struct Cli {
    /// API endpoint URL (defaults to the logged-in address)
    #[arg(long, global = true, env = "TPLCTL_API_URL")]
    api_url: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    output: OutputFormat,

    /// Request timeout in seconds
    #[arg(
        long,
        global = true,
        env = "TPLCTL_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
    Compact,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage project templates
    #[command(subcommand)]
    Template(TemplateCommands),

    /// Save the user context used for requests
    Login {
        /// User name sent with every request
        #[arg(long)]
        username: Option<String>,

        /// Bearer token sent with every request
        #[arg(long, env = "TPLCTL_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Remove the saved user context
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    // Parse CLI arguments; bad flags fail like any other command error
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "✗".red(), format!("{:#}", err).red());
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so `--output json` stays parseable. Set TPLCTL_LOG to
/// a tracing filter such as "debug" or "tplctl=trace" for more detail.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| "warn".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Template(cmd) => {
            // Ctrl-C aborts in-flight requests. Only registered here: other
            // commands never check the token and keep the default handler.
            let cancel = CancellationToken::new();
            let signal_token = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    signal_token.cancel();
                }
            });

            let settings = Settings::resolve(cli.api_url, cli.timeout, Config::load()?);

            // Initialize API client
            let client = ApiClient::new(&settings.api_url, settings.timeout)?
                .with_username(settings.username)
                .with_token(settings.token);
            debug!(api_url = client.base_url(), "client ready");

            let subcommand = cmd.name();
            match template::handle(&client, cmd, &cli.output, &cancel).await {
                Ok(()) => Ok(()),
                Err(err @ CommandError::Validation { .. }) => Err(anyhow::anyhow!(
                    "{}\n\n{}",
                    err,
                    usage(&["template", subcommand])
                )),
                Err(err) => Err(err.into()),
            }
        }
        Commands::Login { username, token } => login::login(cli.api_url, username, token),
        Commands::Logout => login::logout(),
    }
}

/// Help text of the (sub)command at `path`
fn usage(path: &[&str]) -> String {
    let mut command = Cli::command();
    command.build();

    let mut current = &command;
    for name in path {
        if let Some(sub) = current.find_subcommand(name) {
            current = sub;
        }
    }

    current.clone().render_help().to_string()
}
