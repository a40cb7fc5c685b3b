mod admin_cmd;
mod auth_cmd;
mod config_command;
mod marketplace_cmd;
mod output;
mod request_cmd;

use std::io::IsTerminal;

use anyhow::Context;
use clap::Parser;
use estate_backend_client::ApiError;
use estate_core::CliConfigOverrides;
use estate_core::Config;
use estate_core::ConfigError;
use estate_core::Connection;
use tracing::warn;
use tracing_subscriber::EnvFilter;

pub use admin_cmd::AdminCommand;
pub use auth_cmd::LoginArgs;
pub use auth_cmd::RegisterArgs;
pub use marketplace_cmd::CategoriesCommand;
pub use marketplace_cmd::ChatArgs;
pub use marketplace_cmd::FavoritesCommand;
pub use marketplace_cmd::GeocodeArgs;
pub use marketplace_cmd::ProfileCommand;
pub use marketplace_cmd::PropertiesCommand;
pub use marketplace_cmd::RealtorsCommand;
pub use request_cmd::RequestArgs;

pub const EXIT_CODE_UNAUTHENTICATED: i32 = 2;
pub const EXIT_CODE_INVALID_CONFIG: i32 = 3;

/// Command-line client for the estate marketplace API.
///
/// The session and refresh cookie are kept under `$ESTATE_HOME` (default
/// `~/.estate`), so a login in one invocation carries over to the next.
#[derive(Debug, Parser)]
#[clap(author, version, bin_name = "estate")]
pub struct Cli {
    #[clap(flatten)]
    pub config_overrides: CliConfigOverrides,

    #[clap(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    /// Sign in with email and password.
    Login(LoginArgs),

    /// Create a new account.
    Register(RegisterArgs),

    /// End the session here and on the server.
    Logout,

    /// Show whether a session is stored and its role.
    Whoami,

    /// Browse and manage listings.
    #[clap(subcommand)]
    Properties(PropertiesCommand),

    /// Manage the current user's favorites.
    #[clap(subcommand)]
    Favorites(FavoritesCommand),

    /// List listing categories.
    #[clap(subcommand)]
    Categories(CategoriesCommand),

    /// Browse realtors and their reviews.
    #[clap(subcommand)]
    Realtors(RealtorsCommand),

    /// Show or edit the current user's profile.
    #[clap(subcommand)]
    Profile(ProfileCommand),

    /// Ask the listing assistant.
    Chat(ChatArgs),

    /// Geocode an address and show which zoom a map would use.
    Geocode(GeocodeArgs),

    /// Administrator operations. Requires an ADMIN session.
    #[clap(subcommand)]
    Admin(AdminCommand),

    /// Send an arbitrary call through the access layer.
    Request(RequestArgs),

    /// Validate config.toml and print the effective settings.
    Config,
}

/// Logs go to stderr so stdout stays parseable JSON. `RUST_LOG` overrides
/// the default level.
fn init_logging() {
    let default_level = "warn";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    init_logging();

    let Cli {
        config_overrides,
        subcommand,
    } = cli;
    let overrides = config_overrides
        .parse_overrides()
        .map_err(anyhow::Error::msg)?;
    let config = Config::load_with_cli_overrides(overrides)?;

    if let Subcommand::Config = subcommand {
        config_command::print_config(&config);
        return Ok(());
    }

    let conn = Connection::open(&config).with_context(|| {
        format!(
            "failed to load session from {}",
            config.estate_home.display()
        )
    })?;
    let result = dispatch(&conn, subcommand).await;
    // Save the cookie jar even when the command failed; a renewal may have
    // rotated the refresh cookie before the failure.
    if let Err(err) = conn.persist_cookies() {
        warn!("failed to save cookies: {err}");
    }
    result
}

async fn dispatch(conn: &Connection, subcommand: Subcommand) -> anyhow::Result<()> {
    match subcommand {
        Subcommand::Login(args) => auth_cmd::run_login(conn, args).await,
        Subcommand::Register(args) => auth_cmd::run_register(conn, args).await,
        Subcommand::Logout => auth_cmd::run_logout(conn).await,
        Subcommand::Whoami => auth_cmd::run_whoami(conn),
        Subcommand::Properties(cmd) => cmd.run(conn).await,
        Subcommand::Favorites(cmd) => cmd.run(conn).await,
        Subcommand::Categories(cmd) => cmd.run(conn).await,
        Subcommand::Realtors(cmd) => cmd.run(conn).await,
        Subcommand::Profile(cmd) => cmd.run(conn).await,
        Subcommand::Chat(args) => marketplace_cmd::run_chat(conn, args).await,
        Subcommand::Geocode(args) => marketplace_cmd::run_geocode(conn, args).await,
        Subcommand::Admin(cmd) => cmd.run(conn).await,
        Subcommand::Request(args) => request_cmd::run_request(conn, args).await,
        Subcommand::Config => Ok(()),
    }
}

/// Process exit code for an error returned by [`run_main`].
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() {
        return EXIT_CODE_INVALID_CONFIG;
    }
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::Unauthenticated) => EXIT_CODE_UNAUTHENTICATED,
        _ => 1,
    }
}

/// Message printed to stderr for an error returned by [`run_main`].
pub fn error_message(err: &anyhow::Error) -> String {
    if err.downcast_ref::<ConfigError>().is_some() {
        return format!("Config validation error: {err}");
    }
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::Unauthenticated) => {
            "Session expired. Please run 'estate login' to sign in again.".to_string()
        }
        _ => format!("Error: {err:#}"),
    }
}
