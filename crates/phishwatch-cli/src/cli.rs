//! Argument parsing, logging setup and command dispatch.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand, ValueEnum};
use phishwatch_session::config::{
    AuthScheme, ClientConfig, DEFAULT_BACKEND_URL, env as config_env,
};
use phishwatch_session::credentials::{FileCredentialStore, default_credential_path};
use phishwatch_session::filter::FilterOption;
use phishwatch_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
use url::Url;

use crate::client::{AppContext, CliError, CliResult, parse_url};
use crate::commands::account::{
    handle_delete_account, handle_login, handle_logout, handle_register, handle_whoami,
};
use crate::commands::check::handle_check;
use crate::commands::links::{handle_delete, handle_links, handle_toggle};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLL_SECS: u64 = 5;

/// Parses CLI arguments, executes the requested command, and reports the
/// outcome. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.map_or_else(LogFormat::infer, LogFormatArg::into_format),
        build_sha: option_env!("PHISHWATCH_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let result = match build_context(&cli) {
        Ok(ctx) => dispatch(cli.command, &ctx, cli.output).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn build_context(cli: &Cli) -> CliResult<AppContext> {
    let config = cli.client_config();
    let path = config
        .credential_path
        .clone()
        .or_else(default_credential_path)
        .ok_or_else(|| {
            CliError::failure(anyhow!(
                "no config directory available; pass --credential-file"
            ))
        })?;
    AppContext::new(config, Arc::new(FileCredentialStore::new(path)))
}

pub(crate) async fn dispatch(
    command: Command,
    ctx: &AppContext,
    output: OutputFormat,
) -> CliResult<()> {
    match command {
        Command::Login(args) => handle_login(ctx, args).await,
        Command::Register(args) => handle_register(ctx, args).await,
        Command::Logout => {
            handle_logout(ctx);
            Ok(())
        }
        Command::Whoami => handle_whoami(ctx, output),
        Command::Links(args) => handle_links(ctx, args, output).await,
        Command::Toggle(args) => handle_toggle(ctx, args, output).await,
        Command::Delete(args) => handle_delete(ctx, args).await,
        Command::Check(args) => handle_check(ctx, args, output).await,
        Command::DeleteAccount(args) => handle_delete_account(ctx, args).await,
    }
}

#[derive(Parser)]
#[command(name = "phishwatch", about = "Track, block and check suspicious links")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = config_env::BACKEND_URL,
        value_parser = parse_url,
        default_value = DEFAULT_BACKEND_URL
    )]
    api_url: Url,
    #[arg(
        long,
        global = true,
        env = config_env::HTTP_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    timeout: u64,
    #[arg(
        long,
        global = true,
        env = config_env::POLL_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = DEFAULT_POLL_SECS
    )]
    poll_interval: u64,
    #[arg(
        long,
        global = true,
        value_enum,
        env = config_env::AUTH_SCHEME,
        default_value_t = AuthSchemeArg::TokenHeader
    )]
    auth_scheme: AuthSchemeArg,
    #[arg(long, global = true, env = config_env::CREDENTIAL_PATH)]
    credential_file: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[arg(long, global = true, value_enum, env = "PHISHWATCH_LOG_FORMAT")]
    log_format: Option<LogFormatArg>,
    #[arg(
        long,
        global = true,
        env = "PHISHWATCH_LOG",
        default_value = DEFAULT_LOG_LEVEL
    )]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            poll_interval: Duration::from_secs(self.poll_interval),
            request_timeout: Duration::from_secs(self.timeout),
            auth_scheme: self.auth_scheme.into(),
            credential_path: self.credential_file.clone(),
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Sign in and store the issued token.
    Login(LoginArgs),
    /// Create an account (does not sign in).
    Register(RegisterArgs),
    /// Forget the stored token.
    Logout,
    /// Show the profile carried by the stored token.
    Whoami,
    /// List tracked links.
    Links(LinksArgs),
    /// Flip the blocked flag of a link.
    Toggle(UrlArgs),
    /// Stop tracking a link.
    Delete(UrlArgs),
    /// Ask the backend whether a URL is safe.
    Check(UrlArgs),
    /// Permanently delete the signed-in account.
    DeleteAccount(DeleteAccountArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct LoginArgs {
    /// Account name; prompted for when omitted.
    #[arg(long, short)]
    pub(crate) username: Option<String>,
    /// Password; prompted for when omitted.
    #[arg(long, env = "PHISHWATCH_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RegisterArgs {
    #[arg(long, short)]
    pub(crate) username: String,
    #[arg(long, short)]
    pub(crate) email: String,
    /// Avatar URL.
    #[arg(long)]
    pub(crate) profile_image: Option<String>,
    /// Password; prompted for (twice) when omitted.
    #[arg(long, env = "PHISHWATCH_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
    /// Repeat of the password; prompted for when omitted.
    #[arg(long)]
    pub(crate) confirm_password: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct LinksArgs {
    /// Case-insensitive domain substring.
    #[arg(long, short)]
    pub(crate) search: Option<String>,
    #[arg(long, short, value_enum, default_value_t = FilterArg::All)]
    pub(crate) filter: FilterArg,
    /// Keep polling and print every new snapshot until interrupted.
    #[arg(long, short)]
    pub(crate) watch: bool,
    /// Stop watching after this many snapshots.
    #[arg(long, requires = "watch")]
    pub(crate) count: Option<u32>,
}

#[derive(Args, Debug)]
pub(crate) struct UrlArgs {
    pub(crate) url: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DeleteAccountArgs {
    /// Skip the confirmation prompt.
    #[arg(long, short)]
    pub(crate) yes: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum, PartialEq, Eq)]
pub(crate) enum FilterArg {
    #[default]
    All,
    Safe,
    Unsafe,
    Blocked,
    Unblocked,
}

impl From<FilterArg> for FilterOption {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => Self::All,
            FilterArg::Safe => Self::Safe,
            FilterArg::Unsafe => Self::Unsafe,
            FilterArg::Blocked => Self::Blocked,
            FilterArg::Unblocked => Self::Unblocked,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub(crate) enum AuthSchemeArg {
    TokenHeader,
    Bearer,
}

impl From<AuthSchemeArg> for AuthScheme {
    fn from(value: AuthSchemeArg) -> Self {
        match value {
            AuthSchemeArg::TokenHeader => Self::TokenHeader,
            AuthSchemeArg::Bearer => Self::Bearer,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub(crate) enum LogFormatArg {
    Pretty,
    Json,
}

impl LogFormatArg {
    const fn into_format(self) -> LogFormat {
        match self {
            Self::Pretty => LogFormat::Pretty,
            Self::Json => LogFormat::Json,
        }
    }
}
