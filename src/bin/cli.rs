//! Student Portal CLI
//!
//! Logs in, runs one operation, prints the JSON reply and logs out. Nothing
//! is kept between invocations.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use portal::{
    Portal,
    error::{AppError, Result},
    models::{Config, Credentials, LoginOptions, LoginReply, Operation, Reply},
};
use serde::Serialize;
use url::Url;

/// Student portal client
#[derive(Parser, Debug)]
#[command(
    name = "portal",
    version,
    about = "Student information portal client"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "portal.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration file
    Validate,

    /// Log in and print the outcome
    Login {
        #[command(flatten)]
        login: LoginArgs,

        /// Print the full handshake report
        #[arg(long)]
        debug: bool,

        /// Authenticated page probed after the postback
        #[arg(long)]
        check_path: Option<String>,

        /// Extra text that marks the authenticated area
        #[arg(long)]
        success_text: Option<String>,

        /// Additional form field as NAME=VALUE (repeatable)
        #[arg(long = "extra", value_parser = parse_key_value)]
        extra_fields: Vec<(String, String)>,
    },

    /// Log in, run one operation and print its result
    Fetch {
        /// Operation name (profile, announcements, home-announcements, courses, weekly-schedule, ...)
        operation: String,

        #[command(flatten)]
        login: LoginArgs,

        /// Page path overriding the configured one
        #[arg(long)]
        path: Option<String>,

        /// Maximum number of announcements
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Parse a saved HTML page without contacting the portal
    Parse {
        /// HTML file
        file: PathBuf,

        /// What to extract
        #[arg(long = "as", value_enum, default_value_t = ParseKind::Tables)]
        kind: ParseKind,

        /// Base URL used to resolve links
        #[arg(long)]
        base_url: Option<Url>,

        /// Maximum number of announcements
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Args, Debug)]
struct LoginArgs {
    /// Portal base URL
    #[arg(long, env = "PORTAL_BASE_URL")]
    base_url: String,

    /// Student number
    #[arg(short, long, env = "PORTAL_USERNAME")]
    username: String,

    /// Password
    #[arg(short, long, env = "PORTAL_PASSWORD", hide_env_values = true)]
    password: String,

    /// Login page path
    #[arg(long)]
    login_path: Option<String>,

    /// Name of the username input
    #[arg(long)]
    username_field: Option<String>,

    /// Name of the password input
    #[arg(long)]
    password_field: Option<String>,
}

impl LoginArgs {
    fn credentials(&self, config: &Config) -> Result<Credentials> {
        let mut credentials = Credentials::new(
            &self.base_url,
            self.username.as_str(),
            self.password.as_str(),
            &config.login,
        )?;
        if let Some(path) = &self.login_path {
            credentials = credentials.with_login_path(path.as_str());
        }
        if let Some(name) = &self.username_field {
            credentials = credentials.with_username_field(name.as_str());
        }
        if let Some(name) = &self.password_field {
            credentials = credentials.with_password_field(name.as_str());
        }
        Ok(credentials)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ParseKind {
    StudentInfo,
    Announcements,
    HomeAnnouncements,
    Records,
    Tables,
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `{error, kind}` for a failure that happened before any portal call.
fn error_reply(err: AppError) -> Reply<()> {
    Reply::from(Err::<(), AppError>(err))
}

fn print_error(err: AppError) -> Result<()> {
    print_json(&error_reply(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Validate => {
            log::info!("Validating {}...", cli.config.display());
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Login {
            login,
            debug,
            check_path,
            success_text,
            extra_fields,
        } => {
            let credentials = match login.credentials(&config) {
                Ok(credentials) => credentials,
                Err(e) => return print_error(e),
            };
            let mut portal = Portal::new(config);

            if debug {
                let options = LoginOptions {
                    check_path,
                    success_text,
                    extra_fields: extra_fields.into_iter().collect::<BTreeMap<_, _>>(),
                };
                let report = portal.login_debug(&credentials, &options).await;
                print_json(&report)?;
            } else {
                let reply = LoginReply::from(portal.login(&credentials).await);
                print_json(&reply)?;
            }

            if portal.is_authenticated() {
                portal.logout().await;
            }
        }

        Command::Fetch {
            operation,
            login,
            path,
            limit,
        } => {
            let operation: Operation = match operation.parse() {
                Ok(op) => op,
                Err(e) => return print_error(e),
            };

            let credentials = match login.credentials(&config) {
                Ok(credentials) => credentials,
                Err(e) => return print_error(e),
            };
            let mut portal = Portal::new(config);

            match portal.login(&credentials).await {
                Ok(true) => {
                    let result = portal.run(operation, path.as_deref(), limit).await;
                    print_json(&Reply::from(result))?;
                    portal.logout().await;
                }
                other => print_json(&LoginReply::from(other))?,
            }
        }

        Command::Parse {
            file,
            kind,
            base_url,
            limit,
        } => {
            let html = match tokio::fs::read_to_string(&file).await {
                Ok(html) => html,
                Err(e) => return print_error(AppError::from(e)),
            };
            let portal = Portal::new(config);
            let base = base_url.as_ref();

            match kind {
                ParseKind::StudentInfo => print_json(&portal.parse_student_info(&html, base))?,
                ParseKind::Announcements => {
                    print_json(&portal.parse_announcements(&html, base, limit))?
                }
                ParseKind::HomeAnnouncements => {
                    print_json(&portal.parse_home_announcements(&html, base, limit))?
                }
                ParseKind::Records => print_json(&portal.parse_records(&html))?,
                ParseKind::Tables => print_json(&portal.parse_tables(&html))?,
            }
        }
    }

    Ok(())
}
