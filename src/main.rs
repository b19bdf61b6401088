//! pwv - Password vault request client
//!
//! Usage:
//!   pwv list                                List requests waiting for your approval
//!   pwv approve --allowed-users KEY1,KEY2   Confirm requests from allow-listed users
//!   pwv retrieve                            Print credentials for your approved requests

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pwv::config::Config;
use pwv::transport::HttpTransport;
use pwv::{AllowList, ApprovalOutcome, Session, VaultTime};

#[derive(Parser, Debug)]
#[command(name = "pwv")]
#[command(author, version, about = "Password vault request client", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the password vault
    #[arg(long, env = "PWV_URL")]
    url: Option<String>,

    /// Username to log in with
    #[arg(short, long, env = "PWV_USERNAME")]
    username: Option<String>,

    /// Password (prompted for if not given)
    #[arg(long, env = "PWV_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List requests waiting for your approval
    List,

    /// Confirm waiting requests from allow-listed users
    Approve {
        /// Users whose requests are confirmed, separated by commas
        #[arg(short, long, value_name = "USERS")]
        allowed_users: Option<AllowList>,

        /// Reason sent with each confirmation
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Print credentials for your own approved requests
    Retrieve,
}

/// Command with config defaults applied
enum Operation {
    List,
    Approve { allowed: AllowList, reason: String },
    Retrieve,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.json_logs);

    let config = Config::load(args.config.as_ref())?;
    tracing::debug!(config = ?config, "loaded configuration");

    let base_url = args
        .url
        .clone()
        .or_else(|| config.vault.base_url.clone())
        .context("no vault URL given (use --url or set vault.base_url)")?;

    let username = args
        .username
        .clone()
        .or_else(|| config.vault.username.clone())
        .context("no username given (use --username or set vault.username)")?;

    let operation = match &args.command {
        Command::List => Operation::List,
        Command::Approve {
            allowed_users,
            reason,
        } => {
            let allowed = allowed_users.clone().unwrap_or_else(|| config.allow_list());
            if allowed.is_empty() {
                bail!("no allowed users given (use --allowed-users or set approval.allowed_users)");
            }
            Operation::Approve {
                allowed,
                reason: reason.clone().unwrap_or_else(|| config.approval.reason.clone()),
            }
        }
        Command::Retrieve => Operation::Retrieve,
    };

    let password = match &args.password {
        Some(password) => password.clone(),
        None => rpassword::prompt_password(format!("{username}'s Password: "))
            .context("failed to read password")?,
    };

    let mut vault_config = config.vault.clone();
    vault_config.accept_invalid_certs |= args.insecure;
    let transport = HttpTransport::new(&vault_config)?;

    let mut session = Session::new(base_url, Box::new(transport));
    if let Err(e) = session.login(&username, &password) {
        eprintln!("could not login: {e}");
        std::process::exit(1);
    }

    let result = match &operation {
        Operation::List => list_incoming(&session, args.json),
        Operation::Approve { allowed, reason } => approve(&session, allowed, reason, args.json),
        Operation::Retrieve => retrieve(&session, args.json),
    };

    if let Err(e) = session.logout() {
        eprintln!("unable to logout: {e}");
    }

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: u8, json_logs: bool) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pwv={log_level},warn")));

    // Logs go to stderr; stdout carries results only
    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn list_incoming(session: &Session, json: bool) -> anyhow::Result<()> {
    let list = session.list_incoming()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list.incoming_requests)?);
        return Ok(());
    }

    if list.incoming_requests.is_empty() {
        println!("There are no incoming requests.");
        return Ok(());
    }

    for request in &list.incoming_requests {
        println!(
            "Incoming: {}, '{}' ('{}')",
            request.requestor_user_name,
            request.account_details.properties.name,
            request.user_reason
        );
    }

    Ok(())
}

#[derive(Serialize)]
struct ApprovalReport<'a> {
    request_id: &'a str,
    requestor: &'a str,
    account: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn approve(
    session: &Session,
    allowed: &AllowList,
    reason: &str,
    json: bool,
) -> anyhow::Result<()> {
    let list = session.list_incoming()?;

    if list.incoming_requests.is_empty() && !json {
        println!("There are no incoming requests.");
        return Ok(());
    }

    let approvals = session.approve_matching(&list.incoming_requests, allowed, reason);

    if json {
        let report: Vec<_> = approvals
            .iter()
            .map(|approval| {
                let (status, error) = match &approval.outcome {
                    ApprovalOutcome::Confirmed => ("confirmed", None),
                    ApprovalOutcome::Ignored => ("ignored", None),
                    ApprovalOutcome::Failed(e) => ("failed", Some(e.to_string())),
                };
                ApprovalReport {
                    request_id: &approval.request.request_id,
                    requestor: &approval.request.requestor_user_name,
                    account: &approval.request.account_details.properties.name,
                    status,
                    error,
                }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for approval in &approvals {
        let request = approval.request;
        let requestor = request.requestor_user_name.to_uppercase();
        let account = &request.account_details.properties.name;

        match &approval.outcome {
            ApprovalOutcome::Confirmed => {
                println!("Confirmed: {requestor}, '{account}' ('{}')", request.user_reason);
            }
            ApprovalOutcome::Failed(e) => {
                println!("Failed: {requestor}, '{account}' ('{}')", request.user_reason);
                eprintln!("unable to confirm request {}: {e}", request.request_id);
            }
            ApprovalOutcome::Ignored => {
                println!(
                    "Ignoring: {requestor}, \"{}\" from {} to {}",
                    request.user_reason,
                    display_time(request.access_from),
                    display_time(request.access_to)
                );
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct CredentialReport<'a> {
    request_id: &'a str,
    account: &'a str,
    account_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    credential: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn retrieve(session: &Session, json: bool) -> anyhow::Result<()> {
    let requests = session.list_my_requests()?;

    if requests.is_empty() && !json {
        println!("There are no requests.");
        return Ok(());
    }

    let outcomes = session.retrieve_credentials(&requests);

    if json {
        let report: Vec<_> = outcomes
            .iter()
            .map(|outcome| CredentialReport {
                request_id: &outcome.request.request_id,
                account: &outcome.request.account_details.properties.name,
                account_id: &outcome.request.account_details.account_id,
                credential: outcome.credential.as_deref().ok(),
                error: outcome.credential.as_ref().err().map(ToString::to_string),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for outcome in &outcomes {
        let account = &outcome.request.account_details.properties.name;
        match &outcome.credential {
            Ok(credential) => println!("{account} = {credential}"),
            Err(e) => eprintln!("unable to retrieve credential for {account}: {e}"),
        }
    }

    Ok(())
}

fn display_time(time: Option<VaultTime>) -> String {
    time.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
}
