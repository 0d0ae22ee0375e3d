//! coverdesk-data - Backend check tool
//!
//! Runs one fetch or submission against the configured backend and prints the
//! classified result. Useful for checking how the data layer sees a given
//! backend deployment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coverdesk_common::config::TomlConfig;
use coverdesk_data::{Attachment, CanonicalField, DataError, RecordDraft, RecordRepository, RecordType, Session};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for coverdesk-data
#[derive(Parser, Debug)]
#[command(name = "coverdesk-data")]
#[command(about = "Run one fetch or submission against the coverdesk record backend")]
#[command(version)]
struct Args {
    /// Config file (overrides COVERDESK_CONFIG and the default location)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Logged-in user identifier
    #[arg(long, env = "COVERDESK_USER_ID")]
    user_id: String,

    /// Backend session identifier
    #[arg(long)]
    session_id: Option<String>,

    /// Bearer token
    #[arg(long, env = "COVERDESK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch all records of a type
    Fetch {
        record_type: RecordType,

        /// Print these fields instead of raw JSON
        #[arg(long = "field")]
        fields: Vec<CanonicalField>,
    },
    /// Submit a new record
    Submit {
        record_type: RecordType,

        /// Canonical field value (`displayName=Asha`)
        #[arg(long = "set", value_parser = parse_canonical_pair)]
        fields: Vec<(CanonicalField, String)>,

        /// Raw wire field value (`li_nominee=Sita`)
        #[arg(long = "extra", value_parser = parse_pair)]
        extra: Vec<(String, String)>,

        /// File upload (`li_photo=./photo.jpg[:image/jpeg]`)
        #[arg(long = "attach", value_parser = parse_attachment)]
        attachments: Vec<Attachment>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(base_url) = &args.base_url {
        config.backend.base_url = base_url.clone();
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("coverdesk-data v{} using {}", env!("CARGO_PKG_VERSION"), config.backend.base_url);

    let mut session = Session::new(args.user_id.clone());
    if let Some(session_id) = &args.session_id {
        session = session.with_session_id(session_id.clone());
    }
    if let Some(token) = &args.token {
        session = session.with_token(token.clone());
    }

    let repository = RecordRepository::from_config(&config)
        .context("Failed to initialize record repository")?
        .with_session(session);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    match args.command {
        Command::Fetch { record_type, fields } => {
            let result = match repository.fetch(record_type, &cancel).await {
                Err(DataError::Cancelled) => {
                    println!("Cancelled");
                    return Ok(());
                }
                other => other.context("Fetch failed")?,
            };

            println!("{}", result.user_message());
            if let Some(collection) = result.collection() {
                for record in collection {
                    if fields.is_empty() {
                        println!("{}", serde_json::to_string(record)?);
                    } else {
                        let values: Vec<String> = fields
                            .iter()
                            .map(|field| repository.display(record_type, record, *field))
                            .collect();
                        println!("{}", values.join(" | "));
                    }
                }
            }
        }
        Command::Submit {
            record_type,
            fields,
            extra,
            attachments,
        } => {
            let mut draft = RecordDraft::new();
            for (field, value) in fields {
                draft = draft.set(field, value);
            }
            for (name, value) in extra {
                draft = draft.extra(name, value);
            }
            for attachment in attachments {
                draft = draft.attach(attachment);
            }

            match repository.submit(record_type, draft, &cancel).await {
                Err(DataError::Cancelled) => println!("Cancelled"),
                other => println!("{}", other.context("Submission failed")?),
            }
        }
    }

    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, cancelling");
            cancel.cancel();
        }
        Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
    }
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty field name in '{}'", s));
    }
    Ok((name.to_string(), value.to_string()))
}

fn parse_canonical_pair(s: &str) -> Result<(CanonicalField, String), String> {
    let (name, value) = parse_pair(s)?;
    Ok((name.parse()?, value))
}

fn parse_attachment(s: &str) -> Result<Attachment, String> {
    let (field_name, target) = parse_pair(s)?;
    // A trailing `:type/subtype` is a MIME type, anything else is part of the path
    let (path, mime_type) = match target.rsplit_once(':') {
        Some((path, mime)) if is_mime_type(mime) && !path.is_empty() => (path.to_string(), mime.to_string()),
        _ => {
            let mime = guess_mime_type(&target).to_string();
            (target, mime)
        }
    };
    Ok(Attachment::from_path(field_name, path, mime_type))
}

fn is_mime_type(s: &str) -> bool {
    match s.split_once('/') {
        Some((kind, subtype)) => {
            !kind.is_empty()
                && !subtype.is_empty()
                && kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                && !subtype.contains(['/', '\\'])
        }
        None => false,
    }
}

fn guess_mime_type(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
