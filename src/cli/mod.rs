//! Command-line interface for rewrite-guard.
//!
//! Provides commands for judging a proposed rewrite, generating and judging
//! one, scanning a document, reading back the audit log and inspecting the
//! active configuration. All output is pretty-printed JSON on stdout.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config;
use crate::core::{Governed, Governor, JsonlAuditStore};
use crate::domain::{Decision, Intent, ValidationRequest};
use crate::validators::{DocumentScanner, Lexicon};

/// rewrite-guard - Semantic governance for AI-assisted rewrites
#[derive(Parser, Debug)]
#[command(name = "rewrite-guard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Judge a proposed rewrite against the original
    Validate {
        /// Original text
        #[arg(long, conflicts_with = "original_file")]
        original: Option<String>,

        /// Read the original from a file ("-" for stdin)
        #[arg(long)]
        original_file: Option<PathBuf>,

        /// Proposed text
        #[arg(long, conflicts_with = "proposed_file")]
        proposed: Option<String>,

        /// Read the proposal from a file ("-" for stdin)
        #[arg(long)]
        proposed_file: Option<PathBuf>,

        /// rewrite, humanize or clarify
        #[arg(short, long, default_value = "rewrite")]
        intent: String,

        /// Verified user id recorded in the audit log
        #[arg(short, long, env = "REWRITE_GUARD_USER", default_value = "local")]
        user: String,
    },

    /// Ask the configured provider for a rewrite, then judge it
    Rewrite {
        /// Text to rewrite
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a file ("-" for stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// rewrite, humanize or clarify
        #[arg(short, long, default_value = "rewrite")]
        intent: String,

        /// Verified user id recorded in the audit log
        #[arg(short, long, env = "REWRITE_GUARD_USER", default_value = "local")]
        user: String,
    },

    /// Scan a document for readability issues (never blocks)
    Scan {
        /// Document to scan ("-" for stdin)
        file: PathBuf,

        /// Compare against a revised version of the document
        #[arg(long)]
        compare: Option<PathBuf>,
    },

    /// Show a user's audit records, newest first
    Audit {
        /// User id
        #[arg(short, long, env = "REWRITE_GUARD_USER", default_value = "local")]
        user: String,

        /// Maximum number of records to show
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },

    /// Show the active similarity thresholds and risk bands
    Thresholds,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Validate {
                original,
                original_file,
                proposed,
                proposed_file,
                intent,
                user,
            } => {
                let original = read_text(original, original_file, "original")?;
                let proposed = read_text(proposed, proposed_file, "proposed")?;
                validate(original, proposed, &intent, &user).await
            }
            Commands::Rewrite {
                text,
                file,
                intent,
                user,
            } => {
                let text = read_text(text, file, "text")?;
                rewrite(&text, &intent, &user).await
            }
            Commands::Scan { file, compare } => scan(file, compare),
            Commands::Audit { user, limit } => show_audit(&user, limit).await,
            Commands::Thresholds => show_thresholds(),
            Commands::Config => show_config(),
        }
    }
}

/// Inline text, a file, or stdin when the file is "-"
fn read_text(inline: Option<String>, file: Option<PathBuf>, label: &str) -> Result<String> {
    match (inline, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {} file: {}", label, path.display())),
        (None, None) => bail!("No {} text provided. Pass it inline or as a file", label),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

/// Print the verdict, wait for the audit write, exit non-zero when blocked
async fn report(governed: Governed) -> Result<()> {
    let Governed {
        result,
        proposal,
        audit,
    } = governed;

    let audit_id = audit.audit_id();
    let audit_status = match audit.wait().await {
        Ok(_) => "written".to_string(),
        Err(e) => {
            eprintln!("[audit write failed: {}]", e);
            "failed".to_string()
        }
    };

    print_json(&serde_json::json!({
        "audit_id": audit_id,
        "audit_status": audit_status,
        "proposal": proposal,
        "result": result,
    }))?;

    if result.decision == Decision::Blocked {
        std::process::exit(1);
    }
    Ok(())
}

async fn validate(original: String, proposed: String, intent: &str, user: &str) -> Result<()> {
    let intent: Intent = intent.parse()?;
    let governor = Governor::from_config(config::config()?).await?;

    let governed = governor
        .validate(ValidationRequest::new(original, proposed, intent, user))
        .await?;
    report(governed).await
}

async fn rewrite(text: &str, intent: &str, user: &str) -> Result<()> {
    let intent: Intent = intent.parse()?;
    let governor = Governor::from_config(config::config()?).await?;

    let governed = governor.rewrite(text, intent, user).await?;
    report(governed).await
}

fn scan(file: PathBuf, compare: Option<PathBuf>) -> Result<()> {
    let cfg = config::config()?;
    let scanner = DocumentScanner::new(&Lexicon::default().extended(&cfg.extra_markers))
        .context("Failed to compile document scanner")?;

    let document = read_text(None, Some(file), "document")?;

    match compare {
        Some(revised_path) => {
            let revised = read_text(None, Some(revised_path), "revised document")?;
            print_json(&serde_json::json!({
                "original": scanner.scan(&document),
                "revised": scanner.scan(&revised),
                "comparison": scanner.compare(&document, &revised),
            }))
        }
        None => print_json(&scanner.scan(&document)),
    }
}

async fn show_audit(user: &str, limit: usize) -> Result<()> {
    let store = JsonlAuditStore::open_default().await?;
    let records = store.list_for_user(user, limit).await?;
    print_json(&records)
}

fn show_thresholds() -> Result<()> {
    let t = config::config()?.thresholds;
    print_json(&serde_json::json!({
        "safe": t.safe,
        "risky": t.risky,
        "bands": {
            "safe": format!("similarity >= {}", t.safe),
            "risky": format!("{} <= similarity < {}", t.risky, t.safe),
            "dangerous": format!("similarity < {} or unavailable", t.risky),
        },
    }))
}

fn show_config() -> Result<()> {
    print_json(config::config()?)
}
