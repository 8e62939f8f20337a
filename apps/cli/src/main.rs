use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use uuid::Uuid;

use resume_cli::api_client::ApiClient;
use resume_cli::poller::{poll_until_terminal, PollConfig, PollOutcome};

#[derive(Parser, Debug)]
#[command(name = "resume-cli")]
#[command(about = "Upload resumes and follow their analysis", version)]
struct Args {
    /// Base URL of the resume API
    #[arg(long, env = "RESUME_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// User to act as (sent in the X-User-Id header)
    #[arg(long, env = "RESUME_USER_ID", value_name = "UUID")]
    user_id: Uuid,

    /// Delay before each status poll, in milliseconds
    #[arg(long, env = "RESUME_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Status polls before giving up on a resume that is still processing
    #[arg(long, env = "RESUME_POLL_MAX_ATTEMPTS", default_value_t = 30)]
    max_attempts: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a PDF, DOC or DOCX file and wait for its analysis
    Upload {
        path: PathBuf,
        /// Override the MIME type guessed from the file extension
        #[arg(long)]
        mime_type: Option<String>,
        /// Return right after the upload instead of polling
        #[arg(long)]
        no_wait: bool,
    },
    /// Print the processing status of a resume
    Status { id: Uuid },
    /// Print a resume with its analysis
    Show { id: Uuid },
    /// Print the active resume
    Active,
    /// Run the analysis again and wait for it
    Reprocess {
        id: Uuid,
        #[arg(long)]
        no_wait: bool,
    },
    /// Delete a resume and its stored file
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let client = ApiClient::new(&args.api_url, args.user_id).context("Failed to create API client")?;
    let poll = PollConfig {
        interval: Duration::from_millis(args.poll_interval_ms),
        max_attempts: args.max_attempts,
    };

    match args.command {
        Command::Upload {
            path,
            mime_type,
            no_wait,
        } => {
            let status = client
                .upload(&path, mime_type.as_deref())
                .await
                .with_context(|| format!("Failed to upload {}", path.display()))?;
            info!("Uploaded {} as resume {}", path.display(), status.id);
            if !no_wait {
                follow(&client, status.id, poll).await?;
            }
        }
        Command::Status { id } => {
            let status = client.status(id).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Show { id } => {
            println!("{}", serde_json::to_string_pretty(&client.resume(id).await?)?);
        }
        Command::Active => {
            println!("{}", serde_json::to_string_pretty(&client.active().await?)?);
        }
        Command::Reprocess { id, no_wait } => {
            client.reprocess(id).await?;
            info!("Reprocessing resume {id}");
            if !no_wait {
                follow(&client, id, poll).await?;
            }
        }
        Command::Delete { id } => {
            client.delete(id).await?;
            info!("Deleted resume {id}");
        }
    }

    Ok(())
}

/// Polls until a terminal state, printing the record when it completes.
/// Ctrl-C stops polling; the server keeps processing.
async fn follow(client: &ApiClient, id: Uuid, poll: PollConfig) -> Result<()> {
    let outcome = tokio::select! {
        outcome = poll_until_terminal(client, id, poll) => outcome?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; resume {id} continues processing on the server");
            return Ok(());
        }
    };

    match &outcome {
        PollOutcome::Completed(_) => {
            info!("Resume {id} analysis completed");
            println!("{}", serde_json::to_string_pretty(&client.resume(id).await?)?);
        }
        PollOutcome::Failed(status) => {
            anyhow::bail!(
                "Resume {id} processing failed: {}",
                status.processing_error.as_deref().unwrap_or("unknown error")
            );
        }
        PollOutcome::Exhausted { attempts, .. } => {
            warn!(
                "Resume {id} is still processing after {attempts} polls; check again with `resume-cli status {id}`"
            );
            if let Some(last) = outcome.last_known() {
                println!("{}", serde_json::to_string_pretty(last)?);
            }
        }
    }
    Ok(())
}
