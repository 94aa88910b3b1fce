//! dobby-forge: 本地命令行入口：读取查询，按人设流式输出到终端
//!
//! Usage:
//!   dobby-forge [--profile NAME] [--profiles-file PATH] [QUERY...]
//!   dobby-forge profiles [--profiles-file PATH]
//!
//! Without QUERY the query is read from stdin. Generated text goes to stdout;
//! status blocks and logs go to stderr.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dobby_forge::{AppConfig, ConsoleChannel, ProfileSet, RelayState, ResponseRelay, SessionContext};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dobby-forge", version, about = "Persona-directed streaming completions")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Persona profile to run.
    #[arg(short, long, default_value = "forge")]
    profile: String,

    /// Extra profiles (YAML); same-named profiles replace the built-ins.
    #[arg(long, global = true, value_name = "PATH")]
    profiles_file: Option<PathBuf>,

    /// The query. Read from stdin when omitted.
    query: Vec<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available persona profiles.
    Profiles,
}

fn load_profiles(extra: Option<&PathBuf>) -> anyhow::Result<ProfileSet> {
    let mut set = ProfileSet::builtin().context("built-in profiles are malformed")?;
    if let Some(path) = extra {
        let loaded = ProfileSet::from_path(path)
            .with_context(|| format!("failed to load profiles from {}", path.display()))?;
        set.merge(loaded);
    }
    Ok(set)
}

async fn read_query(words: Vec<String>) -> anyhow::Result<String> {
    if !words.is_empty() {
        return Ok(words.join(" "));
    }
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .context("failed to read query from stdin")?;
    Ok(buf)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profiles = load_profiles(cli.profiles_file.as_ref())?;

    if let Some(Command::Profiles) = cli.command {
        for profile in &profiles.profiles {
            println!("{:<12} {}", profile.name, profile.description);
        }
        return Ok(());
    }

    let Some(profile) = profiles.get(&cli.profile).cloned() else {
        let known: Vec<&str> = profiles.names().collect();
        bail!("unknown profile `{}` (known: {})", cli.profile, known.join(", "));
    };

    let config = AppConfig::from_env()?;
    let client = config.build_client()?;
    tracing::info!(
        model = %client.model(),
        base_url = %client.base_url(),
        profile = %profile.name,
        "client ready"
    );

    let query = read_query(cli.query).await?;
    let relay = ResponseRelay::new(Arc::new(client), profile);
    let session = SessionContext::new(uuid::Uuid::new_v4().to_string(), "cli");

    let outcome = relay.assist(&session, &query, &ConsoleChannel::new()).await?;
    if outcome.state == RelayState::Failed {
        tracing::warn!(request_id = %outcome.request_id, "response incomplete");
    }
    Ok(())
}
