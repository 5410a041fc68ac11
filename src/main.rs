//! idea-gateway - HTTP API for per-user desktop containers.
//!
//! Usage:
//!   idea-gateway [serve] [--port 8080]          # Start HTTP server
//!   idea-gateway list                           # List running user containers
//!   idea-gateway create <id> [--password P]     # Start a user container
//!   idea-gateway delete <id>                    # Stop and remove a user container

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use idea_gateway::config::{RuntimeArgs, ServerArgs, UserLayout};
use idea_gateway::http_server::{self, MIN_PASSWORD_LEN};
use idea_gateway::runtime::{DockerUsers, ProcessRunner, UserRuntime};
use idea_gateway::state::AppState;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "idea-gateway")]
#[command(about = "HTTP API for per-user desktop containers")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    server: ServerArgs,

    #[command(flatten)]
    runtime: RuntimeArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Print the ids of running user containers
    List,
    /// Start a container for a new user
    Create {
        id: String,
        /// Desktop password; defaults to --default-password
        #[arg(long)]
        password: Option<String>,
    },
    /// Stop and remove a user's container
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let layout = UserLayout::from(&args.runtime);
    let users = DockerUsers::new(ProcessRunner::new(args.runtime.runtime.clone()), layout);

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let ip: IpAddr = args
                .server
                .host
                .parse()
                .with_context(|| format!("invalid host address: {}", args.server.host))?;
            let addr = SocketAddr::new(ip, args.server.port);

            warn!(
                min_len = MIN_PASSWORD_LEN,
                "delete requests are checked by password length only"
            );
            info!(runtime = %args.runtime.runtime, image = %args.runtime.image, "using container runtime");

            let state = AppState::new(Arc::new(users), args.server.default_password);
            http_server::run_server(addr, state)
                .await
                .context("HTTP server failed")?;
        }
        Commands::List => {
            for id in users.list_users().await {
                println!("{}", id);
            }
        }
        Commands::Create { id, password } => {
            if id.is_empty() {
                bail!("Missing user id");
            }
            let password = password.unwrap_or(args.server.default_password);
            users.create_user(&id, &password).await?;
            println!("User {} created", id);
        }
        Commands::Delete { id } => {
            users.delete_user(&id).await?;
            println!("User {} deleted", id);
        }
    }

    Ok(())
}
