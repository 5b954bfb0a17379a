use clap::{Parser, Subcommand};
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

use tasklane_cli::{create_admin, run_server, Config};

#[derive(Parser)]
#[command(name = "tasklane")]
#[command(about = "Tasklane - task distribution for agents and sub-agents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(long, help = "API server port (overrides PORT)")]
        port: Option<u16>,
    },
    /// Create an admin account
    CreateAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tasklane=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    match command {
        Commands::Serve { port } => {
            let config = match port {
                Some(port) => config.with_port(port)?,
                None => config,
            };
            println!("{}", "Starting Tasklane server...".green().bold());
            println!(
                "{} http://{}:{}",
                "Server will run on".cyan(),
                config.host,
                config.port
            );
            println!("{} {}", "CORS origin:".cyan(), config.cors_origin);
            run_server(config).await
        }
        Commands::CreateAdmin {
            name,
            email,
            mobile,
        } => {
            let admin = create_admin(&config, name, email, mobile).await?;
            println!(
                "{} {} <{}>",
                "Admin created:".green().bold(),
                admin.id,
                admin.email
            );
            Ok(())
        }
    }
}
