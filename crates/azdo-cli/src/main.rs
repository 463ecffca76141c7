//! azdo CLI - Azure DevOps pull request tools for AI assistants.

use std::io::{self, BufRead};
use std::sync::Arc;

use anyhow::{bail, Context};
use azdo_api::AzureDevOpsConnector;
use azdo_core::config::ENV_PAT;
use azdo_core::{AzureDevOpsConfig, Config};
use azdo_mcp::McpServer;
use azdo_storage::{load_pat, pat_key, CredentialStore, KeychainStore};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "azdo")]
#[command(author, version, about = "Azure DevOps pull request tools over MCP", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdin/stdout
    Serve,

    /// Check that the configured organization and token work
    TestConnection,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Manage the personal access token in the OS keychain
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a value, e.g. `azure_devops.organization_url https://dev.azure.com/contoso`
    Set { key: String, value: String },

    /// Print a single value
    Get { key: String },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Store a token (read from stdin when --token is omitted)
    Set {
        #[arg(long)]
        token: Option<String>,

        /// Organization URL (defaults to the configured one)
        #[arg(long)]
        org: Option<String>,
    },

    /// Remove the stored token
    Delete {
        /// Organization URL (defaults to the configured one)
        #[arg(long)]
        org: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the MCP protocol, so logs go to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Some(Commands::Serve) => serve().await,
        Some(Commands::TestConnection) => test_connection().await,
        Some(Commands::Config { command }) => run_config(command),
        Some(Commands::Token { command }) => run_token(command),
        None => {
            println!("azdo - Azure DevOps pull request tools over MCP");
            println!("Run with --help for usage information");
            Ok(())
        }
    }
}

/// File config overlaid with the environment, with the PAT filled in from
/// the keychain when the environment does not provide one.
fn load_azure_config() -> anyhow::Result<AzureDevOpsConfig> {
    let mut config = Config::load()?;
    config.apply_env()?;

    let Some(mut azure) = config.azure_devops else {
        bail!(
            "Azure DevOps is not configured. Run `azdo config set azure_devops.organization_url <url>`"
        );
    };

    load_pat(&mut azure, &KeychainStore::new())?;
    azure.validate()?;
    Ok(azure)
}

async fn serve() -> anyhow::Result<()> {
    let config = load_azure_config()?;
    tracing::info!(organization = config.organization_url, "Serving Azure DevOps tools");

    let mut server = McpServer::new(Arc::new(AzureDevOpsConnector::new(config)));
    server.run().await?;
    Ok(())
}

async fn test_connection() -> anyhow::Result<()> {
    let config = load_azure_config()?;
    let connector = AzureDevOpsConnector::new(config);

    connector
        .client()
        .await
        .context("Failed to authenticate with Azure DevOps")?;

    println!("Connected to {}", connector.config().organization_url);
    if let Some(project) = &connector.config().default_project {
        println!("Default project: {}", project);
    }
    Ok(())
}

fn run_config(command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            let path = Config::config_path()?;
            let config = Config::load()?;

            println!("# {}", path.display());
            match &config.azure_devops {
                Some(azure) => {
                    println!("organization_url = {}", azure.organization_url);
                    println!("auth_method = pat");
                    if let Some(project) = &azure.default_project {
                        println!("default_project = {}", project);
                    }
                    println!("api_version = {}", azure.api_version);

                    let stored = KeychainStore::new().exists(&pat_key(&azure.organization_url));
                    let from_env = std::env::var(ENV_PAT).is_ok_and(|v| !v.is_empty());
                    let source = match (from_env, stored) {
                        (true, _) => ENV_PAT,
                        (false, true) => "keychain",
                        (false, false) => "not set",
                    };
                    println!("personal_access_token = <{}>", source);
                }
                None => println!("Azure DevOps is not configured"),
            }
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load()?;
            match config.get(&key)? {
                Some(value) => println!("{}", value),
                None => bail!("{} is not set", key),
            }
        }
    }
    Ok(())
}

/// Organization URL given on the command line, else from config/env.
fn resolve_org(org: Option<String>) -> anyhow::Result<String> {
    if let Some(org) = org {
        return Ok(org);
    }

    let mut config = Config::load()?;
    config.apply_env()?;
    config
        .azure_devops
        .map(|a| a.organization_url)
        .filter(|url| !url.is_empty())
        .context("No organization URL configured; pass --org")
}

fn run_token(command: TokenCommands) -> anyhow::Result<()> {
    let store = KeychainStore::new();

    match command {
        TokenCommands::Set { token, org } => {
            let org = resolve_org(org)?;
            let token = match token {
                Some(token) => token,
                None => {
                    eprintln!("Paste the personal access token for {} and press Enter:", org);
                    let mut line = String::new();
                    io::stdin().lock().read_line(&mut line)?;
                    line.trim().to_string()
                }
            };
            if token.is_empty() {
                bail!("Token must not be empty");
            }

            store.store(&pat_key(&org), &token)?;
            println!("Token stored for {}", org);
        }
        TokenCommands::Delete { org } => {
            let org = resolve_org(org)?;
            store.delete(&pat_key(&org))?;
            println!("Token removed for {}", org);
        }
    }
    Ok(())
}
