//! EVM Agent Kit CLI
//!
//! Lists the built-in actions, runs one from the command line, or serves
//! them to an MCP client over stdio.

use clap::{Parser, Subcommand, ValueEnum};
use evm_agent_kit::config::PRIVATE_KEY_ENV;
use evm_agent_kit::interceptors::{AuditLogInterceptor, PolicyConfig, PolicyInterceptor};
use evm_agent_kit::mcp::McpServer;
use evm_agent_kit::wallet::{EvmWallet, RpcWallet, SecureWallet};
use evm_agent_kit::{
    builtin_registry, ActionExecutor, Config, Error, EvmAgentKit, Result, RpcConfig,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "evm-agent")]
#[command(about = "Schema-validated EVM/BSC actions for tool-calling agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered actions
    List {
        #[arg(short, long, value_enum, default_value_t = ListFormat::Plain)]
        format: ListFormat,
    },

    /// Execute one action and print its result envelope
    Exec {
        /// Action name, e.g. GET_BALANCE
        action: String,

        /// Arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,
    },

    /// Serve the actions as MCP tools over stdio
    Mcp,

    /// Show current configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListFormat {
    Plain,
    Openai,
    Mcp,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .with_env();

    match cli.command {
        Commands::List { format } => list_actions(format)?,
        Commands::Exec { action, args } => {
            let succeeded = exec_action(config, &action, args.as_deref()).await?;
            if !succeeded {
                std::process::exit(1);
            }
        }
        Commands::Mcp => serve_mcp(config).await?,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries results and the MCP channel.
fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn list_actions(format: ListFormat) -> Result<()> {
    let registry = builtin_registry()?;

    match format {
        ListFormat::Plain => {
            for action in registry.list() {
                let fields: Vec<String> = action
                    .schema()
                    .fields()
                    .iter()
                    .map(|f| {
                        if f.required {
                            f.name.to_string()
                        } else {
                            format!("{}?", f.name)
                        }
                    })
                    .collect();
                println!("{}({})", action.name(), fields.join(", "));
                println!("    {}", action.description());
            }
        }
        ListFormat::Openai => {
            let tools: Vec<Value> = registry
                .tool_definitions()
                .iter()
                .map(|def| def.to_openai_function())
                .collect();
            println!("{}", serde_json::to_string_pretty(&tools)?);
        }
        ListFormat::Mcp => {
            let tools: Vec<Value> = registry
                .tool_definitions()
                .iter()
                .map(|def| def.to_mcp_tool())
                .collect();
            println!("{}", serde_json::to_string_pretty(&tools)?);
        }
    }

    Ok(())
}

async fn exec_action(config: Config, action: &str, args: Option<&str>) -> Result<bool> {
    let raw: Value = match args {
        Some(args) => serde_json::from_str(args)
            .map_err(|e| Error::InvalidArgument(format!("--args is not valid JSON: {}", e)))?,
        None => Value::Null,
    };

    let executor = build_executor(&config).await?;
    let kit = build_kit(config).await?;

    let envelope = executor.execute(&kit, action, raw).await;
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(envelope.is_success())
}

async fn serve_mcp(config: Config) -> Result<()> {
    let executor = build_executor(&config).await?;
    let kit = build_kit(config).await?;
    McpServer::new(executor, kit).serve_stdio().await
}

/// Registry of built-in actions behind the configured interceptors.
async fn build_executor(config: &Config) -> Result<ActionExecutor<EvmAgentKit>> {
    let mut executor = ActionExecutor::new(Arc::new(builtin_registry()?));

    match &config.policy.path {
        Some(path) => {
            let path = Path::new(path);
            if config.policy.require_file && !path.exists() {
                return Err(Error::Config(format!(
                    "Policy file {} not found",
                    path.display()
                )));
            }
            let policy = PolicyConfig::load(path).await?;
            executor = executor.with_interceptor(Arc::new(PolicyInterceptor::new(policy)));
        }
        None if config.policy.require_file => {
            return Err(Error::Config(
                "policy.require_file is set but policy.path is not".to_string(),
            ));
        }
        None => {}
    }

    if let Some(path) = &config.audit_log_path {
        tracing::info!(path = %path, "Writing audit log");
        executor = executor.with_interceptor(Arc::new(AuditLogInterceptor::new(path)));
    }

    Ok(executor)
}

async fn build_kit(config: Config) -> Result<EvmAgentKit> {
    let signer = Arc::new(SecureWallet::from_env(PRIVATE_KEY_ENV)?);

    let rpc = RpcConfig::from_env();
    let url = rpc.resolve(config.chain_id).ok_or_else(|| {
        Error::Config(format!("No RPC URL configured for chain {}", config.chain_id))
    })?;
    let wallet = RpcWallet::connect(signer, url).await?;

    if wallet.chain_id() != config.chain_id {
        tracing::warn!(
            configured = config.chain_id,
            connected = wallet.chain_id(),
            "RPC endpoint reports a different chain than configured"
        );
    }

    Ok(EvmAgentKit::new(Arc::new(wallet), config))
}
