mod config;
mod error;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use runtime::{AnthropicGateway, Orchestrator, SessionLifecycle};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Result;

const SYSTEM_PROMPT: &str = "You are a helpful assistant with access to external tools. \
When a tool would help answer the question, call exactly one. Otherwise, or once you \
have a tool's result, answer the user directly and concisely.";
const CONFIG_FILE: &str = "tether.toml";
const DEFAULT_LOG_FILTER: &str = "warn,runtime=info";

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Connect a language model to the tools of a tool host script", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (optional; defaults apply when missing)
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Model to use instead of the configured one
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session with a tool host script (.py or .js)
    Chat {
        /// Path to the tool host script
        script: PathBuf,
    },
    /// List the tools a tool host script exposes
    Tools {
        /// Path to the tool host script
        script: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(model) = cli.model {
        config.gateway.model = model;
    }

    match cli.command {
        Commands::Chat { script } => cmd_chat(&config, &script).await,
        Commands::Tools { script } => cmd_tools(&config, &script).await,
    }
}

async fn cmd_chat(config: &Config, script: &Path) -> Result<()> {
    println!("tether v{}", env!("CARGO_PKG_VERSION"));

    let gateway = build_gateway(config)?;
    let session = SessionLifecycle::start(script, config.session.options()).await?;

    let names: Vec<&str> = session.tools().iter().map(|t| t.name.as_str()).collect();
    println!("\nConnected to tool host with tools: {names:?}");
    println!("Model: {}", gateway.model());
    println!("Type your queries or 'quit' to exit.");

    let orchestrator = Orchestrator::new(gateway);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut fatal = None;

    loop {
        print!("\nQuery: ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("quit") {
            break;
        }

        match orchestrator.process_query(session.host(), query).await {
            Ok(answer) => println!("\n{answer}"),
            Err(e) if e.ends_session() => {
                fatal = Some(e);
                break;
            }
            Err(e) => eprintln!("\nError: {e}"),
        }
    }

    session.stop();

    if let Some(e) = fatal {
        return Err(e.into());
    }

    println!("\nSession ended.");
    Ok(())
}

async fn cmd_tools(config: &Config, script: &Path) -> Result<()> {
    let session = SessionLifecycle::start(script, config.session.options()).await?;

    if session.tools().is_empty() {
        println!("No tools exposed.");
    }

    for tool in session.tools() {
        println!("{}", tool.name);
        if !tool.description.is_empty() {
            println!("    {}", tool.description);
        }
    }

    session.stop();
    Ok(())
}

fn build_gateway(config: &Config) -> Result<AnthropicGateway> {
    let gateway = &config.gateway;

    let mut builder = AnthropicGateway::builder(config.api_key()?, &gateway.model)
        .max_tokens(gateway.max_tokens)
        .system(gateway.system.as_deref().unwrap_or(SYSTEM_PROMPT));

    if let Some(url) = &gateway.base_url {
        builder = builder.base_url(url);
    }

    Ok(builder.build())
}
