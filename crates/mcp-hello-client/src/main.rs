//! mcp-hello MCP client — entry point.

use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde_json::json;

use mcp_hello_client::{ClientError, ServerProcess, ServerProcessConfig};

#[derive(Parser)]
#[command(
    name = "mcp-hello-client",
    about = "Companion MCP client driving the mcp-hello server for demonstration",
    version
)]
struct Cli {
    /// Server command to spawn.
    #[arg(long, default_value = "mcp-hello-server")]
    server: String,

    /// Extra argument for the server command (repeatable).
    #[arg(long = "server-arg")]
    server_args: Vec<String>,

    /// Per-request timeout in seconds (0 disables it).
    #[arg(long, default_value_t = 30)]
    request_timeout: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted lifecycle demo (default).
    Demo,

    /// Open an interactive session.
    Interactive,

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_env("MCP_HELLO_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Commands::Demo);

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "mcp-hello-client", &mut std::io::stdout());
        return Ok(());
    }

    let config = ServerProcessConfig {
        command: cli.server.clone(),
        args: cli.server_args.clone(),
        ..Default::default()
    };

    let mut server = ServerProcess::spawn(config).await?;
    let timeout = match cli.request_timeout {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    server.driver().set_request_timeout(timeout);

    let outcome = match command {
        Commands::Demo => run_demo(&mut server).await,
        Commands::Interactive => {
            server.driver().open().await?;
            mcp_hello_client::interactive::run(server.driver()).await
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    server.close().await?;
    outcome
}

/// Scripted lifecycle: handshake, tool discovery, one call per tool, and
/// two deliberate failures to show the error paths.
async fn run_demo(server: &mut ServerProcess) -> anyhow::Result<()> {
    let driver = server.driver();

    println!("mcp-hello client demo");
    println!("=====================");

    let init = driver.open().await?;
    println!(
        "Connected: {} v{} (protocol {})",
        init.server_info.name, init.server_info.version, init.protocol_version
    );

    let tools = driver.list_tools().await?;
    println!("\nDiscovered {} tools:", tools.len());
    for tool in &tools {
        println!("  - {}: {}", tool.name, tool.description.as_deref().unwrap_or(""));
    }

    println!("\nCalling each tool:");
    let calls = [
        ("hello", json!({ "name": "Alice" })),
        ("echo", json!({ "message": "Hello, MCP!" })),
        ("get_time", json!({})),
        ("add_numbers", json!({ "a": 5, "b": 3 })),
    ];
    for (name, args) in calls {
        let text = driver.invoke(name, args).await?;
        println!("  {name:<12} => {text}");
    }

    println!("\nError handling:");
    match driver.invoke("add_numbers", json!({ "a": "x", "b": 3 })).await {
        Err(ClientError::Rpc { code, message }) => {
            println!("  add_numbers with a=\"x\" => error {code}: {message}");
        }
        other => println!("  add_numbers with a=\"x\" => unexpected: {other:?}"),
    }
    match driver.invoke("frobnicate", json!({})).await {
        Err(ClientError::Rpc { code, message }) => {
            println!("  frobnicate => error {code}: {message}");
        }
        other => println!("  frobnicate => unexpected: {other:?}"),
    }

    println!("\nClosing session.");
    Ok(())
}
