//! Interactive mode for the mcp-hello client.
//!
//! Drives an open session from a prompt: list tools, inspect their
//! schemas, and call them with parameter-by-parameter input. Type `/help`
//! for available commands, Tab for completion.

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};
use serde_json::{Map, Value};

use mcp_hello_protocol::ToolDefinition;

use crate::driver::SessionDriver;
use crate::error::ClientError;

/// Available commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/tools", "List available tools"),
    ("/info", "Show a tool's parameters"),
    ("/call", "Call a tool"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit"),
];

/// Prompt helper for tab completion over commands and tool names.
struct SessionHelper {
    tool_names: Vec<String>,
}

impl Completer for SessionHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<10} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        // Tool name completion for /call and /info.
        let parts: Vec<&str> = input.splitn(2, ' ').collect();
        let cmd = parts[0];
        let args = if parts.len() > 1 { parts[1] } else { "" };

        if cmd == "/call" || cmd == "/info" {
            let prefix_start = input.len() - args.len();
            let matches: Vec<Pair> = self
                .tool_names
                .iter()
                .filter(|name| name.starts_with(args.trim()))
                .map(|name| Pair {
                    display: name.clone(),
                    replacement: name.clone(),
                })
                .collect();
            return Ok((prefix_start, matches));
        }

        Ok((pos, Vec::new()))
    }
}

impl Hinter for SessionHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() {
            return None;
        }
        if line.starts_with('/') && !line.contains(' ') {
            for (cmd, _) in COMMANDS {
                if cmd.starts_with(line) && *cmd != line {
                    return Some(cmd[line.len()..].to_string());
                }
            }
        }
        None
    }
}

impl Highlighter for SessionHelper {}
impl Validator for SessionHelper {}
impl Helper for SessionHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// Run the interactive loop against an already-open session.
pub async fn run(driver: &mut SessionDriver) -> anyhow::Result<()> {
    let tools = driver.list_tools().await?;

    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mmcp-hello-client v{}\x1b[0m \x1b[90m\u{2014} {} tools available\x1b[0m",
        env!("CARGO_PKG_VERSION"),
        tools.len()
    );
    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<SessionHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(SessionHelper {
        tool_names: tools.iter().map(|t| t.name.clone()).collect(),
    }));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".mcp_hello_client_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let prompt = " \x1b[36mmcp>\x1b[0m ";

    loop {
        let line = tokio::task::block_in_place(|| rl.readline(prompt));
        match line {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let mut parts = input.splitn(2, ' ');
                let cmd = parts.next().unwrap_or("");
                let args = parts.next().unwrap_or("").trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "tools" | "list" => cmd_tools(&tools),
                    "info" => cmd_info(args, &tools),
                    "call" => cmd_call(args, &tools, &mut rl, driver).await,
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<12} {desc}");
    }
    eprintln!();
}

fn cmd_tools(tools: &[ToolDefinition]) {
    eprintln!();
    eprintln!("  {} tools available:", tools.len());
    eprintln!();
    for tool in tools {
        eprintln!(
            "    {:<16} {}",
            tool.name,
            tool.description.as_deref().unwrap_or("")
        );
    }
    eprintln!();
}

fn cmd_info(args: &str, tools: &[ToolDefinition]) {
    let Some(tool) = find_tool(args, tools) else {
        return;
    };

    eprintln!();
    eprintln!("  Tool: {}", tool.name);
    eprintln!(
        "  Description: {}",
        tool.description.as_deref().unwrap_or("(none)")
    );

    let params = schema_params(tool);
    if params.is_empty() {
        eprintln!("  Parameters: none");
    } else {
        eprintln!("  Parameters:");
        for param in params {
            let required = if param.required { "required" } else { "optional" };
            eprintln!(
                "    {} ({}, {}): {}",
                param.name, param.kind, required, param.description
            );
        }
    }
    eprintln!();
}

async fn cmd_call(
    args: &str,
    tools: &[ToolDefinition],
    rl: &mut Editor<SessionHelper, rustyline::history::DefaultHistory>,
    driver: &mut SessionDriver,
) {
    let Some(tool) = find_tool(args, tools) else {
        return;
    };

    let mut arguments = Map::new();
    for param in schema_params(tool) {
        let mut prompt = format!("  {} ", param.name);
        if !param.description.is_empty() {
            prompt.push_str(&format!("({}) ", param.description));
        }
        if !param.required {
            prompt.push_str("[optional] ");
        }
        prompt.push_str("> ");

        let value = match tokio::task::block_in_place(|| rl.readline(&prompt)) {
            Ok(value) => value.trim().to_string(),
            Err(_) => return,
        };

        if value.is_empty() {
            if param.required {
                eprintln!("  Required parameter '{}' not provided", param.name);
                return;
            }
            continue;
        }

        // Coerce number parameters locally; reject non-numeric input
        // before it reaches the wire.
        if param.kind == "number" {
            match value.parse::<f64>() {
                Ok(n) => {
                    arguments.insert(param.name, Value::from(n));
                }
                Err(_) => {
                    eprintln!("  Invalid number: {value}");
                    return;
                }
            }
        } else {
            arguments.insert(param.name, Value::String(value));
        }
    }

    match driver.invoke(&tool.name, Value::Object(arguments)).await {
        Ok(text) => eprintln!("  \x1b[32m=>\x1b[0m {text}"),
        Err(ClientError::Rpc { code, message }) => {
            eprintln!("  \x1b[31mServer error {code}:\x1b[0m {message}");
        }
        Err(e) => eprintln!("  \x1b[31mError:\x1b[0m {e}"),
    }
}

fn find_tool<'a>(name: &str, tools: &'a [ToolDefinition]) -> Option<&'a ToolDefinition> {
    if name.is_empty() {
        eprintln!("  Usage: /call <tool> (or /info <tool>)");
        return None;
    }
    let found = tools.iter().find(|t| t.name == name);
    if found.is_none() {
        eprintln!("  Tool '{name}' not found. Try /tools.");
    }
    found
}

struct SchemaParam {
    name: String,
    kind: String,
    description: String,
    required: bool,
}

/// Flatten a tool's JSON Schema into prompt-friendly parameter entries.
fn schema_params(tool: &ToolDefinition) -> Vec<SchemaParam> {
    let schema = &tool.input_schema;
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, info)| SchemaParam {
                    name: name.clone(),
                    kind: info
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or("string")
                        .to_string(),
                    description: info
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    required: required.contains(&name.as_str()),
                })
                .collect()
        })
        .unwrap_or_default()
}
