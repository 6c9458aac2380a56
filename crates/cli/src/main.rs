//! `courier` — interactive chat REPL.
//!
//! A terminal stand-in for the embedded chat widget: reads lines, sends
//! them through the delivery client, and streams the assistant's answer
//! to stdout.  Ancillary state (citations, call-to-action buttons,
//! payment panels, errors) goes to stderr so stdout stays clean.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use courier_client::{AttachmentSendOutcome, ChatClient, SendOutcome, UiState};
use courier_domain::frame::ProtocolFrame;
use courier_domain::page::PageSnapshot;

#[derive(Parser)]
#[command(name = "courier", version, about = "Chat with the assistant backend")]
struct Cli {
    /// Backend origin, e.g. https://app.example.com
    #[arg(long, default_value = "http://localhost:8080")]
    base_url: String,

    /// Language code tagged onto every message.
    #[arg(long, default_value = "en")]
    language: String,

    /// Profile directory holding the durable session identifier.
    /// Defaults to ~/.courier
    #[arg(long)]
    profile_dir: Option<PathBuf>,

    /// Send a single message and exit instead of starting the REPL.
    #[arg(long)]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let profile_dir = match cli.profile_dir {
        Some(dir) => dir,
        None => dirs::home_dir().unwrap_or_default().join(".courier"),
    };

    let client = ChatClient::builder()
        .base_url(cli.base_url)
        .language(cli.language)
        .profile_dir(&profile_dir)
        .build()?;

    match cli.message {
        Some(message) => {
            let snapshot = PageSnapshot::default();
            send_message(&client, &message, &snapshot).await;
            Ok(())
        }
        None => repl(client, profile_dir).await,
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// REPL loop
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn repl(client: ChatClient, profile_dir: PathBuf) -> anyhow::Result<()> {
    let history_path = profile_dir.join("chat_history.txt");
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    // Simulated page the widget sits on; changed with /page.
    let mut snapshot = PageSnapshot::at_path("/");

    eprintln!("Courier interactive chat");
    eprintln!(
        "Session: {}  |  Type /help for commands, Ctrl+D to exit",
        client.session_id()
    );
    eprintln!();

    loop {
        let readline = rl.readline("you> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                rl.add_history_entry(&line).ok();

                // ── Slash commands ────────────────────────────────
                if trimmed.starts_with('/') {
                    if handle_slash_command(&client, trimmed, &mut snapshot).await {
                        break;
                    }
                    continue;
                }

                // ── User message → delivery ──────────────────────
                send_message(&client, trimmed, &snapshot).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process a slash command.  Returns `true` if the REPL should exit.
async fn handle_slash_command(
    client: &ChatClient,
    input: &str,
    snapshot: &mut PageSnapshot,
) -> bool {
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim());

    match cmd {
        "/exit" | "/quit" => return true,

        "/page" => {
            if let Some(path) = arg.filter(|s| !s.is_empty()) {
                *snapshot = PageSnapshot::at_path(path);
                eprintln!("Page set to: {path}");
            } else {
                let current = snapshot.path.as_deref().unwrap_or("(unknown)");
                eprintln!("Current page: {current}");
                eprintln!("Usage: /page <path>  (e.g. /page /pricing)");
            }
        }

        "/attach" => {
            if let Some(path) = arg.filter(|s| !s.is_empty()) {
                send_attachment(client, path).await;
            } else {
                eprintln!("Usage: /attach <file>");
            }
        }

        "/session" => {
            eprintln!("Session: {}", client.session_id());
        }

        "/clear" => {
            // ANSI escape: clear screen and move cursor to top-left.
            eprint!("\x1B[2J\x1B[1;1H");
        }

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /page <path>     Simulate the page the widget sits on");
            eprintln!("  /attach <file>   Upload a file with the next message slot");
            eprintln!("  /session         Show the durable session identifier");
            eprintln!("  /clear           Clear the screen");
            eprintln!("  /exit, /quit     Exit the chat");
            eprintln!("  /help            Show this help");
        }

        other => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
    }

    false
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message sending + frame streaming
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn send_message(client: &ChatClient, text: &str, snapshot: &PageSnapshot) {
    // Deltas stream straight to stdout; the final answer may carry text
    // beyond them (or all of it, on the request/response tier).
    let mut streamed = String::new();

    let result = client
        .send_with(text, snapshot, |frame| match frame {
            ProtocolFrame::Ready => {
                eprintln!("\x1B[2m(assistant is composing…)\x1B[0m");
            }
            ProtocolFrame::Delta { text } => {
                streamed.push_str(text);
                print!("{text}");
                std::io::stdout().flush().ok();
            }
            ProtocolFrame::ToolStart { tool, index, total } => {
                eprint!("\x1B[2m🔧 {tool} ({index}/{total})… \x1B[0m");
                std::io::stderr().flush().ok();
            }
            ProtocolFrame::ToolDone { .. } => {
                eprint!("\x1B[2m✓ \x1B[0m");
                std::io::stderr().flush().ok();
            }
            ProtocolFrame::Answer { reply, .. } => {
                let display = courier_client::directives::scan(reply).display_text;
                let remainder = if streamed.is_empty() {
                    display.as_str()
                } else {
                    display.strip_prefix(streamed.as_str()).unwrap_or("")
                };
                if !remainder.is_empty() {
                    print!("{remainder}");
                    std::io::stdout().flush().ok();
                }
            }
            _ => {}
        })
        .await;

    match result {
        Ok(SendOutcome::Answered { .. }) => {
            println!();
            print_ancillary(&client.ui_state());
            println!();
        }
        Ok(SendOutcome::AssistantError { detail, .. }) => {
            eprintln!("\x1B[31massistant error: {detail}\x1B[0m");
        }
        Ok(SendOutcome::Failed { attempts }) => {
            eprintln!(
                "\x1B[31mdelivery failed after {attempts} attempts — please try again\x1B[0m"
            );
        }
        Err(e) => {
            eprintln!("\x1B[31merror: {e}\x1B[0m");
        }
    }
}

async fn send_attachment(client: &ChatClient, path: &str) {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("\x1B[31mcannot read {path}: {e}\x1B[0m");
            return;
        }
    };
    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    match client.send_attachment(&file_name, bytes, None).await {
        Ok(AttachmentSendOutcome::Completed) => {
            if let Some(entry) = client.entries().last() {
                println!("{}", entry.content);
                println!();
            }
        }
        Ok(AttachmentSendOutcome::Failed { reason }) => {
            eprintln!("\x1B[31mupload failed: {reason}\x1B[0m");
        }
        Err(e) => {
            eprintln!("\x1B[31merror: {e}\x1B[0m");
        }
    }
}

/// Print citations, buttons, and panels after an answer.
fn print_ancillary(ui: &UiState) {
    if !ui.citations.is_empty() {
        eprintln!("\x1B[2msources:\x1B[0m");
        for citation in &ui.citations {
            eprintln!("\x1B[2m  - {}: {}\x1B[0m", citation.source, citation.snippet);
        }
    }

    for button in &ui.cta_buttons {
        eprintln!("\x1B[36m[{}]\x1B[0m", button.label);
    }

    if let Some(intent) = &ui.suggested_intent {
        eprintln!("\x1B[2m(suggested: {intent})\x1B[0m");
    }

    if let Some(payment) = &ui.payment {
        eprintln!("── payment ──────────────────────");
        eprintln!("  id:       {}", payment.payment_id);
        if let (Some(amount), Some(currency)) = (&payment.amount, &payment.currency) {
            eprintln!("  amount:   {amount} {}", currency.to_uppercase());
        }
        if let Some(address) = &payment.address {
            eprintln!("  address:  {address}");
        }
        if let Some(url) = &payment.page_url {
            eprintln!("  page:     {url}");
        }
        eprintln!("─────────────────────────────────");
    }

    if let Some(demo) = &ui.demo {
        eprintln!("\x1B[36m[launch {demo:?} demo]\x1B[0m");
    }
}
