//! `sous chat` — interactive session on stdin/stdout.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use console::style;
use sous_agent::{AgentLoop, InputSource, Interrupt, InterruptHandle};
use sous_config::AppConfig;
use sous_core::error::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::render::TerminalRenderer;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Input closed or the operator typed an exit command
    InputClosed,
    /// Ctrl+C while nothing was running
    Interrupted,
}

pub async fn run(config: AppConfig) -> Result<SessionEnd, Box<dyn std::error::Error>> {
    let provider = sous_providers::build_from_config(&config);
    let tools = Arc::new(sous_tools::default_registry()?);

    println!();
    println!("  {}", style("Chat with Sous").bold());
    println!("  Provider:  {}", provider.name());
    println!("  Endpoint:  {}", config.base_url);
    println!("  Model:     {}", config.model);
    println!("  Tools:     {}", tools.names().join(", "));
    println!();
    println!("  Ctrl+C cancels a running answer; press it while idle to quit.");
    println!();

    let renderer = Arc::new(TerminalRenderer::new());
    let mut agent = AgentLoop::new(provider, tools, &config, renderer);

    let shutdown = CancellationToken::new();
    let signals = tokio::spawn(watch_interrupts(agent.interrupt_handle(), shutdown.clone()));

    let cancel = CancellationToken::new();
    let mut input = StdinInput::new();

    let outcome = tokio::select! {
        result = agent.run(&cancel, &mut input) => Some(result),
        _ = shutdown.cancelled() => None,
    };
    signals.abort();

    match outcome {
        None => {
            println!();
            println!("  Goodbye!");
            Ok(SessionEnd::Interrupted)
        }
        Some(Ok(())) => {
            println!();
            println!("  Goodbye!");
            Ok(SessionEnd::InputClosed)
        }
        Some(Err(Error::TurnFailed { source, transcript })) => {
            eprintln!("{transcript}");
            Err(format!("Turn failed: {source}").into())
        }
        Some(Err(e)) => Err(e.into()),
    }
}

/// Forward Ctrl+C: cancel the running turn, or shut down when idle.
async fn watch_interrupts(handle: InterruptHandle, shutdown: CancellationToken) {
    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl+C");
            return;
        }
        match handle.interrupt() {
            Interrupt::CancelledTurn => debug!("Ctrl+C cancelled the running turn"),
            Interrupt::Idle => {
                shutdown.cancel();
                return;
            }
        }
    }
}

/// Reads operator lines from stdin, printing the prompt first.
struct StdinInput {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinInput {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

#[async_trait]
impl InputSource for StdinInput {
    async fn next_line(&mut self) -> Option<String> {
        loop {
            print!("{}: ", style("You").blue().bright());
            let _ = std::io::stdout().flush();

            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if is_exit_command(line) {
                        return None;
                    }
                    return Some(line.to_string());
                }
                Ok(None) => return None, // EOF (Ctrl+D)
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    return None;
                }
            }
        }
    }
}

fn is_exit_command(line: &str) -> bool {
    matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q")
}
