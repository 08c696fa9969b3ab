//! Terminal rendering of agent events.
//!
//! Three display channels: reasoning (bright yellow), answer (bold cyan),
//! and actions such as tool calls and compaction (bold italic magenta).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use console::style;
use sous_agent::{AgentStreamEvent, EventSink};

/// Longest tool output echoed to the terminal, in lines.
const MAX_RESULT_LINES: usize = 12;

#[derive(Default)]
pub struct TerminalRenderer {
    /// Whether streamed text has left the cursor mid-line
    mid_line: AtomicBool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn stream(&self, text: String) {
        if !self.mid_line.swap(true, Ordering::Relaxed) {
            print!("{}: ", style("Sous").yellow().bright().bold());
        }
        print!("{text}");
        let _ = std::io::stdout().flush();
    }

    fn line(&self, text: String) {
        if self.mid_line.swap(false, Ordering::Relaxed) {
            println!();
        }
        println!("{text}");
    }
}

impl EventSink for TerminalRenderer {
    fn emit(&self, event: AgentStreamEvent) {
        match event {
            AgentStreamEvent::Reasoning { content } => {
                self.stream(style(content).yellow().bright().to_string())
            }
            AgentStreamEvent::Answer { content } => {
                self.stream(style(content).cyan().bold().to_string())
            }
            AgentStreamEvent::ToolCall { name, arguments, .. } => self.line(action(format!(
                "tool: {name} {arguments}"
            ))),
            AgentStreamEvent::ToolResult { output, error, .. } => {
                let mut text = truncate_lines(&output, MAX_RESULT_LINES);
                if let Some(error) = error {
                    text.push_str(&format!("\nerror: {error}"));
                }
                self.line(style(text).magenta().italic().to_string());
            }
            AgentStreamEvent::Compacting { messages } => {
                self.line(action(format!("SUMMARIZING {messages} messages...")))
            }
            AgentStreamEvent::Compacted { .. } => {
                self.line(action("History replaced by summary".to_string()))
            }
            AgentStreamEvent::Done { .. } => {
                if self.mid_line.swap(false, Ordering::Relaxed) {
                    println!();
                }
            }
            AgentStreamEvent::Notice { message } => {
                self.line(style(message).dim().to_string())
            }
            AgentStreamEvent::Error { message } => {
                self.line(style(message).red().to_string())
            }
        }
    }
}

fn action(text: String) -> String {
    style(text).magenta().bold().italic().to_string()
}

fn truncate_lines(text: &str, max: usize) -> String {
    let total = text.lines().count();
    if total <= max {
        return text.trim_end().to_string();
    }
    let mut kept: Vec<&str> = text.lines().take(max).collect();
    let more = format!("... ({} more lines)", total - max);
    kept.push(&more);
    kept.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_output_is_kept() {
        assert_eq!(truncate_lines("a\nb\n", 5), "a\nb");
    }

    #[test]
    fn long_output_is_cut() {
        let text = (1..=20).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let cut = truncate_lines(&text, 3);
        assert_eq!(cut, "1\n2\n3\n... (17 more lines)");
    }
}
