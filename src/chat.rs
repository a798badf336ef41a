//! Plain chat-completions REPL with a client-side history.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::error;

use crate::cli::{UserInput, classify_input, read_prompt};
use crate::llm::ProjectClient;
use crate::llm::types::ChatMessage;

pub const CHAT_PROMPT: &str = "Enter the prompt (or type 'quit' to exit): ";
pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant that answers questions.";

pub async fn run_chat_loop<R: BufRead, W: Write>(
    client: &ProjectClient,
    model: &str,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    let mut history = vec![ChatMessage::system(SYSTEM_PROMPT)];

    while let Some(line) = read_prompt(&mut input, out, CHAT_PROMPT)? {
        let text = match classify_input(&line) {
            UserInput::Quit => break,
            UserInput::Empty => {
                writeln!(out, "Please enter a prompt.")?;
                continue;
            }
            UserInput::Prompt(text) => text,
        };

        history.push(ChatMessage::user(text));
        match client.chat_once(model, &history).await {
            Ok(reply) => {
                writeln!(out, "{reply}")?;
                history.push(ChatMessage::assistant(reply));
            }
            Err(e) => {
                error!(error=%e, kind=?e.kind(), "chat completion failed");
                writeln!(out, "Request failed: {e}")?;
                // an unanswered turn stays out of the history
                history.pop();
            }
        }
    }
    Ok(())
}

pub async fn print_connections<W: Write>(client: &ProjectClient, out: &mut W) -> Result<()> {
    let connections = client.list_connections().await?;
    writeln!(out, "List all connections:")?;
    for connection in connections {
        writeln!(out, "{} ({})", connection.name, connection.kind)?;
    }
    Ok(())
}
