use anyhow::Result;
use std::future::Future;
use std::io::Write;
use tracing::{debug, error, info};

use super::AgentSession;
use super::dispatch::{TurnOutcome, render_final_text, run_turn};
use crate::cli::{Lines, UserInput, classify_input};
use crate::llm::AgentBackend;
use crate::tools::ToolRegistry;

pub const PROMPT: &str = "Enter a prompt (or type 'quit' to exit): ";

/// Read prompts until `quit`, end of input, or `interrupt`, one turn per line.
///
/// An interrupt at the prompt or during a turn ends the loop like `quit`; a
/// turn cut short is dropped without output.
pub async fn run_dispatch_loop<B, W, I>(
    backend: &B,
    session: &AgentSession,
    registry: &ToolRegistry,
    lines: &mut Lines,
    out: &mut W,
    interrupt: I,
) -> Result<()>
where
    B: AgentBackend + ?Sized,
    W: Write,
    I: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;
        let next = tokio::select! {
            biased;
            line = lines.recv() => Some(line.transpose()?),
            _ = &mut interrupt => None,
        };
        let line = match next {
            Some(Some(line)) => line,
            Some(None) => {
                debug!("end of input");
                writeln!(out)?;
                break;
            }
            None => {
                info!("interrupted at prompt");
                writeln!(out)?;
                break;
            }
        };
        let text = match classify_input(&line) {
            UserInput::Quit => break,
            UserInput::Empty => {
                writeln!(out, "Please enter a prompt.")?;
                continue;
            }
            UserInput::Prompt(text) => text,
        };

        let turn = tokio::select! {
            biased;
            result = run_turn(backend, session, registry, &text) => Some(result),
            _ = &mut interrupt => None,
        };
        let Some(result) = turn else {
            info!("interrupted during turn");
            writeln!(out)?;
            break;
        };
        match result {
            Ok(outcome) => {
                debug!(
                    tool_results = outcome.tool_results,
                    followup = outcome.followup_sent,
                    "turn complete"
                );
                render_outcome(out, &outcome)?
            }
            Err(e) => {
                error!(error=%e, kind=?e.kind(), "turn failed");
                writeln!(out, "Request failed: {e}")?;
            }
        }
    }
    Ok(())
}

fn render_outcome<W: Write>(out: &mut W, outcome: &TurnOutcome) -> std::io::Result<()> {
    for failure in &outcome.failures {
        writeln!(out, "Response failed: {failure}")?;
    }
    render_final_text(out, &outcome.final_response)
}
