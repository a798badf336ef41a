use std::io::{self, BufRead, Write};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

/// What a line typed at the prompt means for the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Quit,
    Empty,
    Prompt(String),
}

pub fn classify_input(line: &str) -> UserInput {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("quit") {
        UserInput::Quit
    } else if trimmed.is_empty() {
        UserInput::Empty
    } else {
        UserInput::Prompt(line.to_string())
    }
}

pub fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "{CLEAR_SCREEN}")?;
    out.flush()
}

/// Print `prompt` and read one line; `None` at end of input.
pub fn read_prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    prompt: &str,
) -> io::Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Console lines read off the async runtime; the channel closes at end of input.
pub type Lines = mpsc::Receiver<io::Result<String>>;

/// Read `input` line by line on a detached thread. The thread may stay blocked
/// on the terminal after the loop is done; it does not hold the process open.
pub fn spawn_line_reader<R: BufRead + Send + 'static>(mut input: R) -> Lines {
    let (tx, rx) = mpsc::channel(1);
    thread::spawn(move || {
        loop {
            let mut line = String::new();
            let item = match input.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => Ok(line),
                Err(e) => Err(e),
            };
            let failed = item.is_err();
            if tx.blocking_send(item).is_err() || failed {
                break;
            }
        }
        debug!("line reader finished");
    });
    rx
}

/// Resolves on Ctrl-C. Never resolves if the signal handler cannot be installed.
pub async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error=%e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
