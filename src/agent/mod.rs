//! The tool dispatch loop: user turn -> model -> local tools -> model -> reply.

mod dispatch;
mod repl;
mod session;

use anyhow::Result;
use std::future::Future;
use std::io::Write;

use crate::cli::Lines;
use crate::config::AppConfig;
use crate::llm::AgentBackend;
use crate::tools::ToolRegistry;

use repl::run_dispatch_loop;
use session::AgentSession;

/// Start a session, drive the loop, and always clean the session up, also
/// when `interrupt` fires.
pub async fn run<B, W, I>(
    backend: &B,
    cfg: &AppConfig,
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
    let session = AgentSession::start(backend, cfg, registry, out).await?;
    let looped = run_dispatch_loop(backend, &session, registry, lines, out, interrupt).await;
    let closed = session.close(backend, out).await;
    looped?;
    closed
}
