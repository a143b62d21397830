//! Interactive chat demo wired to the background memory writer.
//!
//! Stands in for the real chat pipeline: it reads user input, produces a
//! reply, and hands the completed turn to the writer without ever
//! waiting on the store. The responder is a trait seam so the demo works
//! offline; a real deployment would put its hosted-LLM call behind it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use turnlog_core::{ConversationMemoryWriter, recent_history};
use turnlog_traits::{ConversationTurn, EventStore, MessageRole, SessionKey};

const STOP_TIMEOUT: Duration = Duration::from_secs(10);
const HISTORY_EVENTS: usize = 10;

/// Produces the assistant side of a turn.
pub trait Responder: Send + Sync {
    fn respond(&self, history: &[(MessageRole, String)], input: &str) -> String;
}

/// Offline responder: acknowledges the input and how much context it had.
pub struct EchoResponder;

impl Responder for EchoResponder {
    fn respond(&self, history: &[(MessageRole, String)], input: &str) -> String {
        if history.is_empty() {
            format!("You said: {input}")
        } else {
            format!(
                "You said: {input} (remembering {} earlier messages)",
                history.len()
            )
        }
    }
}

/// Run the chat REPL until EOF or an exit command.
pub async fn run(
    store: Arc<dyn EventStore>,
    writer: ConversationMemoryWriter,
    responder: Arc<dyn Responder>,
    session: SessionKey,
) -> Result<()> {
    writer.start();

    let history = recent_history(store.as_ref(), &session, HISTORY_EVENTS).await;
    if history.is_empty() {
        println!("No prior history for session {session}.");
    } else {
        println!("Resuming session {session}:");
        print_history(&history);
    }
    println!("Type a message, or 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        let history = recent_history(store.as_ref(), &session, HISTORY_EVENTS).await;
        let reply = responder.respond(&history, input);
        println!("{reply}");

        // The turn is complete only now that the full reply exists.
        writer.enqueue(ConversationTurn::new(session.clone(), input, reply));
    }

    println!("Saving conversation...");
    writer.stop(STOP_TIMEOUT).await;
    Ok(())
}

/// Print recent history for a session.
pub async fn show_history(
    store: Arc<dyn EventStore>,
    session: SessionKey,
    max_results: usize,
) -> Result<()> {
    let history = recent_history(store.as_ref(), &session, max_results).await;
    if history.is_empty() {
        println!("No history for session {session}.");
        return Ok(());
    }
    print_history(&history);
    Ok(())
}

fn print_history(history: &[(MessageRole, String)]) {
    for (role, text) in history {
        let label = match role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        println!("[{label}] {text}");
    }
}
