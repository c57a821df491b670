use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::info;

use crate::services::{Inbound, Reply};
use crate::state::SharedState;

/// Cursors of the last page shown, for `:next` and `:prev`.
#[derive(Default)]
struct Navigation {
    next: Option<String>,
    previous: Option<String>,
}

impl Navigation {
    fn remember(&mut self, reply: &Reply) {
        if let Some(page) = reply.page() {
            self.next = Some(page.next_cursor().encode());
            self.previous = page.previous_cursor().map(|c| c.encode());
        }
    }

    fn inbound(&self, user: &str, line: &str) -> Option<Inbound> {
        match line {
            ":next" => self.next.as_ref().map(|c| Inbound::callback(user, c.as_str())),
            ":prev" => self.previous.as_ref().map(|c| Inbound::callback(user, c.as_str())),
            _ => Some(Inbound::message(user, line)),
        }
    }
}

pub async fn cmd_chat(state: &SharedState, user: &str) -> anyhow::Result<()> {
    info!(user = %user, "Starting console chat");
    println!("Chatting as {user}. Type a query, /help, :next, :prev; Ctrl+D to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut navigation = Navigation::default();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(inbound) = navigation.inbound(user, line) else {
            println!("(no page to move from yet)");
            continue;
        };

        let reply = state.dispatcher.handle(inbound).await;
        println!("{reply}");

        navigation.remember(&reply);
        if let Some(page) = reply.page() {
            let controls = if page.has_previous() {
                "[:prev] [:next]"
            } else {
                "[:next]"
            };
            println!("{controls}");
        }
    }

    println!();
    info!("Console chat ended");
    Ok(())
}
