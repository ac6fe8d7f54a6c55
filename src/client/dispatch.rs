//! Routing of parsed messages to built-in handling and user handlers.
//!
//! Dispatch rules, all independently attempted per message:
//! built-in PING/topic handling runs inline in the reader task; user
//! command and trigger handlers each run as their own spawned task, so a
//! slow or failing handler cannot stall or kill the connection loop. No
//! ordering is guaranteed between handler tasks, and spawning is
//! unbounded, one task per matched handler per line.

use tracing::{debug, warn};

use crate::client::handlers::Handler;
use crate::client::Client;
use crate::command::{Command, RPL_TOPIC};
use crate::message::Message;

/// The dispatch key for message handlers: the first word of the body.
pub(crate) fn extract_trigger(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

pub(crate) async fn dispatch(client: &Client, message: Message) {
    if client.config().debug {
        debug!(target: "slirc_client::dispatch", "inbound: {}", message);
    }

    // Built-in: answer PING inline, ahead of any handler spawn.
    if let Command::PING(token, token2) = &message.command {
        let reply = Command::PONG(token.clone(), token2.clone()).to_string();
        if let Err(err) = client.send_override(&reply).await {
            warn!(error = %err, "failed to answer PING");
        }
    }

    // Built-in: topic pushes and RPL_TOPIC replies refresh the cache and
    // wake blocked topic() callers.
    match &message.command {
        Command::TOPIC(channel, Some(text)) if message.prefix.is_some() => {
            client.topics().update(channel, text.clone());
        }
        Command::Response(code, args) if *code == RPL_TOPIC && args.len() >= 3 => {
            client.topics().update(&args[1], args[args.len() - 1].clone());
        }
        _ => {}
    }

    // User command handler for this verb, if any.
    let verb = message.command.name().into_owned();
    if let Some(handler) = client.handlers().command(&verb) {
        spawn_handler("command", verb, handler, client.clone(), message.clone());
    }

    // User trigger handler for PRIVMSG bodies, if any. No match is a
    // silent no-op.
    if let Command::PRIVMSG(_, text) = &message.command {
        if let Some(trigger) = extract_trigger(text) {
            if let Some(handler) = client.handlers().trigger(trigger) {
                spawn_handler(
                    "trigger",
                    trigger.to_owned(),
                    handler,
                    client.clone(),
                    message.clone(),
                );
            }
        }
    }
}

/// Run one handler as an independent task. Errors are logged; panics are
/// contained by the task boundary. Nothing is awaited or propagated.
fn spawn_handler(kind: &'static str, key: String, handler: Handler, client: Client, msg: Message) {
    tokio::spawn(async move {
        if let Err(err) = handler.call(client, msg).await {
            warn!(kind, key = %key, error = %err, "handler failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_trigger_first_word() {
        assert_eq!(extract_trigger("!ping hello there"), Some("!ping"));
        assert_eq!(extract_trigger("!ping"), Some("!ping"));
        assert_eq!(extract_trigger("   !ping  x"), Some("!ping"));
        assert_eq!(extract_trigger(""), None);
        assert_eq!(extract_trigger("   "), None);
    }
}
