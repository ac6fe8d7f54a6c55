//! Handler registration and lookup.
//!
//! Two tables route incoming traffic: message handlers keyed by trigger
//! word (the first word of a PRIVMSG body) and command handlers keyed by
//! protocol verb. Keys are exact-match and case-sensitive; registering a
//! second handler for a key replaces the first (last-write-wins).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;

use crate::client::Client;
use crate::message::Message;

/// Error type handlers may return; failures are logged and isolated,
/// never propagated to the reader task.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send>>;

/// A registered message or command handler.
#[derive(Clone)]
pub(crate) struct Handler {
    func: Arc<dyn Fn(Client, Message) -> HandlerFuture + Send + Sync>,
}

impl Handler {
    pub(crate) fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Client, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Handler {
            func: Arc::new(move |client, msg| Box::pin(f(client, msg))),
        }
    }

    pub(crate) fn call(&self, client: Client, msg: Message) -> HandlerFuture {
        (self.func)(client, msg)
    }
}

/// The post-connect hook, run after registration completes.
#[derive(Clone)]
pub(crate) struct Hook {
    func: Arc<dyn Fn(Client) -> HandlerFuture + Send + Sync>,
}

impl Hook {
    pub(crate) fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Client) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Hook {
            func: Arc::new(move |client| Box::pin(f(client))),
        }
    }

    pub(crate) fn call(&self, client: Client) -> HandlerFuture {
        (self.func)(client)
    }
}

/// The two dispatch tables.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    triggers: DashMap<String, Handler>,
    commands: DashMap<String, Handler>,
}

impl HandlerRegistry {
    pub(crate) fn set_trigger(&self, trigger: &str, handler: Handler) {
        self.triggers.insert(trigger.to_owned(), handler);
    }

    pub(crate) fn set_command(&self, verb: &str, handler: Handler) {
        self.commands.insert(verb.to_owned(), handler);
    }

    pub(crate) fn trigger(&self, trigger: &str) -> Option<Handler> {
        self.triggers.get(trigger).map(|h| h.clone())
    }

    pub(crate) fn command(&self, verb: &str) -> Option<Handler> {
        self.commands.get(verb).map(|h| h.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Config;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn probe_handler(slot: Arc<AtomicUsize>, value: usize) -> Handler {
        Handler::new(move |_client, _msg| {
            let slot = slot.clone();
            async move {
                slot.store(value, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let registry = HandlerRegistry::default();
        let slot = Arc::new(AtomicUsize::new(0));

        registry.set_trigger("!ping", probe_handler(slot.clone(), 1));
        registry.set_trigger("!ping", probe_handler(slot.clone(), 2));

        let handler = registry.trigger("!ping").expect("handler registered");
        let client = Client::new(Config::default());
        handler
            .call(client, "PRIVMSG #c :!ping".parse().unwrap())
            .await
            .unwrap();

        assert_eq!(slot.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = HandlerRegistry::default();
        let slot = Arc::new(AtomicUsize::new(0));
        registry.set_command("KICK", probe_handler(slot, 1));

        assert!(registry.command("KICK").is_some());
        assert!(registry.command("kick").is_none());
    }

    #[test]
    fn test_tables_are_independent() {
        let registry = HandlerRegistry::default();
        let slot = Arc::new(AtomicUsize::new(0));
        registry.set_trigger("!x", probe_handler(slot, 1));

        assert!(registry.trigger("!x").is_some());
        assert!(registry.command("!x").is_none());
    }
}
