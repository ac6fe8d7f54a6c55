//! The IRC client: connection lifecycle, outbound operations, and the
//! listen loop.
//!
//! A [`Client`] is a cheap handle (`Arc` inner) that can be cloned into
//! handlers and tasks freely. One transport is owned at a time and is
//! replaced wholesale on reconnect.

mod dispatch;
pub(crate) mod handlers;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::error::{ClientError, ProtocolError};
use crate::line::MAX_LINE_LEN;
use crate::transport::{self, TransportReader, TransportWriter};

pub use handlers::HandlerError;
pub use state::ConnectionState;

use handlers::{Handler, HandlerRegistry, Hook};
use state::{ChannelSet, TopicCache};

/// Connection parameters.
///
/// This library does not read configuration files; embedders deserialize
/// this from their own config layer (the `serde` feature derives
/// `Serialize`/`Deserialize`).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Nickname to register with.
    pub nickname: String,
    /// Server hostname or address.
    pub server: String,
    /// Server port.
    pub port: u16,
    /// Connect over TLS.
    pub use_tls: bool,
    /// Skip TLS certificate validation (encrypted but unauthenticated;
    /// for servers with self-signed certificates).
    pub accept_invalid_certs: bool,
    /// Server password, sent as PASS before registration.
    pub password: Option<String>,
    /// Username for USER registration; defaults to the nickname.
    pub username: Option<String>,
    /// Realname for USER registration; defaults to the nickname.
    pub realname: Option<String>,
    /// Log every inbound line at debug level.
    pub debug: bool,
    /// Delay between reconnect attempts.
    pub reconnect_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            nickname: "slirc".to_owned(),
            server: "localhost".to_owned(),
            port: 6667,
            use_tls: false,
            accept_invalid_certs: false,
            password: None,
            username: None,
            realname: None,
            debug: false,
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

struct ClientInner {
    config: Config,
    state: Mutex<ConnectionState>,
    running: AtomicBool,
    failed: AtomicBool,
    channels: ChannelSet,
    topics: TopicCache,
    handlers: HandlerRegistry,
    registered_hook: Mutex<Option<Hook>>,
    writer: tokio::sync::Mutex<Option<TransportWriter>>,
    pending_reader: Mutex<Option<TransportReader>>,
    shutdown: Notify,
}

/// Handle to an IRC connection.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Create a client for the given connection parameters.
    pub fn new(config: Config) -> Self {
        Client {
            inner: Arc::new(ClientInner {
                config,
                state: Mutex::new(ConnectionState::Disconnected),
                running: AtomicBool::new(false),
                failed: AtomicBool::new(false),
                channels: ChannelSet::default(),
                topics: TopicCache::default(),
                handlers: HandlerRegistry::default(),
                registered_hook: Mutex::new(None),
                writer: tokio::sync::Mutex::new(None),
                pending_reader: Mutex::new(None),
                shutdown: Notify::new(),
            }),
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    /// Whether the connection is currently believed down.
    pub fn is_failed(&self) -> bool {
        self.inner.failed.load(Ordering::SeqCst)
    }

    /// The channels this client intends to be joined to, in join order.
    pub fn channels(&self) -> Vec<String> {
        self.inner.channels.snapshot()
    }

    /// The cached topic for a channel, if a reply has arrived.
    pub fn cached_topic(&self, channel: &str) -> Option<String> {
        self.inner.topics.get(channel)
    }

    pub(crate) fn config(&self) -> &Config {
        &self.inner.config
    }

    pub(crate) fn topics(&self) -> &TopicCache {
        &self.inner.topics
    }

    pub(crate) fn handlers(&self) -> &HandlerRegistry {
        &self.inner.handlers
    }

    /// Register a message handler for a trigger word (the first word of a
    /// PRIVMSG body). Replaces any prior handler for the same trigger.
    pub fn on_trigger<F, Fut>(&self, trigger: &str, f: F)
    where
        F: Fn(Client, crate::message::Message) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.inner.handlers.set_trigger(trigger, Handler::new(f));
    }

    /// Register a command handler for a protocol verb (e.g. `"KICK"`,
    /// `"332"`). Replaces any prior handler for the same verb.
    pub fn on_command<F, Fut>(&self, verb: &str, f: F)
    where
        F: Fn(Client, crate::message::Message) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.inner.handlers.set_command(verb, Handler::new(f));
    }

    /// Register a hook that runs after each successful registration,
    /// including reconnects. Its failure is logged and swallowed; it never
    /// aborts the connection.
    pub fn on_registered<F, Fut>(&self, f: F)
    where
        F: Fn(Client) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        *self.inner.registered_hook.lock() = Some(Hook::new(f));
    }

    /// Open the transport and register with the server.
    ///
    /// Sends PASS (if configured), NICK, USER in that order, runs the
    /// post-connect hook, clears the failure flag, and leaves the client
    /// `Active`. Does not start reading; call [`Client::listen`].
    pub async fn connect(&self) -> Result<(), ClientError> {
        let config = &self.inner.config;
        *self.inner.state.lock() = ConnectionState::Connecting;

        let (reader, writer) = transport::connect(
            &config.server,
            config.port,
            config.use_tls,
            config.accept_invalid_certs,
        )
        .await?;

        *self.inner.writer.lock().await = Some(writer);
        *self.inner.pending_reader.lock() = Some(reader);
        *self.inner.state.lock() = ConnectionState::Authenticating;

        // Registration sends bypass the failure gate: during a reconnect
        // the flag is still set until registration completes.
        if let Some(password) = &config.password {
            self.send_override(&Command::PASS(password.clone()).to_string())
                .await?;
        }
        self.send_override(&Command::NICK(config.nickname.clone()).to_string())
            .await?;
        let username = config.username.as_deref().unwrap_or(&config.nickname);
        let realname = config.realname.as_deref().unwrap_or(&config.nickname);
        self.send_override(
            &Command::USER(username.to_owned(), "0".to_owned(), realname.to_owned()).to_string(),
        )
        .await?;

        // Clear the failure gate before the hook runs so its sends go out
        // during a reconnect.
        self.inner.failed.store(false, Ordering::SeqCst);

        let hook = self.inner.registered_hook.lock().clone();
        if let Some(hook) = hook {
            if let Err(err) = hook.call(self.clone()).await {
                debug!(error = %err, "post-connect hook failed");
            }
        }

        *self.inner.state.lock() = ConnectionState::Active;
        info!(server = %config.server, port = config.port, "registered");
        Ok(())
    }

    /// Start the background listen loop and return its task handle.
    ///
    /// The loop reads frames, dispatches them, and on failure drives the
    /// reconnect sequence until [`Client::stop`] is called. Handlers are
    /// spawned without bound, one task per matched handler per line.
    pub fn listen(&self) -> JoinHandle<()> {
        self.inner.running.store(true, Ordering::SeqCst);
        let client = self.clone();
        tokio::spawn(async move { client.run_loop().await })
    }

    /// Send a raw protocol line.
    ///
    /// Lines over 510 bytes are rejected with
    /// [`ProtocolError::LineTooLong`] before anything is transmitted.
    /// While the failure flag is set the line is silently dropped; only
    /// the reconnect and quit sequences bypass that gate.
    pub async fn send(&self, line: &str) -> Result<(), ClientError> {
        self.send_inner(line, false).await
    }

    pub(crate) async fn send_override(&self, line: &str) -> Result<(), ClientError> {
        self.send_inner(line, true).await
    }

    async fn send_inner(&self, line: &str, override_failure: bool) -> Result<(), ClientError> {
        if line.len() > MAX_LINE_LEN {
            return Err(ProtocolError::LineTooLong {
                actual: line.len(),
                limit: MAX_LINE_LEN,
            }
            .into());
        }

        if self.inner.failed.load(Ordering::SeqCst) && !override_failure {
            debug!("connection down, dropping outbound line");
            return Ok(());
        }

        let mut guard = self.inner.writer.lock().await;
        match guard.as_mut() {
            Some(writer) => Ok(writer.send_line(line).await?),
            None => Err(ClientError::NotConnected),
        }
    }

    /// Join a channel and record the membership intent.
    ///
    /// Joining a channel the client is already a member of sends the JOIN
    /// again but never duplicates the membership entry.
    pub async fn join(&self, channel: &str) -> Result<(), ClientError> {
        self.inner.channels.insert(channel);
        self.send(&Command::JOIN(channel.to_owned(), None).to_string())
            .await
    }

    /// Part a channel. Parting a channel the client is not a member of is
    /// not an error and leaves the membership set unchanged.
    pub async fn part(&self, channel: &str) -> Result<(), ClientError> {
        self.inner.channels.remove(channel);
        self.send(&Command::PART(channel.to_owned(), None).to_string())
            .await
    }

    /// Query a channel topic, blocking until the server replies.
    ///
    /// There is no timeout: if the server never answers, this waits
    /// forever. Callers that need a bound wrap it in
    /// `tokio::time::timeout`.
    pub async fn topic(&self, channel: &str) -> Result<String, ClientError> {
        let baseline = self.inner.topics.ensure_pending(channel);
        self.send(&Command::TOPIC(channel.to_owned(), None).to_string())
            .await?;
        Ok(self.inner.topics.wait_for_update(channel, baseline).await)
    }

    /// Set a channel topic.
    pub async fn set_topic(&self, channel: &str, topic: &str) -> Result<(), ClientError> {
        self.send(&Command::TOPIC(channel.to_owned(), Some(topic.to_owned())).to_string())
            .await
    }

    /// Authenticate as an IRC operator.
    pub async fn oper(&self, name: &str, password: &str) -> Result<(), ClientError> {
        self.send(&Command::OPER(name.to_owned(), password.to_owned()).to_string())
            .await
    }

    /// Invite a user to a channel.
    pub async fn invite(&self, nickname: &str, channel: &str) -> Result<(), ClientError> {
        self.send(&Command::INVITE(nickname.to_owned(), channel.to_owned()).to_string())
            .await
    }

    /// Send a NOTICE to a target.
    pub async fn notice(&self, target: &str, text: &str) -> Result<(), ClientError> {
        self.send(&Command::NOTICE(target.to_owned(), text.to_owned()).to_string())
            .await
    }

    /// Send a PRIVMSG to a target.
    pub async fn privmsg(&self, target: &str, text: &str) -> Result<(), ClientError> {
        self.send(&Command::PRIVMSG(target.to_owned(), text.to_owned()).to_string())
            .await
    }

    /// Change modes on a channel or user target.
    pub async fn mode(&self, target: &str, modes: &str, args: &[&str]) -> Result<(), ClientError> {
        let args = args.iter().map(|s| (*s).to_owned()).collect();
        self.send(&Command::MODE(target.to_owned(), modes.to_owned(), args).to_string())
            .await
    }

    /// Kick a user from a channel.
    pub async fn kick(
        &self,
        channel: &str,
        user: &str,
        reason: Option<&str>,
    ) -> Result<(), ClientError> {
        let cmd = Command::KICK(
            channel.to_owned(),
            user.to_owned(),
            reason.map(|r| r.to_owned()),
        );
        self.send(&cmd.to_string()).await
    }

    /// Stop the client: send QUIT, shut down the listen loop, and close
    /// the transport. Terminal; no reconnection follows.
    pub async fn stop(&self) -> Result<(), ClientError> {
        self.inner.running.store(false, Ordering::SeqCst);
        let result = self.send_override(&Command::QUIT(None).to_string()).await;
        self.inner.shutdown.notify_waiters();
        *self.inner.state.lock() = ConnectionState::Disconnected;
        if let Some(mut writer) = self.inner.writer.lock().await.take() {
            let _ = writer.close().await;
        }
        result
    }

    /// The listen loop: frames in, dispatch, and on failure the reconnect
    /// sequence. Runs until stopped.
    async fn run_loop(self) {
        loop {
            let reader = self.inner.pending_reader.lock().take();
            let Some(mut reader) = reader else {
                warn!("listen() without an established connection; call connect() first");
                return;
            };

            self.read_frames(&mut reader).await;

            if !self.inner.running.load(Ordering::SeqCst) {
                *self.inner.state.lock() = ConnectionState::Disconnected;
                return;
            }

            // Failure path: flag the connection down and retry the connect
            // sequence forever, outside the line-processing path.
            self.inner.failed.store(true, Ordering::SeqCst);
            *self.inner.state.lock() = ConnectionState::Failed;
            *self.inner.state.lock() = ConnectionState::Reconnecting;
            info!("connection lost, reconnecting");

            loop {
                tokio::select! {
                    _ = self.inner.shutdown.notified() => return,
                    _ = tokio::time::sleep(self.inner.config.reconnect_delay) => {}
                }
                match self.connect().await {
                    Ok(()) => break,
                    Err(err) => debug!(error = %err, "reconnect attempt failed"),
                }
            }

            // Rejoin every channel in the membership set without touching
            // the set itself.
            for channel in self.inner.channels.snapshot() {
                let join = Command::JOIN(channel.clone(), None).to_string();
                if let Err(err) = self.send(&join).await {
                    warn!(channel = %channel, error = %err, "rejoin failed");
                }
            }
        }
    }

    /// Drive one session's frames until shutdown, EOF, or a failure
    /// signal. Malformed lines are logged distinctly from transport
    /// errors, but both feed the same failure path.
    async fn read_frames(&self, reader: &mut TransportReader) {
        loop {
            let frame = tokio::select! {
                _ = self.inner.shutdown.notified() => return,
                frame = reader.next_message() => frame,
            };

            match frame {
                Ok(Some(message)) => dispatch::dispatch(self, message).await,
                Ok(None) => {
                    debug!("connection closed by peer");
                    return;
                }
                Err(err) if err.is_malformed_line() => {
                    warn!(error = %err, "malformed line, treating as connection failure");
                    return;
                }
                Err(err) => {
                    warn!(error = %err, "transport read failed");
                    return;
                }
            }
        }
    }
}
