//! # slirc-client
//!
//! A lightweight async IRC client library: connect, register, join
//! channels, and route incoming traffic to your handlers.
//!
//! ## Features
//!
//! - Plain TCP or TLS transports with automatic reconnection and rejoin
//! - Trigger-word dispatch for bot commands (`!ping` style)
//! - Command-verb dispatch for raw protocol handling
//! - Built-in PING/PONG and topic tracking
//! - Handlers run as isolated tasks; a failing handler never takes the
//!   connection down

#![deny(clippy::all)]
#![warn(missing_docs)]

//! ## Quick Start
//!
//! ```no_run
//! use slirc_client::{Client, Config};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(Config {
//!     nickname: "mybot".to_owned(),
//!     server: "irc.libera.chat".to_owned(),
//!     port: 6697,
//!     use_tls: true,
//!     ..Config::default()
//! });
//!
//! client.on_trigger("!hello", |client, msg| async move {
//!     if let Some(target) = msg.response_target() {
//!         client.privmsg(target, "hi!").await?;
//!     }
//!     Ok(())
//! });
//!
//! client.on_registered(|client| async move {
//!     client.join("#mychannel").await?;
//!     Ok(())
//! });
//!
//! client.connect().await?;
//! client.listen().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod command;
pub mod error;
pub mod irc;
pub mod line;
pub mod message;
pub mod prefix;
pub mod transport;

pub use self::client::{Client, Config, ConnectionState, HandlerError};
pub use self::command::{Command, RPL_TOPIC};
pub use self::error::{ClientError, MessageParseError, ProtocolError};
pub use self::irc::IrcCodec;
pub use self::line::{LineCodec, MAX_LINE_LEN};
pub use self::message::Message;
pub use self::prefix::Prefix;
pub use self::transport::{TransportReader, TransportWriter};
