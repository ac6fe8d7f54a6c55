//! Minimal echo bot built on slirc-client.
//!
//! Connects to a server, joins a channel, and answers `!echo <text>` and
//! `!uptime` in-channel. Run with:
//!
//! ```sh
//! cargo run --example echo_bot -- irc.libera.chat 6667 "#slirc-test"
//! ```

use std::time::Instant;

use slirc_client::{Client, Command, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,slirc_client=debug".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let server = args.next().unwrap_or_else(|| "irc.libera.chat".to_owned());
    let port = args.next().and_then(|p| p.parse().ok()).unwrap_or(6667);
    let channel = args.next().unwrap_or_else(|| "#slirc-test".to_owned());

    let client = Client::new(Config {
        nickname: "slircbot".to_owned(),
        server,
        port,
        debug: true,
        ..Config::default()
    });

    let started = Instant::now();

    client.on_trigger("!echo", |client, msg| async move {
        if let (Some(target), Command::PRIVMSG(_, text)) =
            (msg.response_target(), &msg.command)
        {
            let rest = text.strip_prefix("!echo").unwrap_or("").trim();
            if !rest.is_empty() {
                client.privmsg(target, rest).await?;
            }
        }
        Ok(())
    });

    client.on_trigger("!uptime", move |client, msg| async move {
        if let Some(target) = msg.response_target() {
            let uptime = started.elapsed().as_secs();
            client
                .privmsg(target, &format!("up for {uptime}s"))
                .await?;
        }
        Ok(())
    });

    // Rejoins happen automatically after reconnects; the hook only handles
    // the initial join.
    let chan = channel.clone();
    client.on_registered(move |client| {
        let chan = chan.clone();
        async move {
            client.join(&chan).await?;
            Ok(())
        }
    });

    client.connect().await?;
    client.listen().await?;
    Ok(())
}
