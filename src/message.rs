//! Parsed IRC messages.
//!
//! A [`Message`] is the unit handed to dispatch: an optional sender
//! [`Prefix`] plus a [`Command`] with its parameters. Parsing is pure
//! syntactic extraction; no command semantics are applied here.

use std::fmt;
use std::str::FromStr;

use crate::command::Command;
use crate::error::{MessageParseError, ProtocolError};
use crate::prefix::Prefix;

/// An owned, parsed IRC message.
///
/// # Example
///
/// ```
/// use slirc_client::Message;
///
/// let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
/// assert_eq!(msg.source_nickname(), Some("nick"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Message prefix/source (e.g., `nick!user@host`), if present.
    pub prefix: Option<Prefix>,
    /// The IRC command and its parameters.
    pub command: Command,
}

impl Message {
    /// Get the nickname from the message prefix, if present.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nick)
    }

    /// Get the appropriate target for a reply.
    ///
    /// For channel messages, returns the channel name.
    /// For private messages, returns the sender's nickname.
    pub fn response_target(&self) -> Option<&str> {
        match &self.command {
            Command::PRIVMSG(target, _) | Command::NOTICE(target, _)
                if target.starts_with(['#', '&', '+', '!']) =>
            {
                Some(target)
            }
            _ => self.source_nickname(),
        }
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Message {
        Message {
            prefix: None,
            command,
        }
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        parse_line(s).map_err(|cause| ProtocolError::InvalidMessage {
            string: s.to_owned(),
            cause,
        })
    }
}

fn parse_line(s: &str) -> Result<Message, MessageParseError> {
    let mut line = s.trim();
    if line.is_empty() {
        return Err(MessageParseError::EmptyMessage);
    }

    // IRCv3 tags can appear if a server volunteers them; this client never
    // negotiates capabilities, so the tag section is skipped, not modeled.
    if line.starts_with('@') {
        line = match line.split_once(' ') {
            Some((_, rest)) => rest.trim_start_matches(' '),
            None => return Err(MessageParseError::MissingCommand),
        };
    }

    let (prefix, rest) = if let Some(stripped) = line.strip_prefix(':') {
        match stripped.split_once(' ') {
            Some((pfx, rest)) => (Some(pfx), rest.trim_start_matches(' ')),
            None => return Err(MessageParseError::MissingCommand),
        }
    } else {
        (None, line)
    };

    let (verb, params) = match rest.split_once(' ') {
        Some((verb, params)) => (verb, params),
        None => (rest, ""),
    };
    if verb.is_empty() {
        return Err(MessageParseError::MissingCommand);
    }

    let mut args: Vec<&str> = Vec::new();
    let mut remainder = params;
    loop {
        remainder = remainder.trim_start_matches(' ');
        if remainder.is_empty() {
            break;
        }
        if let Some(trailing) = remainder.strip_prefix(':') {
            args.push(trailing);
            break;
        }
        match remainder.split_once(' ') {
            Some((token, rest)) => {
                args.push(token);
                remainder = rest;
            }
            None => {
                args.push(remainder);
                break;
            }
        }
    }

    let prefix = prefix.map(Prefix::try_from_str).transpose()?;

    Ok(Message {
        prefix,
        command: Command::new(verb, args),
    })
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        write!(f, "{}", self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_ping() {
        let msg: Message = "PING :server123\r\n".parse().unwrap();
        assert_eq!(msg.command, Command::PING("server123".into(), None));
        assert!(msg.prefix.is_none());
    }

    #[test]
    fn test_parse_privmsg_with_prefix() {
        let msg: Message = ":nick!user@host PRIVMSG #chan :!ping hello\r\n"
            .parse()
            .unwrap();
        assert_eq!(msg.source_nickname(), Some("nick"));
        assert_eq!(
            msg.command,
            Command::PRIVMSG("#chan".into(), "!ping hello".into())
        );
    }

    #[test]
    fn test_parse_verb_is_first_token_without_prefix() {
        let msg: Message = "TOPIC #chan :new topic".parse().unwrap();
        assert_eq!(
            msg.command,
            Command::TOPIC("#chan".into(), Some("new topic".into()))
        );
    }

    #[test]
    fn test_parse_tolerates_missing_trailing_colon() {
        let msg: Message = "PRIVMSG #chan hello".parse().unwrap();
        assert_eq!(msg.command, Command::PRIVMSG("#chan".into(), "hello".into()));
    }

    #[test]
    fn test_parse_numeric_topic_reply() {
        let msg: Message = ":server 332 me #chan :the topic".parse().unwrap();
        match msg.command {
            Command::Response(332, args) => {
                assert_eq!(args, vec!["me", "#chan", "the topic"]);
            }
            other => panic!("expected 332, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_line_fails() {
        let result: Result<Message, _> = "".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_prefix_without_verb_is_malformed() {
        let err = ":prefix-only".parse::<Message>().unwrap_err();
        assert!(err.is_malformed_line());
    }

    #[test]
    fn test_parse_skips_unsolicited_tags() {
        let msg: Message = "@time=2023-01-01T00:00:00Z :nick PRIVMSG #ch :Hi"
            .parse()
            .unwrap();
        assert_eq!(msg.command, Command::PRIVMSG("#ch".into(), "Hi".into()));
    }

    #[test]
    fn test_parse_collapses_repeated_spaces() {
        let msg: Message = "PRIVMSG  #chan  :hi".parse().unwrap();
        assert_eq!(msg.command, Command::PRIVMSG("#chan".into(), "hi".into()));
    }

    #[test]
    fn test_display_round_trip() {
        for raw in [
            ":nick!user@host PRIVMSG #chan :hello world",
            "PING :server123",
            "JOIN #x",
        ] {
            let msg: Message = raw.parse().unwrap();
            assert_eq!(msg.to_string(), raw);
        }
    }
}
