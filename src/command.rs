//! IRC command types, parsing, and serialization.
//!
//! This module provides a type-safe representation of the commands this
//! client speaks. Numeric replies are captured in [`Command::Response`];
//! any verb the client has no typed variant for is captured in
//! [`Command::Raw`] so generic command-verb dispatch still sees it.

use std::borrow::Cow;
use std::fmt::{self, Write};

/// Numeric reply carrying a channel topic (RPL_TOPIC).
pub const RPL_TOPIC: u16 = 332;

/// IRC command with its parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum Command {
    /// `PASS password`
    PASS(String),
    /// `NICK nickname`
    NICK(String),
    /// `USER username mode realname`
    USER(String, String, String),
    /// `OPER name password`
    OPER(String, String),
    /// `QUIT [message]`
    QUIT(Option<String>),
    /// `JOIN channel [key]`
    JOIN(String, Option<String>),
    /// `PART channel [message]`
    PART(String, Option<String>),
    /// `TOPIC channel [topic]`
    TOPIC(String, Option<String>),
    /// `INVITE nickname channel`
    INVITE(String, String),
    /// `KICK channel user [comment]`
    KICK(String, String, Option<String>),
    /// `PRIVMSG target text`
    PRIVMSG(String, String),
    /// `NOTICE target text`
    NOTICE(String, String),
    /// `MODE target modes [args...]`
    MODE(String, String, Vec<String>),
    /// `PING server [server2]`
    PING(String, Option<String>),
    /// `PONG server [server2]`
    PONG(String, Option<String>),
    /// Numeric server reply with its arguments.
    Response(u16, Vec<String>),
    /// Any verb without a typed variant, with its arguments.
    Raw(String, Vec<String>),
}

impl Command {
    /// Parse a command from its verb and arguments.
    ///
    /// Verbs are matched case-insensitively; a verb with an unexpected
    /// argument shape falls back to [`Command::Raw`] rather than failing,
    /// so unusual-but-parseable lines still reach dispatch.
    pub fn new(cmd: &str, args: Vec<&str>) -> Command {
        if cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit()) {
            // Cannot fail: exactly three ASCII digits.
            let code = cmd.parse().unwrap_or_default();
            return Command::Response(code, owned(args));
        }

        let cmd_upper = cmd.to_ascii_uppercase();
        match (cmd_upper.as_str(), args.len()) {
            ("PASS", 1) => Command::PASS(args[0].to_owned()),
            ("NICK", 1) => Command::NICK(args[0].to_owned()),
            ("USER", 4) => Command::USER(
                args[0].to_owned(),
                args[1].to_owned(),
                args[3].to_owned(),
            ),
            ("OPER", 2) => Command::OPER(args[0].to_owned(), args[1].to_owned()),
            ("QUIT", 0) => Command::QUIT(None),
            ("QUIT", 1) => Command::QUIT(Some(args[0].to_owned())),
            ("JOIN", 1) => Command::JOIN(args[0].to_owned(), None),
            ("JOIN", 2) => Command::JOIN(args[0].to_owned(), Some(args[1].to_owned())),
            ("PART", 1) => Command::PART(args[0].to_owned(), None),
            ("PART", 2) => Command::PART(args[0].to_owned(), Some(args[1].to_owned())),
            ("TOPIC", 1) => Command::TOPIC(args[0].to_owned(), None),
            ("TOPIC", 2) => Command::TOPIC(args[0].to_owned(), Some(args[1].to_owned())),
            ("INVITE", 2) => Command::INVITE(args[0].to_owned(), args[1].to_owned()),
            ("KICK", 2) => Command::KICK(args[0].to_owned(), args[1].to_owned(), None),
            ("KICK", 3) => Command::KICK(
                args[0].to_owned(),
                args[1].to_owned(),
                Some(args[2].to_owned()),
            ),
            ("PRIVMSG", 2) => Command::PRIVMSG(args[0].to_owned(), args[1].to_owned()),
            ("NOTICE", 2) => Command::NOTICE(args[0].to_owned(), args[1].to_owned()),
            ("MODE", n) if n >= 2 => Command::MODE(
                args[0].to_owned(),
                args[1].to_owned(),
                owned(args[2..].to_vec()),
            ),
            ("PING", 1) => Command::PING(args[0].to_owned(), None),
            ("PING", 2) => Command::PING(args[0].to_owned(), Some(args[1].to_owned())),
            ("PONG", 1) => Command::PONG(args[0].to_owned(), None),
            ("PONG", 2) => Command::PONG(args[0].to_owned(), Some(args[1].to_owned())),
            _ => Command::Raw(cmd.to_owned(), owned(args)),
        }
    }

    /// The dispatch key for this command: the canonical verb for typed
    /// variants, the zero-padded code for numerics, the verb as received
    /// for raw commands.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Command::PASS(_) => Cow::Borrowed("PASS"),
            Command::NICK(_) => Cow::Borrowed("NICK"),
            Command::USER(..) => Cow::Borrowed("USER"),
            Command::OPER(..) => Cow::Borrowed("OPER"),
            Command::QUIT(_) => Cow::Borrowed("QUIT"),
            Command::JOIN(..) => Cow::Borrowed("JOIN"),
            Command::PART(..) => Cow::Borrowed("PART"),
            Command::TOPIC(..) => Cow::Borrowed("TOPIC"),
            Command::INVITE(..) => Cow::Borrowed("INVITE"),
            Command::KICK(..) => Cow::Borrowed("KICK"),
            Command::PRIVMSG(..) => Cow::Borrowed("PRIVMSG"),
            Command::NOTICE(..) => Cow::Borrowed("NOTICE"),
            Command::MODE(..) => Cow::Borrowed("MODE"),
            Command::PING(..) => Cow::Borrowed("PING"),
            Command::PONG(..) => Cow::Borrowed("PONG"),
            Command::Response(code, _) => Cow::Owned(format!("{:03}", code)),
            Command::Raw(verb, _) => Cow::Borrowed(verb),
        }
    }
}

fn owned(args: Vec<&str>) -> Vec<String> {
    args.into_iter().map(|s| s.to_owned()).collect()
}

/// Check if a string needs colon-prefixing as a trailing IRC argument.
fn needs_colon_prefix(s: &str) -> bool {
    s.is_empty() || s.contains(' ') || s.starts_with(':')
}

/// Write a command whose trailing argument is colon-prefixed only when needed.
fn write_cmd(f: &mut fmt::Formatter<'_>, cmd: &str, args: &[&str]) -> fmt::Result {
    f.write_str(cmd)?;
    if let Some((trailing, middle)) = args.split_last() {
        for param in middle {
            f.write_char(' ')?;
            f.write_str(param)?;
        }
        f.write_char(' ')?;
        if needs_colon_prefix(trailing) {
            f.write_char(':')?;
        }
        f.write_str(trailing)?;
    }
    Ok(())
}

/// Write a command with a freeform (always colon-prefixed) trailing argument.
fn write_cmd_freeform(f: &mut fmt::Formatter<'_>, cmd: &str, args: &[&str]) -> fmt::Result {
    f.write_str(cmd)?;
    if let Some((suffix, middle)) = args.split_last() {
        for param in middle {
            f.write_char(' ')?;
            f.write_str(param)?;
        }
        f.write_str(" :")?;
        f.write_str(suffix)?;
    }
    Ok(())
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PASS(p) => write_cmd(f, "PASS", &[p]),
            Command::NICK(n) => write_cmd(f, "NICK", &[n]),
            Command::USER(u, m, r) => write_cmd_freeform(f, "USER", &[u, m, "*", r]),
            Command::OPER(u, p) => write_cmd(f, "OPER", &[u, p]),
            Command::QUIT(Some(m)) => write_cmd_freeform(f, "QUIT", &[m]),
            Command::QUIT(None) => write_cmd(f, "QUIT", &[]),
            Command::JOIN(c, Some(k)) => write_cmd(f, "JOIN", &[c, k]),
            Command::JOIN(c, None) => write_cmd(f, "JOIN", &[c]),
            Command::PART(c, Some(m)) => write_cmd_freeform(f, "PART", &[c, m]),
            Command::PART(c, None) => write_cmd(f, "PART", &[c]),
            Command::TOPIC(c, Some(t)) => write_cmd_freeform(f, "TOPIC", &[c, t]),
            Command::TOPIC(c, None) => write_cmd(f, "TOPIC", &[c]),
            Command::INVITE(n, c) => write_cmd(f, "INVITE", &[n, c]),
            Command::KICK(c, n, Some(r)) => write_cmd_freeform(f, "KICK", &[c, n, r]),
            Command::KICK(c, n, None) => write_cmd(f, "KICK", &[c, n]),
            Command::PRIVMSG(t, m) => write_cmd_freeform(f, "PRIVMSG", &[t, m]),
            Command::NOTICE(t, m) => write_cmd_freeform(f, "NOTICE", &[t, m]),
            Command::MODE(t, modes, args) => {
                let mut all: Vec<&str> = vec![t, modes];
                all.extend(args.iter().map(|s| s.as_str()));
                write_cmd(f, "MODE", &all)
            }
            Command::PING(s, Some(s2)) => write_cmd_freeform(f, "PING", &[s, s2]),
            Command::PING(s, None) => write_cmd_freeform(f, "PING", &[s]),
            Command::PONG(s, Some(s2)) => write_cmd_freeform(f, "PONG", &[s, s2]),
            Command::PONG(s, None) => write_cmd_freeform(f, "PONG", &[s]),
            Command::Response(code, args) => {
                let args: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
                write_cmd(f, &format!("{:03}", code), &args)
            }
            Command::Raw(verb, args) => {
                let args: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
                write_cmd(f, verb, &args)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_privmsg() {
        let cmd = Command::new("PRIVMSG", vec!["#chan", "hello world"]);
        assert_eq!(
            cmd,
            Command::PRIVMSG("#chan".into(), "hello world".into())
        );
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let cmd = Command::new("privmsg", vec!["#chan", "hi"]);
        assert_eq!(cmd.name(), "PRIVMSG");
    }

    #[test]
    fn test_parse_numeric() {
        let cmd = Command::new("332", vec!["me", "#chan", "the topic"]);
        match cmd {
            Command::Response(code, args) => {
                assert_eq!(code, RPL_TOPIC);
                assert_eq!(args, vec!["me", "#chan", "the topic"]);
            }
            other => panic!("expected Response, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_verb_is_raw() {
        let cmd = Command::new("WALLOPS", vec!["everyone"]);
        assert_eq!(cmd, Command::Raw("WALLOPS".into(), vec!["everyone".into()]));
        assert_eq!(cmd.name(), "WALLOPS");
    }

    #[test]
    fn test_parse_wrong_arity_is_raw() {
        let cmd = Command::new("PRIVMSG", vec!["#chan"]);
        assert!(matches!(cmd, Command::Raw(_, _)));
    }

    #[test]
    fn test_serialize_registration() {
        assert_eq!(Command::PASS("hunter2".into()).to_string(), "PASS hunter2");
        assert_eq!(Command::NICK("bot".into()).to_string(), "NICK bot");
        assert_eq!(
            Command::USER("bot".into(), "0".into(), "A Bot".into()).to_string(),
            "USER bot 0 * :A Bot"
        );
    }

    #[test]
    fn test_serialize_pong_always_colons_token() {
        assert_eq!(
            Command::PONG("server123".into(), None).to_string(),
            "PONG :server123"
        );
    }

    #[test]
    fn test_serialize_join_part() {
        assert_eq!(Command::JOIN("#x".into(), None).to_string(), "JOIN #x");
        assert_eq!(Command::PART("#x".into(), None).to_string(), "PART #x");
    }

    #[test]
    fn test_serialize_topic() {
        assert_eq!(Command::TOPIC("#x".into(), None).to_string(), "TOPIC #x");
        assert_eq!(
            Command::TOPIC("#x".into(), Some("new topic".into())).to_string(),
            "TOPIC #x :new topic"
        );
    }

    #[test]
    fn test_serialize_mode_and_kick() {
        assert_eq!(
            Command::MODE("#x".into(), "+o".into(), vec!["nick".into()]).to_string(),
            "MODE #x +o nick"
        );
        assert_eq!(
            Command::KICK("#x".into(), "nick".into(), Some("be nice".into())).to_string(),
            "KICK #x nick :be nice"
        );
    }

    #[test]
    fn test_numeric_dispatch_key_is_zero_padded() {
        let cmd = Command::Response(1, vec![]);
        assert_eq!(cmd.name(), "001");
    }
}
