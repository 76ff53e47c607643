//! Line protocol commands and responses
//!
//! The relay speaks a newline-delimited text protocol. Clients send one
//! command per line; the server answers with `+OK ...`, `+PONG` or
//! `-ERR <reason>`. A subscribed connection additionally receives one line
//! per delivered message.
//!
//! ```text
//! AUTH <token>
//! PUBLISH <channel> <text...>
//! SUBSCRIBE <channel>
//! UNSUBSCRIBE
//! STATS
//! PING
//! QUIT
//! ```

use crate::error::ProtocolError;

/// A client request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Authorize this connection for publishing
    Auth { token: String },
    /// Publish text to a channel
    Publish { channel: String, text: String },
    /// Enter delivery mode for a channel
    Subscribe { channel: String },
    /// Leave delivery mode
    Unsubscribe,
    /// Request a registry stats line
    Stats,
    /// Liveness probe
    Ping,
    /// Close the connection
    Quit,
}

impl Command {
    /// Parse one request line. Verbs are case-insensitive; the publish text
    /// is opaque and keeps its inner whitespace.
    pub fn parse(line: &str) -> Result<Command, ProtocolError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::MissingArgument("command"));
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim_start()),
            None => (line, ""),
        };

        match verb.to_ascii_uppercase().as_str() {
            "AUTH" => {
                if rest.is_empty() {
                    return Err(ProtocolError::MissingArgument("token"));
                }
                Ok(Command::Auth {
                    token: rest.to_string(),
                })
            }
            "PUBLISH" => {
                let (channel, text) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(ProtocolError::MissingArgument("text"))?;
                if channel.is_empty() {
                    return Err(ProtocolError::MissingArgument("channel"));
                }
                let text = text.trim_start();
                if text.is_empty() {
                    return Err(ProtocolError::MissingArgument("text"));
                }
                Ok(Command::Publish {
                    channel: channel.to_string(),
                    text: text.to_string(),
                })
            }
            "SUBSCRIBE" => {
                if rest.is_empty() {
                    return Err(ProtocolError::MissingArgument("channel"));
                }
                Ok(Command::Subscribe {
                    channel: rest.to_string(),
                })
            }
            "UNSUBSCRIBE" => Ok(Command::Unsubscribe),
            "STATS" => Ok(Command::Stats),
            "PING" => Ok(Command::Ping),
            "QUIT" => Ok(Command::Quit),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Auth { token } => write!(f, "AUTH {}", token),
            Command::Publish { channel, text } => write!(f, "PUBLISH {} {}", channel, text),
            Command::Subscribe { channel } => write!(f, "SUBSCRIBE {}", channel),
            Command::Unsubscribe => write!(f, "UNSUBSCRIBE"),
            Command::Stats => write!(f, "STATS"),
            Command::Ping => write!(f, "PING"),
            Command::Quit => write!(f, "QUIT"),
        }
    }
}

/// A server response line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Request succeeded
    Ok(String),
    /// Reply to `PING`
    Pong,
    /// Request failed with the given reason
    Err(String),
}

impl Response {
    /// Parse one response line.
    pub fn parse(line: &str) -> Result<Response, ProtocolError> {
        let line = line.trim();

        if line == "+PONG" {
            return Ok(Response::Pong);
        }
        if let Some(rest) = line.strip_prefix("+OK") {
            return Ok(Response::Ok(rest.trim_start().to_string()));
        }
        if let Some(rest) = line.strip_prefix("-ERR") {
            return Ok(Response::Err(rest.trim_start().to_string()));
        }

        Err(ProtocolError::UnexpectedResponse(line.to_string()))
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Response::Ok(detail) if detail.is_empty() => write!(f, "+OK"),
            Response::Ok(detail) => write!(f, "+OK {}", detail),
            Response::Pong => write!(f, "+PONG"),
            Response::Err(reason) => write!(f, "-ERR {}", reason),
        }
    }
}
