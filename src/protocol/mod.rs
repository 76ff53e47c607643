//! Wire protocol
//!
//! Newline-delimited text framing shared by the server and the client.
//! Delivered messages are rendered by `Message::render_line` and are not a
//! `Response`; a subscribed connection simply receives raw lines.

pub mod command;

pub use command::{Command, Response};
