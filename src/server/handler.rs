//! Relay event handler
//!
//! Applications hook into the server by implementing `RelayHandler`. All
//! callbacks have accepting defaults, so a handler only overrides what it
//! cares about. The publish gate itself (token comparison) is enforced by
//! the connection from `ServerConfig::auth_token`; `on_publish` and
//! `on_subscribe` are an additional application-level veto.

use std::future::Future;

use crate::session::SessionContext;

/// Decision returned by authorization callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    /// Allow the request
    Accept,
    /// Refuse the request with a reason sent to the client
    Reject(String),
}

/// Callbacks invoked by the server at connection and request boundaries
pub trait RelayHandler: Send + Sync + 'static {
    /// A new connection was accepted. Return false to drop it immediately.
    fn on_connection(&self, _ctx: &SessionContext) -> impl Future<Output = bool> + Send {
        async { true }
    }

    /// A publish request passed the token gate and argument validation.
    fn on_publish(
        &self,
        _ctx: &SessionContext,
        _channel: &str,
        _text: &str,
    ) -> impl Future<Output = AuthResult> + Send {
        async { AuthResult::Accept }
    }

    /// A subscribe request is about to register a slot.
    fn on_subscribe(
        &self,
        _ctx: &SessionContext,
        _channel: &str,
    ) -> impl Future<Output = AuthResult> + Send {
        async { AuthResult::Accept }
    }

    /// The connection ended, cleanly or not.
    fn on_disconnect(&self, _ctx: &SessionContext) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Handler that accepts everything and observes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHandler;

impl RelayHandler for DefaultHandler {}
