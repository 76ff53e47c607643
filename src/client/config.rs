//! Client configuration

/// Configuration for relay clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address, `host:port`
    pub addr: String,

    /// Token presented at connect time for publishing
    pub auth_token: Option<String>,
}

impl ClientConfig {
    /// Create a new config for the given server address
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            auth_token: None,
        }
    }

    /// Present this token at connect time
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}
