//! Transport options applied when the server is built.
//!
//! # Example
//!
//! ```rust
//! use beacon_server::ServerOptions;
//! use std::time::Duration;
//!
//! let options = ServerOptions::builder()
//!     .request_timeout(Duration::from_secs(5))
//!     .concurrency_limit_per_connection(64)
//!     .build();
//!
//! assert_eq!(options.request_timeout(), Some(Duration::from_secs(5)));
//! assert!(options.credential().is_none());
//! ```

use std::time::Duration;

use tonic::transport::Server;

use crate::error::ServerResult;
use crate::tls::ServerCredential;

/// Options for the gRPC transport.
///
/// Built with [`ServerOptions::builder()`]. The default is plaintext with no
/// limits.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    credential: Option<ServerCredential>,
    request_timeout: Option<Duration>,
    concurrency_limit_per_connection: Option<usize>,
    http2_keepalive_interval: Option<Duration>,
}

impl ServerOptions {
    /// Creates a new options builder.
    #[must_use]
    pub fn builder() -> ServerOptionsBuilder {
        ServerOptionsBuilder::default()
    }

    /// TLS identity, if the listener serves TLS.
    #[must_use]
    pub fn credential(&self) -> Option<&ServerCredential> {
        self.credential.as_ref()
    }

    /// Per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Maximum concurrent requests on one connection.
    #[must_use]
    pub fn concurrency_limit_per_connection(&self) -> Option<usize> {
        self.concurrency_limit_per_connection
    }

    /// Interval of HTTP/2 keepalive pings.
    #[must_use]
    pub fn http2_keepalive_interval(&self) -> Option<Duration> {
        self.http2_keepalive_interval
    }

    /// Builds a transport server carrying these options.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Transport` if the TLS identity is rejected.
    pub(crate) fn server(&self) -> ServerResult<Server> {
        let mut server = Server::builder();

        if let Some(credential) = &self.credential {
            server = server.tls_config(credential.tls_config())?;
        }
        if let Some(timeout) = self.request_timeout {
            server = server.timeout(timeout);
        }
        if let Some(limit) = self.concurrency_limit_per_connection {
            server = server.concurrency_limit_per_connection(limit);
        }

        Ok(server.http2_keepalive_interval(self.http2_keepalive_interval))
    }
}

/// Builder for [`ServerOptions`].
#[derive(Debug, Clone, Default)]
pub struct ServerOptionsBuilder {
    options: ServerOptions,
}

impl ServerOptionsBuilder {
    /// Serves TLS with `credential`. `None` keeps plaintext.
    #[must_use]
    pub fn credential(mut self, credential: Option<ServerCredential>) -> Self {
        self.options.credential = credential;
        self
    }

    /// Fails requests that run longer than `timeout`.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = Some(timeout);
        self
    }

    /// Caps concurrent requests per connection.
    #[must_use]
    pub fn concurrency_limit_per_connection(mut self, limit: usize) -> Self {
        self.options.concurrency_limit_per_connection = Some(limit);
        self
    }

    /// Sends HTTP/2 keepalive pings every `interval`.
    #[must_use]
    pub fn http2_keepalive_interval(mut self, interval: Duration) -> Self {
        self.options.http2_keepalive_interval = Some(interval);
        self
    }

    /// Builds the options.
    #[must_use]
    pub fn build(self) -> ServerOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ServerOptions::default();
        assert!(options.credential().is_none());
        assert!(options.request_timeout().is_none());
        assert!(options.concurrency_limit_per_connection().is_none());
        assert!(options.http2_keepalive_interval().is_none());
    }

    #[test]
    fn test_builder_chaining() {
        let options = ServerOptions::builder()
            .request_timeout(Duration::from_secs(3))
            .concurrency_limit_per_connection(32)
            .http2_keepalive_interval(Duration::from_secs(20))
            .credential(None)
            .build();

        assert_eq!(options.request_timeout(), Some(Duration::from_secs(3)));
        assert_eq!(options.concurrency_limit_per_connection(), Some(32));
        assert_eq!(
            options.http2_keepalive_interval(),
            Some(Duration::from_secs(20))
        );
    }

    #[test]
    fn test_plaintext_server_builds() {
        let options = ServerOptions::builder()
            .request_timeout(Duration::from_secs(1))
            .build();
        assert!(options.server().is_ok());
    }
}
