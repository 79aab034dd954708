//! The interface for describing servers and connecting to them.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// The port assumed for display when a server only names its host.
pub const DEFAULT_PORT: u16 = 3306;

/// A failure reported by the underlying client while connecting.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O Error")]
    Io(#[from] std::io::Error),

    #[error("Invalid connection parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Other(anyhow::Error),
}

/// Connection parameters for a single server.
///
/// The pool treats these as opaque, apart from computing a display name;
/// their meaning belongs to the [Connector].
#[derive(Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Params {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub socket_name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub connect_timeout: Option<Duration>,

    /// Client-specific settings which have no dedicated field.
    pub options: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl ToString) -> Self {
        self.host = Some(host.to_string());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_socket_name(mut self, socket_name: impl ToString) -> Self {
        self.socket_name = Some(socket_name.to_string());
        self
    }

    pub fn with_user(mut self, user: impl ToString) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn with_password(mut self, password: impl ToString) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn with_database(mut self, database: impl ToString) -> Self {
        self.database = Some(database.to_string());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_option(mut self, key: impl ToString, value: impl ToString) -> Self {
        self.options.insert(key.to_string(), value.to_string());
        self
    }

    /// Returns a copy of these parameters with `host` and `port` replaced.
    ///
    /// Empty hosts and zero ports are treated as absent, and leave the
    /// original value in place.
    pub fn overridden(&self, host: Option<&str>, port: Option<u16>) -> Self {
        let mut params = self.clone();
        if let Some(host) = host.filter(|h| !h.is_empty()) {
            params.host = Some(host.to_string());
        }
        if let Some(port) = port.filter(|p| *p != 0) {
            params.port = Some(port);
        }
        params
    }

    /// The human-readable name of the server these parameters point at.
    ///
    /// This is `host:port` when a host is known, otherwise the socket name,
    /// otherwise `"default"`.
    pub fn display_name(&self) -> String {
        match (&self.host, &self.socket_name) {
            (Some(host), _) => format!("{host}:{}", self.port.unwrap_or(DEFAULT_PORT)),
            (None, Some(socket_name)) => socket_name.clone(),
            (None, None) => "default".to_string(),
        }
    }
}

impl std::fmt::Debug for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Params")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("socket_name", &self.socket_name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .field("options", &self.options)
            .finish()
    }
}

/// Interface for raw connections.
pub trait Connection: Send + 'static {}

impl<T> Connection for T where T: Send + 'static {}

/// Transactional operations of a raw database connection.
///
/// [crate::handle::Handle] passes these straight through to the
/// connection it wraps.
pub trait Session: Connection {
    type Cursor;
    type Error;

    /// Returns true while the connection believes it is still usable.
    fn connected(&self) -> bool;

    fn cursor(&mut self) -> Result<Self::Cursor, Self::Error>;

    fn commit(&mut self) -> Result<(), Self::Error>;

    fn rollback(&mut self) -> Result<(), Self::Error>;
}

/// Describes how a connection to a server should be made, by a client
/// which may suspend the calling task while connecting.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Connection;

    /// Creates a connection to a server.
    async fn connect(&self, params: &Params) -> Result<Self::Connection, Error>;
}

pub type SharedConnector<Conn> = Arc<dyn Connector<Connection = Conn>>;

/// Describes how a connection to a server should be made, by a client
/// which blocks the calling thread while connecting.
pub trait BlockingConnector: Send + Sync {
    type Connection: Connection;

    /// Creates a connection to a server.
    fn connect(&self, params: &Params) -> Result<Self::Connection, Error>;
}

pub type SharedBlockingConnector<Conn> = Arc<dyn BlockingConnector<Connection = Conn>>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_name_prefers_host_and_port() {
        let params = Params::new()
            .with_host("db1")
            .with_port(3307)
            .with_socket_name("/tmp/mysql.sock");
        assert_eq!(params.display_name(), "db1:3307");
    }

    #[test]
    fn display_name_uses_default_port() {
        let params = Params::new().with_host("db1");
        assert_eq!(params.display_name(), format!("db1:{DEFAULT_PORT}"));
    }

    #[test]
    fn display_name_falls_back_to_socket_then_default() {
        let params = Params::new().with_socket_name("/tmp/mysql.sock");
        assert_eq!(params.display_name(), "/tmp/mysql.sock");
        assert_eq!(Params::new().with_port(1234).display_name(), "default");
    }

    #[test]
    fn override_ignores_empty_host_and_zero_port() {
        let base = Params::new().with_host("base").with_port(1000).with_user("u");

        let same = base.overridden(Some(""), Some(0));
        assert_eq!(same, base);

        let other = base.overridden(Some("other"), None);
        assert_eq!(other.host.as_deref(), Some("other"));
        assert_eq!(other.port, Some(1000));
        assert_eq!(other.user.as_deref(), Some("u"));

        let other = base.overridden(None, Some(2000));
        assert_eq!(other.host.as_deref(), Some("base"));
        assert_eq!(other.port, Some(2000));
    }

    #[test]
    fn debug_hides_password() {
        let params = Params::new().with_user("root").with_password("hunter2");
        let debug = format!("{params:?}");
        assert!(!debug.contains("hunter2"), "{debug}");
        assert!(debug.contains("<redacted>"), "{debug}");
    }
}
