//! upstream picks which database server a client should connect to.
//!
//! A cluster is served by several interchangeable servers. upstream keeps
//! them in a shuffled rotation, connects to the first one which is not
//! currently penalized, and penalizes servers which fail: either while
//! connecting, or later, when a caller reports a failure on a connection.
//!
//! It uses the following terminology:
//! * A server is one instance of the database, described by its
//!   connection parameters ([backend::Params]).
//! * A penalty excludes a server from selection for a while
//!   ([policy::Policy::penalty]) after it failed.
//! * A selection pass is one scan over the rotation, starting where the
//!   previous successful pass left off.
//!
//! # Usage
//!
//! * Build a [pool::ServerPool] from a list of [server::ServerSpec]s and
//!   the parameters they share.
//! * Turn it into a provider: [providers::blocking::BlockingProvider]
//!   connects on the calling thread, through a [backend::BlockingConnector];
//!   [providers::suspendable::SuspendableProvider] suspends the calling task
//!   instead, through a [backend::Connector].
//! * Each successful `connect` returns a [handle::Handle], which derefs to
//!   the raw connection and remembers which server it came from. Pass it to
//!   [provider::Provider::invalidate] if the connection fails.
//!
//! # DTrace probes
//!
//! upstream contains a number of DTrace USDT probes, which fire as servers
//! are selected and penalized. The full list of probes is:
//!
//! - `connect-start`: Fires before attempting a connection to a server.
//! - `connect-done`: Fires after successfully connecting to a server.
//! - `connect-failed`: Fires after failing to connect to a server.
//! - `server-skipped`: Fires when a selection pass skips a penalized server.
//! - `server-invalidated`: Fires when a server is penalized.
//! - `select-failed`: Fires when a selection pass finds no online server.
//!
//! The existence of the probes is behind the `"probes"` feature, which is
//! enabled by default. Probes are zero-cost unless they are explicitly enabled,
//! by tracing the program with the `dtrace(1)` command-line tool.
//!
//! On most systems, the USDT probes must be registered with the DTrace kernel
//! module, by calling [register_probes] once. That process is fallible, and
//! kept apart from pool construction, so that an application may decide
//! whether an uninstrumented pool is acceptable.

// Public API
pub mod backend;
pub mod handle;
pub mod policy;
pub mod pool;
pub mod provider;
pub mod reporter;
pub mod server;

#[cfg(test)]
mod test_utils;

// Default implementations of generic interfaces
pub mod connectors;
pub mod providers;

/// Returned when the USDT probes could not be registered.
#[cfg(feature = "probes")]
#[derive(thiserror::Error, Debug)]
#[error("USDT probe registration failed")]
pub struct RegistrationError;

/// Registers the USDT probes of this crate.
#[cfg(feature = "probes")]
pub fn register_probes() -> Result<(), RegistrationError> {
    usdt::register_probes().map_err(|_| RegistrationError)
}

/// USDT probes for tracing how upstream selects and penalizes servers.
#[cfg(feature = "probes")]
#[usdt::provider(provider = "upstream")]
mod probes {
    /// Fires right before attempting to make a connection, with the name
    /// of the server we're connecting to.
    fn connect__start(pool: &str, server: &str) {}

    /// Fires just after successfully making a connection.
    fn connect__done(pool: &str, server: &str) {}

    /// Fires just after failing to make a connection, with a string
    /// identifying the reason.
    fn connect__failed(pool: &str, server: &str, reason: &str) {}

    /// Fires when a selection pass skips a server which is penalized.
    fn server__skipped(pool: &str, server: &str) {}

    /// Fires when a server is penalized, either after a failed connection
    /// or at the request of a caller.
    fn server__invalidated(pool: &str, server: &str) {}

    /// Fires when a selection pass ends without any connection.
    fn select__failed(pool: &str) {}
}
