//! Reporting of server failures.

use std::fmt::Display;
use std::sync::Arc;
use tracing::{event, Level};

/// Receives a notification each time a server is invalidated.
///
/// Reporting must not fail; implementations swallow their own errors.
pub trait Reporter: Send + Sync {
    fn report(&self, pool: &str, server: &str, cause: &dyn Display);
}

pub type SharedReporter = Arc<dyn Reporter>;

/// A [Reporter] which emits an `ERROR` event through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, pool: &str, server: &str, cause: &dyn Display) {
        event!(
            Level::ERROR,
            pool = pool,
            server = server,
            "Connection to server {server} closed: {cause}."
        );
    }
}
