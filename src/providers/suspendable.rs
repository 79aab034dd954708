//! Implementation of [Provider] which suspends the calling task while
//! connecting.

use crate::backend::{Connection, SharedConnector};
use crate::handle::Handle;
use crate::pool::{Error, ServerPool};
use crate::provider::Provider;

use tracing::instrument;

/// Hands out connections made by a [crate::backend::Connector].
///
/// While a connection attempt is outstanding, the calling task yields to
/// others. Within one call, servers are still tried strictly one after
/// another: the next server is contacted only once the previous attempt
/// has failed.
///
/// Dropping the future returned by [Self::connect] abandons the attempt in
/// flight without penalizing the server.
pub struct SuspendableProvider<Conn: Connection> {
    pool: ServerPool,
    connector: SharedConnector<Conn>,
}

impl<Conn: Connection> SuspendableProvider<Conn> {
    pub fn new(pool: ServerPool, connector: SharedConnector<Conn>) -> Self {
        Self { pool, connector }
    }

    /// Connects to the next available server.
    ///
    /// See [crate::providers::blocking::BlockingProvider::connect]; only
    /// the way the connection attempt waits differs.
    #[instrument(skip(self), fields(pool = self.pool.name()), name = "SuspendableProvider::connect")]
    pub async fn connect(&self) -> Result<Handle<Conn>, Error> {
        for (idx, server) in self.pool.pass() {
            self.pool.connect_started(server);
            match self.connector.connect(server.params()).await {
                Ok(conn) => return Ok(self.pool.connect_done(idx, server, conn)),
                Err(err) => self.pool.connect_failed(server, &err),
            }
        }
        Err(self.pool.no_online_servers())
    }
}

impl<Conn: Connection> Provider for SuspendableProvider<Conn> {
    type Connection = Conn;

    fn pool(&self) -> &ServerPool {
        &self.pool
    }
}
