//! Implementation of [Provider] which connects on the calling thread.

use crate::backend::{Connection, SharedBlockingConnector};
use crate::handle::Handle;
use crate::pool::{Error, ServerPool};
use crate::provider::Provider;

use tracing::instrument;

/// Hands out connections made by a [crate::backend::BlockingConnector].
///
/// Each call to [Self::connect] runs entirely on the calling thread.
pub struct BlockingProvider<Conn: Connection> {
    pool: ServerPool,
    connector: SharedBlockingConnector<Conn>,
}

impl<Conn: Connection> BlockingProvider<Conn> {
    pub fn new(pool: ServerPool, connector: SharedBlockingConnector<Conn>) -> Self {
        Self { pool, connector }
    }

    /// Connects to the next available server.
    ///
    /// Servers are tried one at a time, in rotation order, skipping any
    /// which are penalized. Servers which fail to connect are invalidated.
    /// Returns [Error::NoOnlineServers] if no server could be reached;
    /// retrying later is left to the caller.
    #[instrument(skip(self), fields(pool = self.pool.name()), name = "BlockingProvider::connect")]
    pub fn connect(&self) -> Result<Handle<Conn>, Error> {
        for (idx, server) in self.pool.pass() {
            self.pool.connect_started(server);
            match self.connector.connect(server.params()) {
                Ok(conn) => return Ok(self.pool.connect_done(idx, server, conn)),
                Err(err) => self.pool.connect_failed(server, &err),
            }
        }
        Err(self.pool.no_online_servers())
    }
}

impl<Conn: Connection> Provider for BlockingProvider<Conn> {
    type Connection = Conn;

    fn pool(&self) -> &ServerPool {
        &self.pool
    }
}
