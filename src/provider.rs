//! The interface shared by providers, regardless of how they connect.

use crate::backend::Connection;
use crate::pool::{self, ServerPool};
use crate::server::AsServer;

/// Hands out connections to the servers of a [ServerPool].
///
/// Selection itself is an inherent method of each provider, since one
/// blocks the calling thread and the other suspends the calling task.
/// Both walk the pool the same way: a single pass from the cursor, skipping
/// penalized servers, stopping at the first successful connection.
pub trait Provider {
    type Connection: Connection;

    fn pool(&self) -> &ServerPool;

    /// The number of entries in the rotation, counting replicas.
    fn len(&self) -> usize {
        self.pool().len()
    }

    fn is_empty(&self) -> bool {
        self.pool().is_empty()
    }

    /// Penalizes the server behind `target`, and reports `cause` for it.
    ///
    /// `target` may be a [crate::handle::Handle] or a
    /// [crate::server::Server].
    fn invalidate<T>(&self, target: &T, cause: Option<&dyn std::error::Error>)
    where
        T: AsServer + ?Sized,
    {
        self.pool().invalidate(target.as_server(), cause)
    }

    /// Like [Self::invalidate], for values whose type is only known at
    /// runtime.
    ///
    /// Returns [pool::Error::InvalidArgument] if `target` is neither a
    /// handle from this provider nor a server.
    fn try_invalidate<T: std::any::Any>(
        &self,
        target: &T,
        cause: Option<&dyn std::error::Error>,
    ) -> Result<(), pool::Error> {
        let server = pool::server_of::<T, Self::Connection>(target)?;
        self.pool().invalidate(server, cause);
        Ok(())
    }
}
