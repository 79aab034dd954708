//! Connections vended by a provider, along with the server that made them.

use crate::backend::{Connection, Session};
use crate::server::{AsServer, Server};

use debug_ignore::DebugIgnore;
use derive_where::derive_where;
use std::sync::Arc;

/// A raw [Connection], tagged with the [Server] it was made to.
///
/// Note that this type implements [std::ops::Deref] for the
/// generic `Conn` type, and generally, clients should transparently
/// use a handle as a connection.
///
/// The server reference stays valid after the connection is closed, so a
/// failure observed on a handle can always be reported through
/// [crate::provider::Provider::invalidate].
#[derive_where(Debug)]
pub struct Handle<Conn: Connection> {
    conn: DebugIgnore<Conn>,
    meta: Arc<Server>,
}

impl<Conn: Connection> Handle<Conn> {
    pub(crate) fn new(conn: Conn, meta: Arc<Server>) -> Self {
        Self {
            conn: DebugIgnore(conn),
            meta,
        }
    }

    /// The raw connection.
    pub fn connection(&self) -> &Conn {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Conn {
        &mut self.conn
    }

    /// Releases the raw connection, dropping the server reference.
    pub fn into_inner(self) -> Conn {
        self.conn.0
    }

    /// The server this connection was made to.
    pub fn meta(&self) -> &Arc<Server> {
        &self.meta
    }

    /// Runs a unit of work against this handle, returning its result.
    ///
    /// The handle itself applies no retry logic; the work may inspect
    /// [Self::meta] to report failures and decide how to proceed.
    pub fn execute<F, R>(&mut self, work: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        work(self)
    }
}

impl<Conn: Session> Handle<Conn> {
    pub fn connected(&self) -> bool {
        self.conn.connected()
    }

    pub fn cursor(&mut self) -> Result<Conn::Cursor, Conn::Error> {
        self.conn.cursor()
    }

    pub fn commit(&mut self) -> Result<(), Conn::Error> {
        self.conn.commit()
    }

    pub fn rollback(&mut self) -> Result<(), Conn::Error> {
        self.conn.rollback()
    }
}

impl<Conn: Connection> AsServer for Handle<Conn> {
    fn as_server(&self) -> &Server {
        &self.meta
    }
}

impl<Conn> std::ops::Deref for Handle<Conn>
where
    Conn: Send + 'static,
{
    type Target = Conn;
    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<Conn> std::ops::DerefMut for Handle<Conn>
where
    Conn: Send + 'static,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}
